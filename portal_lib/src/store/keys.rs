// Copyright (C) 2024-2026 Pool Portal Developers (see AUTHORS)
//
// This file is part of Pool Portal
//
// Pool Portal is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free
// Software Foundation, either version 3 of the License, or (at your option)
// any later version.
//
// Pool Portal is distributed in the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// Pool Portal. If not, see <https://www.gnu.org/licenses/>.

//! Per coin key names shared with the stratum side.

pub fn blocks_pending(coin: &str) -> String {
    format!("{coin}_blocksPending")
}

pub fn round_shares(coin: &str, height: u64) -> String {
    format!("{coin}_shares:round{height}")
}

/// Tally of the round currently being mined, orphaned shares are merged here
pub fn current_round_shares(coin: &str) -> String {
    format!("{coin}_shares:roundCurrent")
}

pub fn balances(coin: &str) -> String {
    format!("{coin}_balances")
}

/// Sorted set of `<shareCount>:<worker>` samples scored by submission second
pub fn hashrate(coin: &str) -> String {
    format!("{coin}_hashrate")
}

pub fn pool_stats(coin: &str) -> String {
    format!("{coin}_stats")
}
