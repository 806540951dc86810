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

//! Accounting for the pool portal.
//!
//! Pure functions and value types, no IO happens in this crate. The portal
//! library feeds it share tallies and hashrate samples read from the store and
//! publishes what comes out.

pub mod calc;
pub mod hashrate;
pub mod rewards;
pub mod stats;

use std::collections::BTreeMap;

/// Worker identifier to accumulated share count, scoped to one round.
pub type ShareTally = BTreeMap<String, u64>;

/// Worker identifier to integer reward amount in base units.
pub type RewardSplit = BTreeMap<String, u64>;
