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

//! Reward reconciliation and pool stats for a multi coin mining pool.
//!
//! [`portal::Portal`] is the entry point. It owns one store gateway per
//! endpoint and one daemon client per coin, and publishes the results of
//! `get_miner_stats` and `get_stats` as versioned snapshots.

pub mod config;
pub mod logging;
pub mod portal;
pub mod reconcile;
pub mod stats;
pub mod store;
#[cfg(test)]
pub(crate) mod test_utils;
pub mod utils;
