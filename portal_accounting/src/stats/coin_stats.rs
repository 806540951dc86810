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

use crate::hashrate::{Algorithm, WindowTotals, compute_hashrate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Statistics for one coin, computed from the hashrate samples in the window
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinStats {
    pub coin_name: String,
    /// Shares per worker inside the window
    pub workers: BTreeMap<String, u64>,
    /// Total shares inside the window
    pub shares: u64,
    /// Hashrate in kH/s
    pub hashrate: u64,
    /// Raw `<coin>_stats` hash, passed through untouched
    pub pool_stats: BTreeMap<String, String>,
    pub pool_pending_blocks: u64,
}

impl CoinStats {
    pub fn new(
        coin_name: &str,
        algorithm: Algorithm,
        window_secs: u64,
        totals: WindowTotals,
        pool_stats: BTreeMap<String, String>,
        pool_pending_blocks: u64,
    ) -> Self {
        let hashrate = compute_hashrate(algorithm, totals.total_shares, window_secs);
        CoinStats {
            coin_name: coin_name.to_string(),
            workers: totals.workers,
            shares: totals.total_shares,
            hashrate,
            pool_stats,
            pool_pending_blocks,
        }
    }

    /// Number of distinct workers seen in the window
    pub fn worker_count(&self) -> u64 {
        self.workers.len() as u64
    }
}
