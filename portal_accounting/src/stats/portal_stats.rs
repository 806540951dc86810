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

use super::coin_stats::CoinStats;
use serde::{Deserialize, Serialize};

/// Totals across every coin in the snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalStats {
    /// Sum of per coin worker counts. A worker mining two coins counts twice.
    pub workers: u64,
    pub hashrate: u64,
}

/// Pool wide stats, the payload published every stats cycle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortalStats {
    pub global: GlobalStats,
    pub pools: Vec<CoinStats>,
}

impl PortalStats {
    /// Build the snapshot from per coin stats, pools are ordered by coin name
    pub fn from_pools(mut pools: Vec<CoinStats>) -> Self {
        pools.sort_by(|a, b| a.coin_name.cmp(&b.coin_name));
        let global = pools.iter().fold(GlobalStats::default(), |acc, pool| GlobalStats {
            workers: acc.workers.saturating_add(pool.worker_count()),
            hashrate: acc.hashrate.saturating_add(pool.hashrate),
        });
        PortalStats { global, pools }
    }
}
