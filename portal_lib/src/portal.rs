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

use crate::config::Config;
use crate::reconcile::{MinerStatsReport, reconcile_coin};
use crate::stats::{Snapshot, SnapshotPublisher, collect_group_stats};
use crate::store::{CoinGroup, StoreGateway};
use crate::utils::time_provider::TimeProvider;
use bitcoindrpc::{BitcoindRpcClient, BitcoindRpcError};
use futures::future::join_all;
use portal_accounting::calc::fee_to_ppm;
use portal_accounting::hashrate::Algorithm;
use portal_accounting::stats::PortalStats;
use std::collections::BTreeMap;
use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum PortalSetupError {
    #[error("Failed to create daemon client for {coin}: {source}")]
    Daemon {
        coin: String,
        source: BitcoindRpcError,
    },
    #[error("Store group {endpoint} serves {coin} which is not configured")]
    UnknownCoin { endpoint: String, coin: String },
}

/// Everything needed to reconcile one coin, built once at startup
#[derive(Debug, Clone)]
pub struct PortalCoin {
    pub name: String,
    pub algorithm: Algorithm,
    pub fee_ppm: u64,
    pub daemon: BitcoindRpcClient,
}

/// Entry point for both public operations.
///
/// Calls are expected to be serialized by the caller. Results are published
/// into watchable snapshots as well as returned.
pub struct Portal<S, T> {
    groups: Vec<CoinGroup<S>>,
    coins: BTreeMap<String, PortalCoin>,
    algorithms: BTreeMap<String, Algorithm>,
    hashrate_window: u64,
    time_provider: T,
    miner_stats: SnapshotPublisher<MinerStatsReport>,
    stats: SnapshotPublisher<PortalStats>,
}

impl<S: StoreGateway, T: TimeProvider> Portal<S, T> {
    pub fn new(
        config: &Config,
        groups: Vec<CoinGroup<S>>,
        time_provider: T,
    ) -> Result<Self, PortalSetupError> {
        let mut coins = BTreeMap::new();
        for (name, coin_config) in &config.coins {
            let daemon = BitcoindRpcClient::from_config(&coin_config.daemon).map_err(|source| {
                PortalSetupError::Daemon {
                    coin: name.clone(),
                    source,
                }
            })?;
            coins.insert(
                name.clone(),
                PortalCoin {
                    name: name.clone(),
                    algorithm: coin_config.algorithm,
                    fee_ppm: fee_to_ppm(coin_config.fee_percent),
                    daemon,
                },
            );
        }
        for group in &groups {
            if let Some(coin) = group.coins.iter().find(|coin| !coins.contains_key(*coin)) {
                return Err(PortalSetupError::UnknownCoin {
                    endpoint: group.endpoint.to_string(),
                    coin: coin.clone(),
                });
            }
        }
        let algorithms = coins
            .values()
            .map(|coin| (coin.name.clone(), coin.algorithm))
            .collect();
        info!(
            "Portal ready with {} coins across {} store groups",
            coins.len(),
            groups.len()
        );
        Ok(Portal {
            groups,
            coins,
            algorithms,
            hashrate_window: config.portal.hashrate_window,
            time_provider,
            miner_stats: SnapshotPublisher::new(),
            stats: SnapshotPublisher::new(),
        })
    }

    pub fn coins(&self) -> impl Iterator<Item = &PortalCoin> {
        self.coins.values()
    }

    /// Reconcile every coin of every group for `address` and publish the
    /// per coin outcomes. Coins run concurrently and fail independently.
    pub async fn get_miner_stats(&self, address: &str) -> Snapshot<MinerStatsReport> {
        let coins = &self.coins;
        let pipelines = self.groups.iter().flat_map(move |group| {
            group
                .coins
                .iter()
                .filter_map(move |name| coins.get(name))
                .map(move |coin| async move {
                    let outcome = reconcile_coin(
                        group.store.as_ref(),
                        &coin.daemon,
                        &coin.name,
                        coin.fee_ppm,
                        address,
                    )
                    .await;
                    (coin.name.clone(), outcome)
                })
        });
        let coins = join_all(pipelines).await.into_iter().collect();
        let report = MinerStatsReport {
            address: address.to_string(),
            coins,
        };
        let generated_at = self.time_provider.seconds_since_epoch();
        let version = self.miner_stats.publish(report.clone(), generated_at);
        Snapshot {
            version,
            generated_at,
            data: report,
        }
    }

    /// Compute windowed pool stats for every group and publish them. A group
    /// that fails is left out, the others still publish.
    pub async fn get_stats(&self) -> Snapshot<PortalStats> {
        let now = self.time_provider.seconds_since_epoch();
        let algorithms = &self.algorithms;
        let window = self.hashrate_window;
        let collections = self.groups.iter().map(move |group| async move {
            match collect_group_stats(group, algorithms, window, now).await {
                Ok(stats) => stats,
                Err(e) => {
                    warn!(
                        "Stats for store group {} ({}) failed: {e}",
                        group.endpoint,
                        group.coins.join(", ")
                    );
                    Vec::new()
                }
            }
        });
        let pools = join_all(collections).await.into_iter().flatten().collect();
        let stats = PortalStats::from_pools(pools);
        let version = self.stats.publish(stats.clone(), now);
        Snapshot {
            version,
            generated_at: now,
            data: stats,
        }
    }

    pub fn latest_stats(&self) -> Snapshot<PortalStats> {
        self.stats.latest()
    }

    pub fn latest_miner_stats(&self) -> Snapshot<MinerStatsReport> {
        self.miner_stats.latest()
    }

    pub fn subscribe_stats(&self) -> watch::Receiver<Snapshot<PortalStats>> {
        self.stats.subscribe()
    }

    pub fn subscribe_miner_stats(&self) -> watch::Receiver<Snapshot<MinerStatsReport>> {
        self.miner_stats.subscribe()
    }
}
