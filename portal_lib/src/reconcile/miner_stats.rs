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

use super::ReconcileError;
use super::allocate::allocate_rewards;
use super::balance::read_balance;
use super::classify::classify_rounds;
use super::rounds::{Round, collect_pending_rounds};
use super::shares::{fetch_round_tallies, merge_orphaned_shares};
use crate::store::StoreGateway;
use bitcoindrpc::BitcoindRpcClient;
use portal_accounting::RewardSplit;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Reconciliation result for one coin
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinMinerStats {
    /// Rounds classified this cycle: orphaned, confirmed, pending
    pub rounds: Vec<Round>,
    pub rewards: RewardSplit,
    pub pending_rewards: RewardSplit,
    /// Stored balance of the queried address
    pub balance: u64,
    /// Flooring remainder kept from confirmed rounds, on top of the fee
    pub pool_margin: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum MinerStatsOutcome {
    Resolved(CoinMinerStats),
    Failed { reason: String },
}

impl MinerStatsOutcome {
    pub fn resolved(&self) -> Option<&CoinMinerStats> {
        match self {
            MinerStatsOutcome::Resolved(stats) => Some(stats),
            MinerStatsOutcome::Failed { .. } => None,
        }
    }
}

/// Per coin outcomes of one `get_miner_stats` call
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MinerStatsReport {
    pub address: String,
    pub coins: BTreeMap<String, MinerStatsOutcome>,
}

impl MinerStatsReport {
    pub fn coin(&self, coin: &str) -> Option<&CoinMinerStats> {
        self.coins.get(coin).and_then(MinerStatsOutcome::resolved)
    }
}

async fn run_pipeline<S: StoreGateway>(
    store: &S,
    daemon: &BitcoindRpcClient,
    coin: &str,
    fee_ppm: u64,
) -> Result<CoinMinerStats, ReconcileError> {
    let rounds = collect_pending_rounds(store, coin).await?;
    let classified = classify_rounds(daemon, coin, rounds).await?;
    let reported: Vec<Round> = classified.iter().cloned().collect();
    let tallies = fetch_round_tallies(store, coin, classified).await?;
    merge_orphaned_shares(store, coin, &tallies.orphaned).await?;
    let ledger = allocate_rewards(coin, &tallies, fee_ppm);
    Ok(CoinMinerStats {
        rounds: reported,
        pool_margin: ledger.pool_margin(),
        rewards: ledger.rewards,
        pending_rewards: ledger.pending_rewards,
        balance: 0,
    })
}

/// Run the full pipeline for one coin and attach the balance of `address`.
///
/// Nothing to do still reports the balance. Store or daemon failures are
/// reported as `Failed` and never reach sibling coins.
pub async fn reconcile_coin<S: StoreGateway>(
    store: &S,
    daemon: &BitcoindRpcClient,
    coin: &str,
    fee_ppm: u64,
    address: &str,
) -> MinerStatsOutcome {
    let stats = match run_pipeline(store, daemon, coin, fee_ppm).await {
        Ok(stats) => stats,
        Err(ReconcileError::NoWork(reason)) => {
            debug!("{coin}: {reason}");
            CoinMinerStats::default()
        }
        Err(e) => {
            warn!("{coin}: reconciliation failed: {e}");
            return MinerStatsOutcome::Failed {
                reason: e.to_string(),
            };
        }
    };
    match read_balance(store, coin, address).await {
        Ok(balance) => MinerStatsOutcome::Resolved(CoinMinerStats { balance, ..stats }),
        Err(e) => {
            warn!("{coin}: failed to read balance: {e}");
            MinerStatsOutcome::Failed {
                reason: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use bitcoindrpc::test_utils::{mock_daemon_failure, mock_wallet, setup_mock_bitcoin_rpc};
    use portal_accounting::calc::fee_to_ppm;

    async fn seeded_store() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .sadd("litecoin_blocksPending", "abc:100:5000000000")
            .await;
        store.hset("litecoin_shares:round100", "w1", "70").await;
        store.hset("litecoin_shares:round100", "w2", "30").await;
        store.hset("litecoin_balances", "w1", "777").await;
        store
    }

    #[tokio::test]
    async fn test_reconcile_confirmed_round() {
        let store = seeded_store().await;
        let (mock_server, config) = setup_mock_bitcoin_rpc().await;
        mock_wallet(&mock_server, &[("abc", 50.0, "generate")]).await;
        let daemon = BitcoindRpcClient::from_config(&config).unwrap();

        let outcome = reconcile_coin(&store, &daemon, "litecoin", fee_to_ppm(0.01), "w1").await;
        let stats = outcome.resolved().unwrap();

        assert_eq!(stats.rounds.len(), 1);
        assert_eq!(stats.rewards["w1"], 3_465_000_000);
        assert_eq!(stats.rewards["w2"], 1_485_000_000);
        assert!(stats.pending_rewards.is_empty());
        assert_eq!(stats.balance, 777);
        assert_eq!(stats.pool_margin, 0);
    }

    #[tokio::test]
    async fn test_reconcile_daemon_failure_marks_coin_failed() {
        let store = seeded_store().await;
        let (mock_server, config) = setup_mock_bitcoin_rpc().await;
        mock_daemon_failure(&mock_server, 503).await;
        let daemon = BitcoindRpcClient::from_config(&config).unwrap();

        let outcome = reconcile_coin(&store, &daemon, "litecoin", 0, "w1").await;
        assert!(matches!(outcome, MinerStatsOutcome::Failed { .. }));
    }

    #[tokio::test]
    async fn test_no_work_still_reads_balance() {
        let store = MemoryStore::new();
        store.hset("litecoin_balances", "w1", "42").await;
        let (_mock_server, config) = setup_mock_bitcoin_rpc().await;
        let daemon = BitcoindRpcClient::from_config(&config).unwrap();

        let outcome = reconcile_coin(&store, &daemon, "litecoin", 0, "w1").await;
        let stats = outcome.resolved().unwrap();
        assert!(stats.rounds.is_empty());
        assert!(stats.rewards.is_empty());
        assert_eq!(stats.balance, 42);
    }

    #[test]
    fn test_outcome_serialization() {
        let resolved = MinerStatsOutcome::Resolved(CoinMinerStats::default());
        let json = serde_json::to_value(&resolved).unwrap();
        assert_eq!(json["status"], "resolved");
        assert_eq!(json["pendingRewards"], serde_json::json!({}));
        assert_eq!(json["balance"], 0);

        let failed = MinerStatsOutcome::Failed {
            reason: "boom".into(),
        };
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json, serde_json::json!({"status": "failed", "reason": "boom"}));
    }
}
