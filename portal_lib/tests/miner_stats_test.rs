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

mod common;

use bitcoindrpc::BitcoinRpcConfig;
use bitcoindrpc::test_utils::{mock_daemon_failure, mock_wallet, setup_mock_bitcoin_rpc};
use common::{default_test_config, portal_with_stores, test_coin};
use portal_accounting::hashrate::Algorithm;
use portal_lib::config::Config;
use portal_lib::reconcile::{MinerStatsOutcome, RoundCategory};
use portal_lib::store::MemoryStore;
use portal_lib::utils::time_provider::TestTimeProvider;

const LITECOIN_PORT: u16 = 6379;
const DOGECOIN_PORT: u16 = 6380;

fn litecoin_config(daemon: &BitcoinRpcConfig) -> Config {
    default_test_config().with_coin(
        "litecoin",
        test_coin(Algorithm::Scrypt, LITECOIN_PORT, daemon),
    )
}

async fn round_x_store() -> MemoryStore {
    let store = MemoryStore::new();
    store
        .sadd("litecoin_blocksPending", "abc:100:5000000000")
        .await;
    store.hset("litecoin_shares:round100", "w1", "70").await;
    store.hset("litecoin_shares:round100", "w2", "30").await;
    store
}

#[tokio::test]
async fn test_confirmed_round_is_split_by_shares() {
    let (mock_server, daemon) = setup_mock_bitcoin_rpc().await;
    mock_wallet(&mock_server, &[("abc", 50.0, "generate")]).await;
    let config = litecoin_config(&daemon);
    let store = round_x_store().await;
    let portal = portal_with_stores(
        &config,
        &[(LITECOIN_PORT, store)],
        TestTimeProvider::at_seconds(1_700_000_000),
    );

    let snapshot = portal.get_miner_stats("w1").await;
    let litecoin = snapshot.data.coin("litecoin").unwrap();

    assert_eq!(litecoin.rounds.len(), 1);
    assert_eq!(litecoin.rounds[0].category, Some(RoundCategory::Confirmed));
    assert_eq!(litecoin.rounds[0].magnitude, Some(100_000_000.0));
    assert_eq!(litecoin.rewards["w1"], 3_465_000_000);
    assert_eq!(litecoin.rewards["w2"], 1_485_000_000);
    let paid: u64 = litecoin.rewards.values().sum();
    assert!(paid <= 4_950_000_000);
    assert!(litecoin.pending_rewards.is_empty());
    assert_eq!(litecoin.balance, 0);
    assert_eq!(snapshot.generated_at, 1_700_000_000);
}

#[tokio::test]
async fn test_immature_round_goes_to_pending_rewards() {
    let (mock_server, daemon) = setup_mock_bitcoin_rpc().await;
    mock_wallet(&mock_server, &[("abc", 50.0, "immature")]).await;
    let config = litecoin_config(&daemon);
    let portal = portal_with_stores(
        &config,
        &[(LITECOIN_PORT, round_x_store().await)],
        TestTimeProvider::at_seconds(0),
    );

    let snapshot = portal.get_miner_stats("w1").await;
    let litecoin = snapshot.data.coin("litecoin").unwrap();

    assert!(litecoin.rewards.is_empty());
    assert_eq!(litecoin.pending_rewards["w1"], 3_465_000_000);
    assert_eq!(litecoin.pending_rewards["w2"], 1_485_000_000);
}

#[tokio::test]
async fn test_address_without_balance_or_rounds() {
    let (_mock_server, daemon) = setup_mock_bitcoin_rpc().await;
    let config = litecoin_config(&daemon);
    let portal = portal_with_stores(
        &config,
        &[(LITECOIN_PORT, MemoryStore::new())],
        TestTimeProvider::at_seconds(0),
    );

    for address in ["w1", ""] {
        let snapshot = portal.get_miner_stats(address).await;
        let json = serde_json::to_value(&snapshot.data.coins["litecoin"]).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "status": "resolved",
                "rounds": [],
                "rewards": {},
                "pendingRewards": {},
                "balance": 0,
                "poolMargin": 0
            })
        );
    }
}

#[tokio::test]
async fn test_missing_daemon_result_leaves_sibling_untouched() {
    let (mock_server, daemon) = setup_mock_bitcoin_rpc().await;
    // The wallet knows dogecoin's block but not litecoin's
    mock_wallet(&mock_server, &[("doge1", 10000.0, "generate")]).await;
    let config = default_test_config()
        .with_coin("litecoin", test_coin(Algorithm::Scrypt, LITECOIN_PORT, &daemon))
        .with_coin("dogecoin", test_coin(Algorithm::Scrypt, DOGECOIN_PORT, &daemon));

    let litecoin_store = round_x_store().await;
    litecoin_store.hset("litecoin_balances", "w1", "500").await;
    let dogecoin_store = MemoryStore::new();
    dogecoin_store
        .sadd("dogecoin_blocksPending", "doge1:7:1000000")
        .await;
    dogecoin_store.hset("dogecoin_shares:round7", "w1", "1").await;

    let portal = portal_with_stores(
        &config,
        &[(LITECOIN_PORT, litecoin_store), (DOGECOIN_PORT, dogecoin_store)],
        TestTimeProvider::at_seconds(0),
    );
    let snapshot = portal.get_miner_stats("w1").await;

    let litecoin = snapshot.data.coin("litecoin").unwrap();
    assert!(litecoin.rounds.is_empty());
    assert!(litecoin.rewards.is_empty());
    assert_eq!(litecoin.balance, 500);

    let dogecoin = snapshot.data.coin("dogecoin").unwrap();
    assert_eq!(dogecoin.rewards["w1"], 990_000);
}

#[tokio::test]
async fn test_daemon_outage_fails_only_that_coin() {
    let (failing_daemon_server, failing_daemon) = setup_mock_bitcoin_rpc().await;
    mock_daemon_failure(&failing_daemon_server, 500).await;
    let (mock_server, daemon) = setup_mock_bitcoin_rpc().await;
    mock_wallet(&mock_server, &[("doge1", 10000.0, "generate")]).await;

    let config = default_test_config()
        .with_coin(
            "litecoin",
            test_coin(Algorithm::Scrypt, LITECOIN_PORT, &failing_daemon),
        )
        .with_coin("dogecoin", test_coin(Algorithm::Scrypt, DOGECOIN_PORT, &daemon));
    let dogecoin_store = MemoryStore::new();
    dogecoin_store
        .sadd("dogecoin_blocksPending", "doge1:7:1000000")
        .await;
    dogecoin_store.hset("dogecoin_shares:round7", "w1", "1").await;

    let portal = portal_with_stores(
        &config,
        &[
            (LITECOIN_PORT, round_x_store().await),
            (DOGECOIN_PORT, dogecoin_store),
        ],
        TestTimeProvider::at_seconds(0),
    );
    let snapshot = portal.get_miner_stats("w1").await;

    assert!(matches!(
        snapshot.data.coins["litecoin"],
        MinerStatsOutcome::Failed { .. }
    ));
    assert_eq!(snapshot.data.coin("dogecoin").unwrap().rewards["w1"], 990_000);
}

#[tokio::test]
async fn test_store_outage_fails_only_that_group() {
    let (mock_server, daemon) = setup_mock_bitcoin_rpc().await;
    mock_wallet(&mock_server, &[("abc", 50.0, "generate")]).await;
    let config = default_test_config()
        .with_coin("litecoin", test_coin(Algorithm::Scrypt, LITECOIN_PORT, &daemon))
        .with_coin("dogecoin", test_coin(Algorithm::Scrypt, DOGECOIN_PORT, &daemon));

    // No store registered for dogecoin's port, its group is broken
    let portal = portal_with_stores(
        &config,
        &[(LITECOIN_PORT, round_x_store().await)],
        TestTimeProvider::at_seconds(0),
    );
    let snapshot = portal.get_miner_stats("w1").await;

    match &snapshot.data.coins["dogecoin"] {
        MinerStatsOutcome::Failed { reason } => assert!(reason.contains("connection refused")),
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(
        snapshot.data.coin("litecoin").unwrap().rewards["w1"],
        3_465_000_000
    );
}

#[test_log::test(tokio::test)]
async fn test_orphaned_shares_merge_once_per_cycle() {
    let (mock_server, daemon) = setup_mock_bitcoin_rpc().await;
    mock_wallet(
        &mock_server,
        &[("orph", 50.0, "orphan"), ("abc", 50.0, "generate")],
    )
    .await;
    let config = litecoin_config(&daemon);

    let store = round_x_store().await;
    store.sadd("litecoin_blocksPending", "orph:99:5000000000").await;
    store.hset("litecoin_shares:round99", "w3", "40").await;
    store.hset("litecoin_shares:round99", "w1", "5").await;
    store.hset("litecoin_shares:roundCurrent", "w1", "2").await;

    let portal = portal_with_stores(
        &config,
        &[(LITECOIN_PORT, store.clone())],
        TestTimeProvider::at_seconds(0),
    );
    let snapshot = portal.get_miner_stats("w1").await;

    let current = store.hgetall("litecoin_shares:roundCurrent").await;
    assert_eq!(current["w1"], "7");
    assert_eq!(current["w3"], "40");

    // Orphaned shares never earn
    let litecoin = snapshot.data.coin("litecoin").unwrap();
    assert!(!litecoin.rewards.contains_key("w3"));
    assert_eq!(litecoin.rewards["w1"], 3_465_000_000);
    assert_eq!(litecoin.rounds.len(), 2);
    assert_eq!(litecoin.rounds[0].category, Some(RoundCategory::Orphan));

    // The orphan record stays until archived elsewhere, so the next cycle
    // merges it again, once
    portal.get_miner_stats("w1").await;
    let current = store.hgetall("litecoin_shares:roundCurrent").await;
    assert_eq!(current["w3"], "80");
}

#[tokio::test]
async fn test_orphan_merge_into_corrupt_current_round_writes_nothing() {
    let (mock_server, daemon) = setup_mock_bitcoin_rpc().await;
    mock_wallet(
        &mock_server,
        &[("orph", 50.0, "orphan"), ("abc", 50.0, "generate")],
    )
    .await;
    let config = litecoin_config(&daemon);

    let store = round_x_store().await;
    store.sadd("litecoin_blocksPending", "orph:99:5000000000").await;
    store.hset("litecoin_shares:round99", "w1", "5").await;
    store.hset("litecoin_shares:round99", "w3", "40").await;
    store.hset("litecoin_shares:roundCurrent", "w1", "2").await;
    store.hset("litecoin_shares:roundCurrent", "w3", "1.5").await;

    let portal = portal_with_stores(
        &config,
        &[(LITECOIN_PORT, store.clone())],
        TestTimeProvider::at_seconds(0),
    );
    let snapshot = portal.get_miner_stats("w1").await;

    assert!(matches!(
        snapshot.data.coins["litecoin"],
        MinerStatsOutcome::Failed { .. }
    ));
    let current = store.hgetall("litecoin_shares:roundCurrent").await;
    assert_eq!(current["w1"], "2");
    assert_eq!(current["w3"], "1.5");
}

#[tokio::test]
async fn test_snapshot_versions_increase() {
    let (_mock_server, daemon) = setup_mock_bitcoin_rpc().await;
    let config = litecoin_config(&daemon);
    let portal = portal_with_stores(
        &config,
        &[(LITECOIN_PORT, MemoryStore::new())],
        TestTimeProvider::at_seconds(0),
    );

    assert_eq!(portal.latest_miner_stats().version, 0);
    assert_eq!(portal.get_miner_stats("w1").await.version, 1);
    assert_eq!(portal.get_miner_stats("w2").await.version, 2);
    assert_eq!(portal.latest_miner_stats().data.address, "w2");
}
