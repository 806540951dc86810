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

use bitcoindrpc::BitcoinRpcConfig;
use portal_accounting::hashrate::Algorithm;
use portal_lib::config::{CoinConfig, Config, LoggingConfig, PortalConfig, StoreEndpoint};
use portal_lib::portal::Portal;
use portal_lib::store::{
    CoinGroup, MemoryStore, StoreCommand, StoreError, StoreGateway, StoreReply, build_groups,
};
use portal_lib::utils::time_provider::TestTimeProvider;
use std::collections::BTreeMap;

/// Build a test configuration without coins, tests add the coins they need.
/// WARNING: This is a test fixture and should not be used anywhere else.
pub fn default_test_config() -> Config {
    Config {
        portal: PortalConfig {
            hashrate_window: 300,
            stats_interval_secs: 60,
            store_timeout_ms: 1_000,
        },
        coins: BTreeMap::new(),
        logging: LoggingConfig {
            level: "info".to_string(),
            file: None,
            console: Some(false),
            stats_dir: "./logs/stats".to_string(),
        },
    }
}

/// Coin with a one percent fee, its store identified by `port`
pub fn test_coin(algorithm: Algorithm, port: u16, daemon: &BitcoinRpcConfig) -> CoinConfig {
    CoinConfig {
        algorithm,
        fee_percent: 0.01,
        daemon: daemon.clone(),
        store: StoreEndpoint::new("127.0.0.1", port),
    }
}

/// Store that forwards to a memory store, or fails every call when broken
#[derive(Debug, Clone)]
pub struct TestStore {
    inner: Option<MemoryStore>,
}

impl TestStore {
    pub fn healthy(inner: MemoryStore) -> Self {
        TestStore { inner: Some(inner) }
    }

    pub fn broken() -> Self {
        TestStore { inner: None }
    }
}

impl StoreGateway for TestStore {
    async fn multi(&self, commands: Vec<StoreCommand>) -> Result<Vec<StoreReply>, StoreError> {
        match &self.inner {
            Some(store) => store.multi(commands).await,
            None => Err(StoreError::Command("connection refused".to_string())),
        }
    }
}

/// Portal whose store groups are looked up by port in `stores`. Ports
/// without an entry get a broken store.
pub fn portal_with_stores(
    config: &Config,
    stores: &[(u16, MemoryStore)],
    time_provider: TestTimeProvider,
) -> Portal<TestStore, TestTimeProvider> {
    let groups: Vec<CoinGroup<TestStore>> = build_groups(&config.coins, |endpoint| {
        Ok(stores
            .iter()
            .find(|(port, _)| *port == endpoint.port)
            .map(|(_, store)| TestStore::healthy(store.clone()))
            .unwrap_or_else(TestStore::broken))
    })
    .unwrap();
    Portal::new(config, groups, time_provider).unwrap()
}
