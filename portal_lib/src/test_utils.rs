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

use crate::config::{CoinConfig, Config, LoggingConfig, PortalConfig, StoreEndpoint};
use crate::store::{MemoryStore, StoreCommand, StoreError, StoreGateway, StoreReply};
use bitcoindrpc::BitcoinRpcConfig;
use portal_accounting::hashrate::Algorithm;
use std::collections::BTreeMap;

/// Store that either forwards to a memory store or fails every call
#[derive(Debug, Clone)]
pub struct FailingStore {
    inner: Option<MemoryStore>,
}

impl FailingStore {
    pub fn healthy(inner: MemoryStore) -> Self {
        FailingStore { inner: Some(inner) }
    }

    pub fn broken() -> Self {
        FailingStore { inner: None }
    }
}

impl StoreGateway for FailingStore {
    async fn multi(&self, commands: Vec<StoreCommand>) -> Result<Vec<StoreReply>, StoreError> {
        match &self.inner {
            Some(store) => store.multi(commands).await,
            None => Err(StoreError::Command("store unavailable".to_string())),
        }
    }
}

/// Config with no coins and default portal settings
pub fn empty_config() -> Config {
    Config {
        portal: PortalConfig::default(),
        coins: BTreeMap::new(),
        logging: LoggingConfig::default(),
    }
}

/// Coin with a one percent fee, served by a store on `port`
pub fn coin_config(algorithm: Algorithm, port: u16, daemon: &BitcoinRpcConfig) -> CoinConfig {
    CoinConfig {
        algorithm,
        fee_percent: 0.01,
        daemon: daemon.clone(),
        store: StoreEndpoint::new("127.0.0.1", port),
    }
}
