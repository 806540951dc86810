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
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct PortalConfig {
    /// Seconds of hashrate samples considered by the stats pipeline
    #[serde(default = "default_hashrate_window")]
    pub hashrate_window: u64,
    /// Seconds between two stats runs in the node
    #[serde(default = "default_stats_interval_secs")]
    pub stats_interval_secs: u64,
    /// Upper bound for a single store round trip
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,
}

impl Default for PortalConfig {
    fn default() -> Self {
        PortalConfig {
            hashrate_window: default_hashrate_window(),
            stats_interval_secs: default_stats_interval_secs(),
            store_timeout_ms: default_store_timeout_ms(),
        }
    }
}

impl PortalConfig {
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

fn default_hashrate_window() -> u64 {
    300
}

fn default_stats_interval_secs() -> u64 {
    60
}

fn default_store_timeout_ms() -> u64 {
    5_000
}

/// Address of a key value store. Coins with equal endpoints share a connection.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StoreEndpoint {
    pub host: String,
    pub port: u16,
}

impl StoreEndpoint {
    pub fn new(host: &str, port: u16) -> Self {
        StoreEndpoint {
            host: host.to_string(),
            port,
        }
    }

    pub fn url(&self) -> String {
        format!("redis://{}:{}/", self.host, self.port)
    }
}

impl fmt::Display for StoreEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CoinConfig {
    pub algorithm: Algorithm,
    /// Pool fee as a fraction, 0.01 is one percent
    #[serde(default)]
    pub fee_percent: f64,
    pub daemon: BitcoinRpcConfig,
    pub store: StoreEndpoint,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct LoggingConfig {
    /// Log to file if specified
    pub file: Option<String>,
    /// Log level (defaults to "info")
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log to console, on unless disabled
    pub console: Option<bool>,
    /// Directory for stats
    #[serde(default = "default_stats_dir")]
    pub stats_dir: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_stats_dir() -> String {
    "./logs/stats".to_string()
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigValidationError {
    #[error("Coin {coin}: fee {fee} must be within [0, 1)")]
    FeeOutOfRange { coin: String, fee: f64 },
    #[error("Hashrate window must be greater than zero")]
    ZeroHashrateWindow,
    #[error("Coin name must not be empty")]
    EmptyCoinName,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub portal: PortalConfig,
    #[serde(default)]
    pub coins: BTreeMap<String, CoinConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn load(path: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("PORTAL").separator("_"))
            .build()?
            .try_deserialize()
    }

    /// Checks values serde cannot. Unknown algorithms already fail to load.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.portal.hashrate_window == 0 {
            return Err(ConfigValidationError::ZeroHashrateWindow);
        }
        for (coin, coin_config) in &self.coins {
            if coin.is_empty() {
                return Err(ConfigValidationError::EmptyCoinName);
            }
            let fee = coin_config.fee_percent;
            if !(0.0..1.0).contains(&fee) {
                return Err(ConfigValidationError::FeeOutOfRange {
                    coin: coin.clone(),
                    fee,
                });
            }
        }
        Ok(())
    }

    pub fn with_hashrate_window(mut self, hashrate_window: u64) -> Self {
        self.portal.hashrate_window = hashrate_window;
        self
    }

    pub fn with_stats_interval_secs(mut self, stats_interval_secs: u64) -> Self {
        self.portal.stats_interval_secs = stats_interval_secs;
        self
    }

    pub fn with_store_timeout_ms(mut self, store_timeout_ms: u64) -> Self {
        self.portal.store_timeout_ms = store_timeout_ms;
        self
    }

    pub fn with_coin(mut self, name: &str, coin: CoinConfig) -> Self {
        self.coins.insert(name.to_string(), coin);
        self
    }

    pub fn without_coins(mut self) -> Self {
        self.coins.clear();
        self
    }

    pub fn with_log_level(mut self, level: String) -> Self {
        self.logging.level = level;
        self
    }

    pub fn with_stats_dir(mut self, stats_dir: String) -> Self {
        self.logging.stats_dir = stats_dir;
        self
    }
}
