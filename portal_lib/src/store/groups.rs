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

use super::{RedisStore, StoreError, StoreGateway, TimeoutStore};
use crate::config::{CoinConfig, StoreEndpoint};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Coins served by the same store endpoint, sharing one gateway
#[derive(Debug)]
pub struct CoinGroup<S> {
    pub endpoint: StoreEndpoint,
    /// Coin names, sorted
    pub coins: Vec<String>,
    pub store: Arc<S>,
}

impl<S> Clone for CoinGroup<S> {
    fn clone(&self) -> Self {
        CoinGroup {
            endpoint: self.endpoint.clone(),
            coins: self.coins.clone(),
            store: self.store.clone(),
        }
    }
}

/// Endpoint to the coins it serves. Every configured coin lands in exactly
/// one group.
pub fn group_coins_by_endpoint(
    coins: &BTreeMap<String, CoinConfig>,
) -> BTreeMap<StoreEndpoint, Vec<String>> {
    let mut groups: BTreeMap<StoreEndpoint, Vec<String>> = BTreeMap::new();
    for (name, coin) in coins {
        groups
            .entry(coin.store.clone())
            .or_default()
            .push(name.clone());
    }
    groups
}

/// Build one gateway per endpoint with `make_store`
pub fn build_groups<S, F>(
    coins: &BTreeMap<String, CoinConfig>,
    mut make_store: F,
) -> Result<Vec<CoinGroup<S>>, StoreError>
where
    S: StoreGateway,
    F: FnMut(&StoreEndpoint) -> Result<S, StoreError>,
{
    group_coins_by_endpoint(coins)
        .into_iter()
        .map(|(endpoint, coins)| {
            let store = make_store(&endpoint)?;
            Ok(CoinGroup {
                endpoint,
                coins,
                store: Arc::new(store),
            })
        })
        .collect()
}

/// Redis backed groups, every call bounded by `timeout`
pub fn connect_groups(
    coins: &BTreeMap<String, CoinConfig>,
    timeout: Duration,
) -> Result<Vec<CoinGroup<TimeoutStore<RedisStore>>>, StoreError> {
    build_groups(coins, |endpoint| {
        let store = RedisStore::new(endpoint)?;
        info!("Store gateway for {} created", endpoint);
        Ok(TimeoutStore::new(store, timeout))
    })
}
