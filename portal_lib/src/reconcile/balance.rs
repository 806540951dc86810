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

use crate::store::{StoreError, StoreGateway, keys};
use tracing::warn;

/// Stored unpaid balance of `address` for `coin`. Missing or unreadable
/// balances are zero. Never written from here.
pub async fn read_balance<S: StoreGateway>(
    store: &S,
    coin: &str,
    address: &str,
) -> Result<u64, StoreError> {
    let raw = store.hget(&keys::balances(coin), address).await?;
    Ok(raw.as_deref().map_or(0, |value| parse_balance(coin, value)))
}

fn parse_balance(coin: &str, value: &str) -> u64 {
    let integer_part = value.trim().split('.').next().unwrap_or_default();
    match integer_part.parse::<i64>() {
        Ok(balance) if balance >= 0 => balance as u64,
        _ => {
            warn!("{coin}: unreadable balance {value:?}, using 0");
            0
        }
    }
}
