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

use crate::store::{CoinGroup, ScoreBound, StoreCommand, StoreError, StoreGateway, keys};
use portal_accounting::hashrate::{Algorithm, WindowTotals};
use portal_accounting::stats::CoinStats;
use std::collections::BTreeMap;
use tracing::{debug, warn};

const COMMANDS_PER_COIN: usize = 4;

/// Trim samples older than the window, read the rest, the passthrough stats
/// hash and the pending block count
pub fn coin_stats_commands(coin: &str, window_start: u64) -> [StoreCommand; COMMANDS_PER_COIN] {
    [
        StoreCommand::ZRemRangeByScore {
            key: keys::hashrate(coin),
            min: ScoreBound::NegInf,
            max: ScoreBound::Exclusive(window_start),
        },
        StoreCommand::ZRangeByScore {
            key: keys::hashrate(coin),
            min: ScoreBound::Inclusive(window_start),
            max: ScoreBound::PosInf,
        },
        StoreCommand::HGetAll {
            key: keys::pool_stats(coin),
        },
        StoreCommand::SCard {
            key: keys::blocks_pending(coin),
        },
    ]
}

/// Stats for every coin of a group, from one atomic batch.
///
/// Coins without a known algorithm are skipped.
pub async fn collect_group_stats<S: StoreGateway>(
    group: &CoinGroup<S>,
    algorithms: &BTreeMap<String, Algorithm>,
    window_secs: u64,
    now_secs: u64,
) -> Result<Vec<CoinStats>, StoreError> {
    let window_start = now_secs.saturating_sub(window_secs);
    let coins: Vec<(&String, Algorithm)> = group
        .coins
        .iter()
        .filter_map(|coin| match algorithms.get(coin) {
            Some(algorithm) => Some((coin, *algorithm)),
            None => {
                warn!("{coin}: no algorithm configured, skipping stats");
                None
            }
        })
        .collect();
    if coins.is_empty() {
        return Ok(Vec::new());
    }

    let commands: Vec<StoreCommand> = coins
        .iter()
        .flat_map(|(coin, _)| coin_stats_commands(coin, window_start))
        .collect();
    let replies = group.store.multi(commands).await?;
    if replies.len() != coins.len() * COMMANDS_PER_COIN {
        return Err(StoreError::UnexpectedReply(format!(
            "expected {} stats replies from {}, got {}",
            coins.len() * COMMANDS_PER_COIN,
            group.endpoint,
            replies.len()
        )));
    }

    let mut replies = replies.into_iter();
    let mut stats = Vec::with_capacity(coins.len());
    for (coin, algorithm) in coins {
        let (Some(trimmed), Some(samples), Some(pool_stats), Some(pending)) = (
            replies.next(),
            replies.next(),
            replies.next(),
            replies.next(),
        ) else {
            return Err(StoreError::UnexpectedReply(format!(
                "{coin}: stats replies cut short"
            )));
        };
        let trimmed = trimmed.into_count()?;
        let samples = samples.into_members()?;
        debug!(
            "{coin}: trimmed {trimmed} old samples, {} in window",
            samples.len()
        );
        stats.push(CoinStats::new(
            coin,
            algorithm,
            window_secs,
            WindowTotals::from_raw_samples(&samples),
            pool_stats.into_hash()?,
            pending.into_count()?,
        ));
    }
    Ok(stats)
}
