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

use super::classify::ClassifiedRounds;
use super::rounds::Round;
use crate::store::{StoreCommand, StoreError, StoreGateway, keys};
use portal_accounting::ShareTally;
use portal_accounting::calc::parse_share_count;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Round tallies read from the store, grouped like the rounds they belong to
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoundTallies {
    pub orphaned: Vec<(Round, ShareTally)>,
    pub confirmed: Vec<(Round, ShareTally)>,
    pub pending: Vec<(Round, ShareTally)>,
}

/// Decode a `<coin>_shares:round<h>` hash. Values that are not share counts
/// count as zero.
pub fn parse_tally(coin: &str, raw: BTreeMap<String, String>) -> ShareTally {
    raw.into_iter()
        .map(|(worker, value)| {
            let shares = parse_share_count(&value).unwrap_or_else(|| {
                warn!("{coin}: worker {worker} has non numeric share count {value:?}");
                0
            });
            (worker, shares)
        })
        .collect()
}

/// Read every classified round's tally in one atomic batch. Replies come
/// back in submission order: orphaned, confirmed, pending.
pub async fn fetch_round_tallies<S: StoreGateway>(
    store: &S,
    coin: &str,
    classified: ClassifiedRounds,
) -> Result<RoundTallies, StoreError> {
    let commands: Vec<StoreCommand> = classified
        .iter()
        .map(|round| StoreCommand::HGetAll {
            key: keys::round_shares(coin, round.height),
        })
        .collect();
    let expected = commands.len();
    let replies = store.multi(commands).await?;
    if replies.len() != expected {
        return Err(StoreError::UnexpectedReply(format!(
            "asked for {expected} round tallies, got {}",
            replies.len()
        )));
    }

    let mut replies = replies.into_iter();
    let mut pair = |rounds: Vec<Round>| -> Result<Vec<(Round, ShareTally)>, StoreError> {
        rounds
            .into_iter()
            .map(|round| {
                let raw = replies
                    .next()
                    .ok_or_else(|| StoreError::UnexpectedReply("missing round tally".into()))?
                    .into_hash()?;
                Ok((round, parse_tally(coin, raw)))
            })
            .collect()
    };
    let orphaned = pair(classified.orphaned)?;
    let confirmed = pair(classified.confirmed)?;
    let pending = pair(classified.pending)?;
    Ok(RoundTallies {
        orphaned,
        confirmed,
        pending,
    })
}

/// One HINCRBY of the current round per worker per orphaned round
pub fn orphan_merge_commands(coin: &str, orphaned: &[(Round, ShareTally)]) -> Vec<StoreCommand> {
    let current = keys::current_round_shares(coin);
    let mut commands = Vec::new();
    for (round, tally) in orphaned {
        for (worker, shares) in tally.iter().filter(|(_, shares)| **shares > 0) {
            let delta = i64::try_from(*shares).unwrap_or_else(|_| {
                warn!(
                    "{coin}: orphaned round {} credits {shares} shares to {worker}, \
                     clamping the merge to {}",
                    round.height,
                    i64::MAX
                );
                i64::MAX
            });
            commands.push(StoreCommand::HIncrBy {
                key: current.clone(),
                field: worker.clone(),
                delta,
            });
        }
    }
    commands
}

/// Check every increment would succeed against the current round as read.
/// A redis transaction does not roll back, so a field that is not an
/// integer or would overflow must be caught before anything is queued.
fn check_merge_targets(
    current: &BTreeMap<String, String>,
    commands: &[StoreCommand],
) -> Result<(), StoreError> {
    let mut projected: BTreeMap<&str, i64> = BTreeMap::new();
    for command in commands {
        let StoreCommand::HIncrBy { field, delta, .. } = command else {
            continue;
        };
        let value = match projected.get(field.as_str()) {
            Some(value) => *value,
            None => match current.get(field) {
                Some(raw) => raw.parse::<i64>().map_err(|_| {
                    StoreError::Command(format!(
                        "current round value {raw:?} for {field} is not an integer"
                    ))
                })?,
                None => 0,
            },
        };
        let updated = value.checked_add(*delta).ok_or_else(|| {
            StoreError::Command(format!("merging {delta} shares into {field} overflows"))
        })?;
        projected.insert(field.as_str(), updated);
    }
    Ok(())
}

/// Credit orphaned shares to the current round in one transaction.
/// Returns the number of increments applied.
///
/// Orphaned rounds stay in the pending set until they are archived, so the
/// same shares are credited again on every cycle until then.
pub async fn merge_orphaned_shares<S: StoreGateway>(
    store: &S,
    coin: &str,
    orphaned: &[(Round, ShareTally)],
) -> Result<usize, StoreError> {
    let commands = orphan_merge_commands(coin, orphaned);
    if commands.is_empty() {
        return Ok(0);
    }
    let current = store
        .multi(vec![StoreCommand::HGetAll {
            key: keys::current_round_shares(coin),
        }])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| StoreError::UnexpectedReply("missing current round".into()))?
        .into_hash()?;
    check_merge_targets(&current, &commands)?;

    let count = commands.len();
    store.multi(commands).await?;
    let heights: Vec<u64> = orphaned.iter().map(|(round, _)| round.height).collect();
    info!(
        "{coin}: merged shares of {} orphaned rounds into the current round",
        orphaned.len()
    );
    warn!(
        "{coin}: orphaned rounds at heights {heights:?} are still pending, their shares \
         will be merged again until they are archived"
    );
    Ok(count)
}
