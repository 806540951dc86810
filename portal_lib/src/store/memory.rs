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

use super::{ScoreBound, StoreCommand, StoreError, StoreGateway, StoreReply};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Default)]
struct MemoryState {
    sets: HashMap<String, BTreeSet<String>>,
    hashes: HashMap<String, BTreeMap<String, String>>,
    /// member -> score, ordered by score when read
    sorted_sets: HashMap<String, BTreeMap<String, u64>>,
}

impl MemoryState {
    fn apply(&mut self, command: StoreCommand) -> Result<StoreReply, StoreError> {
        let reply = match command {
            StoreCommand::SMembers { key } => StoreReply::Members(
                self.sets
                    .get(&key)
                    .map(|set| set.iter().cloned().collect())
                    .unwrap_or_default(),
            ),
            StoreCommand::SCard { key } => {
                StoreReply::Count(self.sets.get(&key).map_or(0, |set| set.len() as u64))
            }
            StoreCommand::HGetAll { key } => {
                StoreReply::Hash(self.hashes.get(&key).cloned().unwrap_or_default())
            }
            StoreCommand::HGet { key, field } => StoreReply::Value(
                self.hashes
                    .get(&key)
                    .and_then(|hash| hash.get(&field))
                    .cloned(),
            ),
            StoreCommand::HIncrBy { key, field, delta } => {
                let hash = self.hashes.entry(key).or_default();
                let current = match hash.get(&field) {
                    Some(value) => value.parse::<i64>().map_err(|_| {
                        StoreError::Command(format!("hash value {value:?} is not an integer"))
                    })?,
                    None => 0,
                };
                let updated = current
                    .checked_add(delta)
                    .ok_or_else(|| StoreError::Command("increment overflow".to_string()))?;
                hash.insert(field, updated.to_string());
                StoreReply::Integer(updated)
            }
            StoreCommand::ZRemRangeByScore { key, min, max } => {
                let Some(zset) = self.sorted_sets.get_mut(&key) else {
                    return Ok(StoreReply::Count(0));
                };
                let before = zset.len();
                zset.retain(|_, score| !in_range(*score, min, max));
                StoreReply::Count((before - zset.len()) as u64)
            }
            StoreCommand::ZRangeByScore { key, min, max } => {
                let mut members: Vec<(u64, String)> = self
                    .sorted_sets
                    .get(&key)
                    .map(|zset| {
                        zset.iter()
                            .filter(|(_, score)| in_range(**score, min, max))
                            .map(|(member, score)| (*score, member.clone()))
                            .collect()
                    })
                    .unwrap_or_default();
                members.sort();
                StoreReply::Members(members.into_iter().map(|(_, member)| member).collect())
            }
        };
        Ok(reply)
    }
}

fn in_range(score: u64, min: ScoreBound, max: ScoreBound) -> bool {
    min.admits_from_below(score) && max.admits_from_above(score)
}

/// In process store with the same contract as the redis gateway.
///
/// Clones share state. A failing command in a `multi` leaves the state as it
/// was before the call.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sadd(&self, key: &str, member: &str) {
        let mut state = self.state.write().await;
        state
            .sets
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string());
    }

    pub async fn hset(&self, key: &str, field: &str, value: &str) {
        let mut state = self.state.write().await;
        state
            .hashes
            .entry(key.to_string())
            .or_default()
            .insert(field.to_string(), value.to_string());
    }

    pub async fn zadd(&self, key: &str, score: u64, member: &str) {
        let mut state = self.state.write().await;
        state
            .sorted_sets
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string(), score);
    }

    /// Full contents of a hash, empty when missing
    pub async fn hgetall(&self, key: &str) -> BTreeMap<String, String> {
        let state = self.state.read().await;
        state.hashes.get(key).cloned().unwrap_or_default()
    }

    /// Members of a sorted set, in score order
    pub async fn zmembers(&self, key: &str) -> Vec<String> {
        let mut state = self.state.write().await;
        match state.apply(StoreCommand::ZRangeByScore {
            key: key.to_string(),
            min: ScoreBound::NegInf,
            max: ScoreBound::PosInf,
        }) {
            Ok(StoreReply::Members(members)) => members,
            _ => Vec::new(),
        }
    }
}

impl StoreGateway for MemoryStore {
    async fn multi(&self, commands: Vec<StoreCommand>) -> Result<Vec<StoreReply>, StoreError> {
        let mut state = self.state.write().await;
        let mut staged = state.clone();
        let replies = commands
            .into_iter()
            .map(|command| staged.apply(command))
            .collect::<Result<Vec<_>, _>>()?;
        *state = staged;
        Ok(replies)
    }
}
