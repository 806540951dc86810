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

//! Gateway to the key value store shared with the stratum side.
//!
//! Every interaction is a list of commands executed as one transaction. The
//! redis implementation wraps them in MULTI/EXEC, which isolates the batch
//! but keeps earlier writes when a later command fails. The in memory one
//! applies them to a copy of its state and swaps it in on success.

pub mod groups;
pub mod keys;
pub mod memory;
pub mod redis_store;

use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

pub use groups::{CoinGroup, build_groups, connect_groups, group_coins_by_endpoint};
pub use memory::MemoryStore;
pub use redis_store::RedisStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to connect to store at {endpoint}: {reason}")]
    Connection { endpoint: String, reason: String },
    #[error("Store command failed: {0}")]
    Command(String),
    #[error("Store call timed out after {0:?}")]
    Timeout(Duration),
    #[error("Unexpected store reply: {0}")]
    UnexpectedReply(String),
}

/// Bound of a sorted set score range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBound {
    NegInf,
    PosInf,
    Inclusive(u64),
    Exclusive(u64),
}

impl ScoreBound {
    /// Redis syntax for the bound: `-inf`, `+inf`, `10` or `(10`
    pub fn to_arg(&self) -> String {
        match self {
            ScoreBound::NegInf => "-inf".to_string(),
            ScoreBound::PosInf => "+inf".to_string(),
            ScoreBound::Inclusive(score) => score.to_string(),
            ScoreBound::Exclusive(score) => format!("({score}"),
        }
    }

    pub(crate) fn admits_from_below(&self, score: u64) -> bool {
        match self {
            ScoreBound::NegInf => true,
            ScoreBound::PosInf => false,
            ScoreBound::Inclusive(min) => score >= *min,
            ScoreBound::Exclusive(min) => score > *min,
        }
    }

    pub(crate) fn admits_from_above(&self, score: u64) -> bool {
        match self {
            ScoreBound::NegInf => false,
            ScoreBound::PosInf => true,
            ScoreBound::Inclusive(max) => score <= *max,
            ScoreBound::Exclusive(max) => score < *max,
        }
    }
}

/// The subset of store commands the portal issues
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCommand {
    SMembers {
        key: String,
    },
    SCard {
        key: String,
    },
    HGetAll {
        key: String,
    },
    HGet {
        key: String,
        field: String,
    },
    HIncrBy {
        key: String,
        field: String,
        delta: i64,
    },
    ZRemRangeByScore {
        key: String,
        min: ScoreBound,
        max: ScoreBound,
    },
    ZRangeByScore {
        key: String,
        min: ScoreBound,
        max: ScoreBound,
    },
}

impl StoreCommand {
    pub fn key(&self) -> &str {
        match self {
            StoreCommand::SMembers { key }
            | StoreCommand::SCard { key }
            | StoreCommand::HGetAll { key }
            | StoreCommand::HGet { key, .. }
            | StoreCommand::HIncrBy { key, .. }
            | StoreCommand::ZRemRangeByScore { key, .. }
            | StoreCommand::ZRangeByScore { key, .. } => key,
        }
    }
}

/// Decoded reply to one command, the variant follows the command kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreReply {
    /// SMEMBERS and ZRANGEBYSCORE
    Members(Vec<String>),
    /// SCARD and ZREMRANGEBYSCORE
    Count(u64),
    /// HGETALL
    Hash(BTreeMap<String, String>),
    /// HGET
    Value(Option<String>),
    /// HINCRBY
    Integer(i64),
}

impl StoreReply {
    pub fn into_members(self) -> Result<Vec<String>, StoreError> {
        match self {
            StoreReply::Members(members) => Ok(members),
            other => Err(unexpected("members", &other)),
        }
    }

    pub fn into_count(self) -> Result<u64, StoreError> {
        match self {
            StoreReply::Count(count) => Ok(count),
            other => Err(unexpected("count", &other)),
        }
    }

    pub fn into_hash(self) -> Result<BTreeMap<String, String>, StoreError> {
        match self {
            StoreReply::Hash(hash) => Ok(hash),
            other => Err(unexpected("hash", &other)),
        }
    }

    pub fn into_value(self) -> Result<Option<String>, StoreError> {
        match self {
            StoreReply::Value(value) => Ok(value),
            other => Err(unexpected("value", &other)),
        }
    }
}

fn unexpected(wanted: &str, got: &StoreReply) -> StoreError {
    StoreError::UnexpectedReply(format!("expected {wanted}, got {got:?}"))
}

/// Access to one store endpoint.
///
/// `multi` queues the commands as one transaction, replies come back in
/// submission order. No other client sees a partial batch, but a command
/// that fails at run time does not undo the ones before it on redis.
/// Callers check writes that can fail before submitting them.
pub trait StoreGateway: Send + Sync {
    fn multi(
        &self,
        commands: Vec<StoreCommand>,
    ) -> impl Future<Output = Result<Vec<StoreReply>, StoreError>> + Send;

    fn smembers(&self, key: &str) -> impl Future<Output = Result<Vec<String>, StoreError>> + Send {
        let command = StoreCommand::SMembers {
            key: key.to_string(),
        };
        async move { single(self.multi(vec![command]).await?)?.into_members() }
    }

    fn hget(
        &self,
        key: &str,
        field: &str,
    ) -> impl Future<Output = Result<Option<String>, StoreError>> + Send {
        let command = StoreCommand::HGet {
            key: key.to_string(),
            field: field.to_string(),
        };
        async move { single(self.multi(vec![command]).await?)?.into_value() }
    }
}

fn single(replies: Vec<StoreReply>) -> Result<StoreReply, StoreError> {
    let mut replies = replies.into_iter();
    match (replies.next(), replies.next()) {
        (Some(reply), None) => Ok(reply),
        _ => Err(StoreError::UnexpectedReply(
            "expected exactly one reply".to_string(),
        )),
    }
}

/// Bounds every call on the wrapped store. No retries, an expired call is a
/// `StoreError::Timeout`.
#[derive(Debug, Clone)]
pub struct TimeoutStore<S> {
    inner: S,
    timeout: Duration,
}

impl<S: StoreGateway> TimeoutStore<S> {
    pub fn new(inner: S, timeout: Duration) -> Self {
        TimeoutStore { inner, timeout }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: StoreGateway> StoreGateway for TimeoutStore<S> {
    async fn multi(&self, commands: Vec<StoreCommand>) -> Result<Vec<StoreReply>, StoreError> {
        match tokio::time::timeout(self.timeout, self.inner.multi(commands)).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(self.timeout)),
        }
    }
}
