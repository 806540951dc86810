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

use super::{StoreCommand, StoreError, StoreGateway, StoreReply};
use crate::config::StoreEndpoint;
use redis::aio::MultiplexedConnection;
use redis::{FromRedisValue, Pipeline, Value};
use std::collections::BTreeMap;
use std::fmt;
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Store gateway backed by a redis server.
///
/// One multiplexed connection per endpoint, opened on first use and shared by
/// every coin of the group.
pub struct RedisStore {
    endpoint: StoreEndpoint,
    client: redis::Client,
    connection: OnceCell<MultiplexedConnection>,
}

impl fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisStore")
            .field("endpoint", &self.endpoint)
            .field("connected", &self.connection.initialized())
            .finish()
    }
}

impl RedisStore {
    pub fn new(endpoint: &StoreEndpoint) -> Result<Self, StoreError> {
        let client = redis::Client::open(endpoint.url()).map_err(|e| StoreError::Connection {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;
        Ok(RedisStore {
            endpoint: endpoint.clone(),
            client,
            connection: OnceCell::new(),
        })
    }

    pub fn endpoint(&self) -> &StoreEndpoint {
        &self.endpoint
    }

    async fn connection(&self) -> Result<MultiplexedConnection, StoreError> {
        let connection = self
            .connection
            .get_or_try_init(|| async {
                let connection = self
                    .client
                    .get_multiplexed_async_connection()
                    .await
                    .map_err(|e| StoreError::Connection {
                        endpoint: self.endpoint.to_string(),
                        reason: e.to_string(),
                    })?;
                info!("Connected to store at {}", self.endpoint);
                Ok::<_, StoreError>(connection)
            })
            .await?;
        Ok(connection.clone())
    }
}

impl StoreGateway for RedisStore {
    async fn multi(&self, commands: Vec<StoreCommand>) -> Result<Vec<StoreReply>, StoreError> {
        if commands.is_empty() {
            return Ok(Vec::new());
        }
        let pipeline = build_pipeline(&commands);
        let mut connection = self.connection().await?;
        debug!(
            "Sending {} commands to store at {}",
            commands.len(),
            self.endpoint
        );
        let values: Vec<Value> = pipeline
            .query_async(&mut connection)
            .await
            .map_err(|e| StoreError::Command(e.to_string()))?;
        if values.len() != commands.len() {
            return Err(StoreError::UnexpectedReply(format!(
                "sent {} commands, got {} replies",
                commands.len(),
                values.len()
            )));
        }
        commands
            .iter()
            .zip(values.iter())
            .map(|(command, value)| decode_reply(command, value))
            .collect()
    }
}

/// MULTI/EXEC pipeline with one entry per command
fn build_pipeline(commands: &[StoreCommand]) -> Pipeline {
    let mut pipeline = redis::pipe();
    pipeline.atomic();
    for command in commands {
        match command {
            StoreCommand::SMembers { key } => {
                pipeline.cmd("SMEMBERS").arg(key);
            }
            StoreCommand::SCard { key } => {
                pipeline.cmd("SCARD").arg(key);
            }
            StoreCommand::HGetAll { key } => {
                pipeline.cmd("HGETALL").arg(key);
            }
            StoreCommand::HGet { key, field } => {
                pipeline.cmd("HGET").arg(key).arg(field);
            }
            StoreCommand::HIncrBy { key, field, delta } => {
                pipeline.cmd("HINCRBY").arg(key).arg(field).arg(*delta);
            }
            StoreCommand::ZRemRangeByScore { key, min, max } => {
                pipeline
                    .cmd("ZREMRANGEBYSCORE")
                    .arg(key)
                    .arg(min.to_arg())
                    .arg(max.to_arg());
            }
            StoreCommand::ZRangeByScore { key, min, max } => {
                pipeline
                    .cmd("ZRANGEBYSCORE")
                    .arg(key)
                    .arg(min.to_arg())
                    .arg(max.to_arg());
            }
        }
    }
    pipeline
}

fn decode_reply(command: &StoreCommand, value: &Value) -> Result<StoreReply, StoreError> {
    let reply = match command {
        StoreCommand::SMembers { .. } | StoreCommand::ZRangeByScore { .. } => {
            StoreReply::Members(decode(command, value)?)
        }
        StoreCommand::SCard { .. } | StoreCommand::ZRemRangeByScore { .. } => {
            StoreReply::Count(decode(command, value)?)
        }
        StoreCommand::HGetAll { .. } => {
            StoreReply::Hash(decode::<BTreeMap<String, String>>(command, value)?)
        }
        StoreCommand::HGet { .. } => StoreReply::Value(decode(command, value)?),
        StoreCommand::HIncrBy { .. } => StoreReply::Integer(decode(command, value)?),
    };
    Ok(reply)
}

fn decode<T: FromRedisValue>(command: &StoreCommand, value: &Value) -> Result<T, StoreError> {
    redis::from_redis_value(value).map_err(|e| {
        StoreError::UnexpectedReply(format!("{} on key {}: {e}", kind(command), command.key()))
    })
}

fn kind(command: &StoreCommand) -> &'static str {
    match command {
        StoreCommand::SMembers { .. } => "SMEMBERS",
        StoreCommand::SCard { .. } => "SCARD",
        StoreCommand::HGetAll { .. } => "HGETALL",
        StoreCommand::HGet { .. } => "HGET",
        StoreCommand::HIncrBy { .. } => "HINCRBY",
        StoreCommand::ZRemRangeByScore { .. } => "ZREMRANGEBYSCORE",
        StoreCommand::ZRangeByScore { .. } => "ZRANGEBYSCORE",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ScoreBound;

    #[test]
    fn test_pipeline_is_atomic() {
        let commands = vec![
            StoreCommand::ZRemRangeByScore {
                key: "litecoin_hashrate".into(),
                min: ScoreBound::NegInf,
                max: ScoreBound::Exclusive(1000),
            },
            StoreCommand::SCard {
                key: "litecoin_blocksPending".into(),
            },
        ];
        let packed = String::from_utf8_lossy(&build_pipeline(&commands).get_packed_pipeline())
            .into_owned();

        assert!(packed.contains("MULTI"));
        assert!(packed.contains("EXEC"));
        assert!(packed.contains("ZREMRANGEBYSCORE"));
        assert!(packed.contains("(1000"));
        assert!(packed.contains("-inf"));
        assert!(packed.contains("SCARD"));
    }

    #[test]
    fn test_decode_replies() {
        let command = StoreCommand::HGetAll {
            key: "litecoin_shares:round100".into(),
        };
        let value = Value::Array(vec![
            Value::BulkString(b"w1".to_vec()),
            Value::BulkString(b"70".to_vec()),
        ]);
        let reply = decode_reply(&command, &value).unwrap();
        assert_eq!(reply.into_hash().unwrap()["w1"], "70");

        let command = StoreCommand::HGet {
            key: "litecoin_balances".into(),
            field: "addr".into(),
        };
        assert_eq!(
            decode_reply(&command, &Value::Nil).unwrap(),
            StoreReply::Value(None)
        );

        let command = StoreCommand::SCard {
            key: "litecoin_blocksPending".into(),
        };
        assert_eq!(
            decode_reply(&command, &Value::Int(3)).unwrap(),
            StoreReply::Count(3)
        );
    }

    #[test]
    fn test_decode_rejects_wrong_shape() {
        let command = StoreCommand::SCard {
            key: "litecoin_blocksPending".into(),
        };
        let value = Value::BulkString(b"not-a-number".to_vec());
        assert!(matches!(
            decode_reply(&command, &value),
            Err(StoreError::UnexpectedReply(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_connection_error() {
        let store = RedisStore::new(&StoreEndpoint::new("127.0.0.1", 1)).unwrap();
        let result = store.smembers("litecoin_blocksPending").await;
        assert!(matches!(result, Err(StoreError::Connection { .. })));
    }
}
