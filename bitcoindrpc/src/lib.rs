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

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, error};

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

/// Default bound on a single daemon round trip. Calls are never retried.
const DEFAULT_RPC_TIMEOUT_MS: u64 = 10_000;

/// JSON-RPC 1.0 request structure (Bitcoin Core format)
#[derive(Serialize)]
struct JsonRpcRequest {
    method: String,
    params: Vec<serde_json::Value>,
    id: u64,
}

/// JSON-RPC 1.0 response structure (Bitcoin Core format)
/// In JSON-RPC 1.0, both result and error are always present
/// One will be the actual value, the other will be null
#[derive(Deserialize, Debug)]
struct JsonRpcResponse {
    #[serde(default)]
    result: serde_json::Value,
    error: Option<JsonRpcError>,
}

/// One element of a batch reply. Unlike single requests the id is needed to
/// line replies up with requests, and result may be missing altogether.
#[derive(Deserialize, Debug)]
struct JsonRpcBatchResponse {
    #[serde(default)]
    result: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<JsonRpcError>,
    id: Option<u64>,
}

/// JSON-RPC 1.0 error structure
#[derive(Deserialize, Debug)]
struct JsonRpcError {
    code: i32,
    message: String,
}

impl From<JsonRpcError> for BitcoindRpcError {
    fn from(error: JsonRpcError) -> Self {
        BitcoindRpcError::RpcError {
            code: error.code,
            message: error.message,
        }
    }
}

/// Decode one call's result, shared by single and batch requests
fn decode_result<T: serde::de::DeserializeOwned>(
    method: &str,
    value: serde_json::Value,
) -> Result<T, BitcoindRpcError> {
    serde_json::from_value(value).map_err(|e| BitcoindRpcError::ParseError {
        message: format!("Failed to parse {method} result: {e}"),
    })
}

#[derive(Deserialize, Clone)]
pub struct BitcoinRpcConfig {
    pub url: String,
    pub username: String,
    pub password: String,
    /// Upper bound for one request, in milliseconds
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl BitcoinRpcConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.unwrap_or(DEFAULT_RPC_TIMEOUT_MS))
    }
}

/// Custom Debug to redact passwords
impl std::fmt::Debug for BitcoinRpcConfig {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("BitcoinRpcConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

/// Error type for the BitcoindRpcClient
#[derive(Debug)]
pub enum BitcoindRpcError {
    HttpError { status_code: u16, message: String },
    ParseError { message: String },
    RpcError { code: i32, message: String },
    Timeout,
    Other(String),
}

impl Error for BitcoindRpcError {}

impl fmt::Display for BitcoindRpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BitcoindRpcError::HttpError {
                status_code,
                message,
            } => {
                write!(f, "HTTP error {status_code}: {message}")
            }
            BitcoindRpcError::ParseError { message } => {
                write!(f, "Parse error: {message}")
            }
            BitcoindRpcError::RpcError { code, message } => {
                write!(f, "RPC error {code}: {message}")
            }
            BitcoindRpcError::Timeout => write!(f, "Request to daemon timed out"),
            BitcoindRpcError::Other(msg) => write!(f, "{msg}"),
        }
    }
}

/// Category of a wallet transaction entry as reported by `gettransaction`.
/// Coinbase outputs show up as `generate`, `immature` or `orphan`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionCategory {
    Generate,
    Immature,
    Orphan,
    Send,
    Receive,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionDetail {
    pub category: TransactionCategory,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
}

/// The subset of the `gettransaction` reply used for reconciling rounds.
/// Amounts are in whole coins, as the daemon reports them.
#[derive(Debug, Clone, Deserialize)]
pub struct WalletTransaction {
    pub txid: String,
    pub amount: f64,
    #[serde(default)]
    pub confirmations: Option<i64>,
    #[serde(default)]
    pub details: Vec<TransactionDetail>,
}

impl WalletTransaction {
    /// Category of the first detail entry, None if the daemon sent no details
    pub fn category(&self) -> Option<&TransactionCategory> {
        self.details.first().map(|detail| &detail.category)
    }
}

/// Outcome of a single call inside a batch. `Ok(None)` is a null result.
pub type BatchItem<T> = Result<Option<T>, BitcoindRpcError>;

#[derive(Debug, Clone)]
pub struct BitcoindRpcClient {
    client: reqwest::Client,
    url: String,
    request_id: Arc<AtomicU64>,
}

impl BitcoindRpcClient {
    pub fn new(url: &str, username: &str, password: &str) -> Result<Self, BitcoindRpcError> {
        Self::with_timeout(
            url,
            username,
            password,
            Duration::from_millis(DEFAULT_RPC_TIMEOUT_MS),
        )
    }

    /// Build a client from config, using the configured request timeout
    pub fn from_config(config: &BitcoinRpcConfig) -> Result<Self, BitcoindRpcError> {
        Self::with_timeout(
            &config.url,
            &config.username,
            &config.password,
            config.timeout(),
        )
    }

    pub fn with_timeout(
        url: &str,
        username: &str,
        password: &str,
        timeout: Duration,
    ) -> Result<Self, BitcoindRpcError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::AUTHORIZATION,
            format!(
                "Basic {}",
                STANDARD.encode(format!("{username}:{password}"))
            )
            .parse()
            .map_err(|e| BitcoindRpcError::Other(format!("Invalid header: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| BitcoindRpcError::Other(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: url.to_string(),
            request_id: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Post a JSON body and return the successful HTTP response
    async fn post<B: Serialize + ?Sized>(
        &self,
        body: &B,
    ) -> Result<reqwest::Response, BitcoindRpcError> {
        let response = match self.client.post(&self.url).json(body).send().await {
            Ok(resp) => resp,
            Err(e) if e.is_timeout() => {
                error!("Request to daemon at {} timed out", self.url);
                return Err(BitcoindRpcError::Timeout);
            }
            Err(e) => {
                let status_code = e.status().map(|s| s.as_u16());
                error!(
                    "HTTP request failed to daemon: status={:?}, error={}",
                    status_code, e
                );
                return Err(BitcoindRpcError::Other(format!("HTTP request failed: {e}")));
            }
        };

        let status = response.status();

        // Check for non-success HTTP status codes
        if !status.is_success() {
            let status_code = status.as_u16();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            error!(
                "Error reaching daemon with status={:?}. Message={:?}",
                status_code, error_body
            );
            return Err(BitcoindRpcError::HttpError {
                status_code,
                message: error_body,
            });
        }
        Ok(response)
    }

    pub async fn request<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<serde_json::Value>,
    ) -> Result<T, BitcoindRpcError> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);

        let request = JsonRpcRequest {
            method: method.to_string(),
            params,
            id,
        };

        let rpc_response: JsonRpcResponse = self
            .post(&request)
            .await?
            .json()
            .await
            .map_err(|e| BitcoindRpcError::ParseError {
                message: format!("Failed to parse response: {e}"),
            })?;

        // JSON-RPC 1.0: check error first, then return result
        if let Some(error) = rpc_response.error {
            return Err(error.into());
        }

        decode_result(method, rpc_response.result)
    }

    /// Send several calls in one JSON-RPC batch.
    ///
    /// The outer error covers the batch as a whole (transport, HTTP status,
    /// unparsable body). Each inner item is the outcome of the call at the
    /// same position in `calls`. Calls the daemon did not answer come back as
    /// item errors rather than failing the batch.
    pub async fn batch_request<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        calls: Vec<Vec<serde_json::Value>>,
    ) -> Result<Vec<BatchItem<T>>, BitcoindRpcError> {
        if calls.is_empty() {
            return Ok(Vec::new());
        }

        let first_id = self
            .request_id
            .fetch_add(calls.len() as u64, Ordering::SeqCst);
        let requests: Vec<JsonRpcRequest> = calls
            .into_iter()
            .enumerate()
            .map(|(offset, params)| JsonRpcRequest {
                method: method.to_string(),
                params,
                id: first_id + offset as u64,
            })
            .collect();
        let expected = requests.len();
        debug!("Sending batch of {} {} calls", expected, method);

        let replies: Vec<JsonRpcBatchResponse> = self
            .post(&requests)
            .await?
            .json()
            .await
            .map_err(|e| BitcoindRpcError::ParseError {
                message: format!("Failed to parse batch response: {e}"),
            })?;

        let mut by_id: HashMap<u64, JsonRpcBatchResponse> = replies
            .into_iter()
            .filter_map(|reply| reply.id.map(|id| (id, reply)))
            .collect();

        let items = (0..expected as u64)
            .map(|offset| match by_id.remove(&(first_id + offset)) {
                None => Err(BitcoindRpcError::Other(format!(
                    "No reply for request id {}",
                    first_id + offset
                ))),
                Some(JsonRpcBatchResponse {
                    error: Some(error), ..
                }) => Err(error.into()),
                Some(JsonRpcBatchResponse { result: None, .. })
                | Some(JsonRpcBatchResponse {
                    result: Some(serde_json::Value::Null),
                    ..
                }) => Ok(None),
                Some(JsonRpcBatchResponse {
                    result: Some(value),
                    ..
                }) => decode_result(method, value).map(Some),
            })
            .collect();
        Ok(items)
    }

    /// Look up wallet transactions for a list of transaction hashes in a
    /// single batch. Items line up with `txids`.
    pub async fn get_transactions(
        &self,
        txids: &[String],
    ) -> Result<Vec<BatchItem<WalletTransaction>>, BitcoindRpcError> {
        let calls = txids
            .iter()
            .map(|txid| vec![serde_json::Value::String(txid.clone())])
            .collect();
        self.batch_request("gettransaction", calls).await
    }
}
