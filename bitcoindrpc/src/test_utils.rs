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

use crate::BitcoinRpcConfig;
use base64::Engine;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

pub async fn setup_mock_bitcoin_rpc() -> (MockServer, BitcoinRpcConfig) {
    let mock_server = MockServer::start().await;

    // Create test config
    let config = BitcoinRpcConfig {
        url: mock_server.uri(),
        username: "testuser".to_string(),
        password: "testpass".to_string(),
        timeout_ms: Some(2_000),
    };

    (mock_server, config)
}

/// Build one `gettransaction` reply entry for a batch response
pub fn gettransaction_reply(id: u64, txid: &str, amount: f64, category: &str) -> serde_json::Value {
    serde_json::json!({
        "result": {
            "txid": txid,
            "amount": amount,
            "confirmations": 1,
            "details": [{"category": category, "amount": amount}]
        },
        "error": null,
        "id": id
    })
}

/// Build a batch reply entry carrying an RPC error, as the daemon does for
/// unknown transaction ids
pub fn gettransaction_error_reply(id: u64) -> serde_json::Value {
    serde_json::json!({
        "result": null,
        "error": {"code": -5, "message": "Invalid or non-wallet transaction id"},
        "id": id
    })
}

/// Mount a batch response for any authenticated POST to the mock daemon
pub async fn mock_batch_response(mock_server: &MockServer, replies: Vec<serde_json::Value>) {
    let auth_header = format!(
        "Basic {}",
        base64::engine::general_purpose::STANDARD.encode(format!("{}:{}", "testuser", "testpass"))
    );

    Mock::given(method("POST"))
        .and(path("/"))
        .and(header("Authorization", auth_header))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::Value::Array(replies)))
        .mount(mock_server)
        .await;
}

/// Mount a failing daemon that answers every call with the given HTTP status
pub async fn mock_daemon_failure(mock_server: &MockServer, status: u16) {
    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(status).set_body_string("daemon unavailable"))
        .mount(mock_server)
        .await;
}

/// Wallet that answers `gettransaction` batches from a fixed list of
/// `(txid, amount, category)` entries. Request ids are echoed back, so the
/// same mock serves any number of batches. Unknown txids get an RPC error.
pub struct MockWallet {
    transactions: Vec<(String, f64, String)>,
}

impl Respond for MockWallet {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let Ok(calls) = serde_json::from_slice::<Vec<serde_json::Value>>(&request.body) else {
            return ResponseTemplate::new(400);
        };
        let replies: Vec<serde_json::Value> = calls
            .iter()
            .map(|call| {
                let id = call["id"].as_u64().unwrap_or_default();
                let txid = call["params"][0].as_str().unwrap_or_default();
                match self.transactions.iter().find(|(known, _, _)| known == txid) {
                    Some((_, amount, category)) => {
                        gettransaction_reply(id, txid, *amount, category)
                    }
                    None => gettransaction_error_reply(id),
                }
            })
            .collect();
        ResponseTemplate::new(200).set_body_json(serde_json::Value::Array(replies))
    }
}

/// Mount a [`MockWallet`] on the mock daemon
pub async fn mock_wallet(mock_server: &MockServer, transactions: &[(&str, f64, &str)]) {
    let wallet = MockWallet {
        transactions: transactions
            .iter()
            .map(|(txid, amount, category)| (txid.to_string(), *amount, category.to_string()))
            .collect(),
    };
    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(wallet)
        .mount(mock_server)
        .await;
}
