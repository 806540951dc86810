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

use super::ReconcileError;
use crate::store::{StoreGateway, keys};
use serde::Serialize;
use tracing::{debug, warn};

/// Where a round stands on chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundCategory {
    /// Block lost the race, shares move to the current round
    Orphan,
    /// Block reward is spendable
    Confirmed,
    /// Block found but still immature, looked at again next cycle
    Pending,
}

/// A block found by the pool, waiting in `<coin>_blocksPending`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    pub tx_hash: String,
    pub height: u64,
    /// Reward recorded by the block submitter, in base units
    pub declared_reward: u64,
    pub category: Option<RoundCategory>,
    /// Amount the daemon reports for the transaction, in whole coins
    pub daemon_amount: Option<f64>,
    /// declared_reward / daemon_amount, absent if the daemon amount is zero
    pub magnitude: Option<f64>,
}

impl Round {
    /// Decode a `<txHash>:<height>:<reward>` record
    pub fn parse(raw: &str) -> Option<Round> {
        let mut parts = raw.split(':');
        let (tx_hash, height, reward) = (parts.next()?, parts.next()?, parts.next()?);
        if parts.next().is_some() || tx_hash.is_empty() {
            return None;
        }
        Some(Round {
            tx_hash: tx_hash.to_string(),
            height: height.parse().ok()?,
            declared_reward: reward.parse().ok()?,
            category: None,
            daemon_amount: None,
            magnitude: None,
        })
    }

    /// Record the daemon's view of the round
    pub fn classify(mut self, category: RoundCategory, daemon_amount: f64) -> Round {
        self.category = Some(category);
        self.daemon_amount = Some(daemon_amount);
        self.magnitude =
            (daemon_amount != 0.0).then(|| self.declared_reward as f64 / daemon_amount);
        self
    }
}

/// Read and decode the pending rounds of `coin`, ordered by height.
///
/// An empty set, or one with only malformed records, is `NoWork`.
pub async fn collect_pending_rounds<S: StoreGateway>(
    store: &S,
    coin: &str,
) -> Result<Vec<Round>, ReconcileError> {
    let records = store.smembers(&keys::blocks_pending(coin)).await?;
    if records.is_empty() {
        return Err(ReconcileError::NoWork("no pending rounds".to_string()));
    }

    let mut rounds: Vec<Round> = records
        .iter()
        .filter_map(|record| {
            let round = Round::parse(record);
            if round.is_none() {
                warn!("{coin}: skipping malformed pending block record {record:?}");
            }
            round
        })
        .collect();
    if rounds.is_empty() {
        return Err(ReconcileError::NoWork(
            "no well formed pending rounds".to_string(),
        ));
    }
    rounds.sort_by(|a, b| a.height.cmp(&b.height).then(a.tx_hash.cmp(&b.tx_hash)));
    debug!("{coin}: {} pending rounds", rounds.len());
    Ok(rounds)
}
