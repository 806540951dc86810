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
use super::rounds::{Round, RoundCategory};
use bitcoindrpc::{BatchItem, BitcoindRpcClient, TransactionCategory, WalletTransaction};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Rounds the daemon could place this cycle. Anything else stays pending in
/// the store and is looked at again next cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifiedRounds {
    pub orphaned: Vec<Round>,
    pub confirmed: Vec<Round>,
    pub pending: Vec<Round>,
}

impl ClassifiedRounds {
    pub fn is_empty(&self) -> bool {
        self.orphaned.is_empty() && self.confirmed.is_empty() && self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.orphaned.len() + self.confirmed.len() + self.pending.len()
    }

    /// Orphaned, then confirmed, then pending
    pub fn iter(&self) -> impl Iterator<Item = &Round> {
        self.orphaned
            .iter()
            .chain(self.confirmed.iter())
            .chain(self.pending.iter())
    }
}

fn round_category(category: &TransactionCategory) -> Option<RoundCategory> {
    match category {
        TransactionCategory::Orphan => Some(RoundCategory::Orphan),
        TransactionCategory::Generate => Some(RoundCategory::Confirmed),
        TransactionCategory::Immature => Some(RoundCategory::Pending),
        _ => None,
    }
}

/// Look up every round's transaction in one batch and sort the rounds by
/// what the daemon says about them.
pub async fn classify_rounds(
    daemon: &BitcoindRpcClient,
    coin: &str,
    rounds: Vec<Round>,
) -> Result<ClassifiedRounds, ReconcileError> {
    let txids: Vec<String> = rounds.iter().map(|round| round.tx_hash.clone()).collect();
    let replies = daemon.get_transactions(&txids).await?;
    let classified = classify_replies(coin, rounds, replies);
    if classified.is_empty() {
        return Err(ReconcileError::NoWork("no resolvable rounds".to_string()));
    }
    debug!(
        "{coin}: {} orphaned, {} confirmed, {} pending rounds",
        classified.orphaned.len(),
        classified.confirmed.len(),
        classified.pending.len()
    );
    Ok(classified)
}

/// Pair batch replies with rounds by the reply's txid
pub(crate) fn classify_replies(
    coin: &str,
    rounds: Vec<Round>,
    replies: Vec<BatchItem<WalletTransaction>>,
) -> ClassifiedRounds {
    let mut transactions: HashMap<String, WalletTransaction> = HashMap::new();
    for reply in replies {
        match reply {
            Ok(Some(transaction)) => {
                transactions.insert(transaction.txid.clone(), transaction);
            }
            Ok(None) => warn!("{coin}: daemon returned no result for a transaction"),
            Err(e) => warn!("{coin}: error requesting transaction from daemon: {e}"),
        }
    }

    let mut classified = ClassifiedRounds::default();
    for round in rounds {
        let Some(transaction) = transactions.get(&round.tx_hash) else {
            warn!(
                "{coin}: daemon did not return transaction {} for round {}",
                round.tx_hash, round.height
            );
            continue;
        };
        let Some(category) = transaction.category().and_then(round_category) else {
            debug!(
                "{coin}: round {} has unresolved category {:?}",
                round.height,
                transaction.category()
            );
            continue;
        };
        let round = round.classify(category, transaction.amount);
        match category {
            RoundCategory::Orphan => classified.orphaned.push(round),
            RoundCategory::Confirmed => classified.confirmed.push(round),
            RoundCategory::Pending => classified.pending.push(round),
        }
    }
    classified
}
