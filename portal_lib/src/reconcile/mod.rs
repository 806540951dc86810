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

//! Per coin reward reconciliation.
//!
//! Stages run in order for one coin: collect pending rounds from the store,
//! classify them with the daemon, fetch round tallies and merge orphaned
//! shares forward, split rewards, then read the queried address's balance.

pub mod allocate;
pub mod balance;
pub mod classify;
pub mod miner_stats;
pub mod rounds;
pub mod shares;

use crate::store::StoreError;
use bitcoindrpc::BitcoindRpcError;

pub use miner_stats::{CoinMinerStats, MinerStatsOutcome, MinerStatsReport, reconcile_coin};
pub use rounds::{Round, RoundCategory};

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// Nothing to reconcile this cycle, not a failure
    #[error("Nothing to do: {0}")]
    NoWork(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Daemon RPC failed: {0}")]
    Daemon(#[from] BitcoindRpcError),
}

impl ReconcileError {
    pub fn is_no_work(&self) -> bool {
        matches!(self, ReconcileError::NoWork(_))
    }
}
