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

use crate::calc::{net_reward, proportional_reward};
use crate::{RewardSplit, ShareTally};
use serde::{Deserialize, Serialize};

/// Split of one round's reward among the workers who contributed shares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundSplit {
    /// Reward after fee, the amount available to workers
    pub net_reward: u64,
    /// Total shares in the round's tally, wide enough to never wrap
    pub total_shares: u128,
    /// Floored reward per worker
    pub split: RewardSplit,
}

impl RoundSplit {
    /// Sum of all worker rewards. Never more than `net_reward`.
    pub fn paid(&self) -> u64 {
        self.split
            .values()
            .fold(0u64, |acc, amount| acc.saturating_add(*amount))
    }

    /// What flooring left behind. Kept by the pool, never redistributed.
    pub fn remainder(&self) -> u64 {
        self.net_reward.saturating_sub(self.paid())
    }
}

/// Split a round's declared reward proportionally to shares.
///
/// Returns None when the tally has no shares, there is nothing to split.
pub fn split_round_reward(
    declared_reward: u64,
    fee_ppm: u64,
    tally: &ShareTally,
) -> Option<RoundSplit> {
    let total_shares: u128 = tally.values().map(|shares| *shares as u128).sum();
    if total_shares == 0 {
        return None;
    }
    let net_reward = net_reward(declared_reward, fee_ppm);
    let split = tally
        .iter()
        .map(|(worker, shares)| {
            (
                worker.clone(),
                proportional_reward(net_reward, *shares, total_shares),
            )
        })
        .collect();
    Some(RoundSplit {
        net_reward,
        total_shares,
        split,
    })
}

/// Accumulates round splits for one coin in one cycle.
///
/// Confirmed and pending rewards live in separate maps. A worker earning in
/// both shows up in both, the two are never added together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardLedger {
    /// Rewards from confirmed rounds
    pub rewards: RewardSplit,
    /// Rewards from rounds still awaiting confirmations
    pub pending_rewards: RewardSplit,
    /// Sum of net rewards over confirmed rounds that had shares
    pub confirmed_net_total: u64,
    /// Sum of worker rewards over confirmed rounds
    pub confirmed_paid_total: u64,
}

impl RewardLedger {
    pub fn add_confirmed(&mut self, round: &RoundSplit) {
        accumulate(&mut self.rewards, &round.split);
        self.confirmed_net_total = self.confirmed_net_total.saturating_add(round.net_reward);
        self.confirmed_paid_total = self.confirmed_paid_total.saturating_add(round.paid());
    }

    pub fn add_pending(&mut self, round: &RoundSplit) {
        accumulate(&mut self.pending_rewards, &round.split);
    }

    /// Rounding margin the pool keeps from confirmed rounds, on top of the fee
    pub fn pool_margin(&self) -> u64 {
        self.confirmed_net_total.saturating_sub(self.confirmed_paid_total)
    }
}

fn accumulate(into: &mut RewardSplit, split: &RewardSplit) {
    for (worker, amount) in split {
        let entry = into.entry(worker.clone()).or_insert(0);
        *entry = entry.saturating_add(*amount);
    }
}
