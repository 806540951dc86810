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

use super::shares::RoundTallies;
use portal_accounting::rewards::{RewardLedger, split_round_reward};
use tracing::debug;

/// Split confirmed and pending rounds among their workers. Orphaned rounds
/// never earn anything.
pub fn allocate_rewards(coin: &str, tallies: &RoundTallies, fee_ppm: u64) -> RewardLedger {
    let mut ledger = RewardLedger::default();
    for (round, tally) in &tallies.confirmed {
        match split_round_reward(round.declared_reward, fee_ppm, tally) {
            Some(split) => ledger.add_confirmed(&split),
            None => debug!("{coin}: confirmed round {} has no shares", round.height),
        }
    }
    for (round, tally) in &tallies.pending {
        match split_round_reward(round.declared_reward, fee_ppm, tally) {
            Some(split) => ledger.add_pending(&split),
            None => debug!("{coin}: pending round {} has no shares", round.height),
        }
    }
    ledger
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::rounds::{Round, RoundCategory};
    use portal_accounting::ShareTally;
    use portal_accounting::calc::fee_to_ppm;

    fn entry(raw: &str, category: RoundCategory, shares: &[(&str, u64)]) -> (Round, ShareTally) {
        let round = Round::parse(raw).unwrap().classify(category, 50.0);
        let tally = shares.iter().map(|(w, s)| (w.to_string(), *s)).collect();
        (round, tally)
    }

    #[test]
    fn test_orphans_earn_nothing() {
        let tallies = RoundTallies {
            orphaned: vec![entry("a:1:1000", RoundCategory::Orphan, &[("w1", 10)])],
            confirmed: vec![entry("b:2:1000", RoundCategory::Confirmed, &[("w2", 10)])],
            pending: vec![],
        };
        let ledger = allocate_rewards("litecoin", &tallies, 0);
        assert!(!ledger.rewards.contains_key("w1"));
        assert!(!ledger.pending_rewards.contains_key("w1"));
        assert_eq!(ledger.rewards["w2"], 1000);
    }

    #[test]
    fn test_confirmed_and_pending_kept_apart() {
        let tallies = RoundTallies {
            orphaned: vec![],
            confirmed: vec![entry(
                "abc:100:5000000000",
                RoundCategory::Confirmed,
                &[("w1", 70), ("w2", 30)],
            )],
            pending: vec![entry(
                "def:101:5000000000",
                RoundCategory::Pending,
                &[("w1", 1)],
            )],
        };
        let ledger = allocate_rewards("litecoin", &tallies, fee_to_ppm(0.01));
        assert_eq!(ledger.rewards["w1"], 3_465_000_000);
        assert_eq!(ledger.rewards["w2"], 1_485_000_000);
        assert_eq!(ledger.pending_rewards["w1"], 4_950_000_000);
        assert!(!ledger.pending_rewards.contains_key("w2"));
        assert_eq!(ledger.pool_margin(), 0);
    }

    #[test]
    fn test_round_without_shares_is_skipped() {
        let tallies = RoundTallies {
            confirmed: vec![entry("b:2:1000", RoundCategory::Confirmed, &[])],
            ..Default::default()
        };
        let ledger = allocate_rewards("litecoin", &tallies, 0);
        assert!(ledger.rewards.is_empty());
        assert_eq!(ledger.confirmed_net_total, 0);
    }
}
