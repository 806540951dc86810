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

//! Windowed hashrate from share samples.
//!
//! The stratum side records one sorted set member per share batch, encoded as
//! `<shareCount>:<worker>` and scored with the submission time in seconds. The
//! stats pipeline reads back the members inside the window and turns them into
//! per worker totals and a hashrate estimate.

use crate::calc::parse_share_count;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Hashing algorithm of a coin, decides how many hashes one share is worth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    Scrypt,
    Sha256,
}

impl Algorithm {
    /// Expected hash attempts per unit of share difficulty
    pub fn multiplier(&self) -> u64 {
        match self {
            Algorithm::Scrypt => 1 << 16,
            Algorithm::Sha256 => 1 << 32,
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::Scrypt => write!(f, "scrypt"),
            Algorithm::Sha256 => write!(f, "sha256"),
        }
    }
}

impl FromStr for Algorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "scrypt" => Ok(Algorithm::Scrypt),
            "sha256" => Ok(Algorithm::Sha256),
            other => Err(format!("Unsupported hashing algorithm: {other}")),
        }
    }
}

/// One decoded hashrate sample
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashrateSample {
    pub shares: u64,
    pub worker: String,
}

impl HashrateSample {
    /// Parse `<shareCount>:<worker>`. The worker part may itself contain
    /// colons. A fractional share count is truncated to its integer part.
    pub fn parse(raw: &str) -> Option<Self> {
        let (count, worker) = raw.split_once(':')?;
        let shares = parse_share_count(count)?;
        Some(HashrateSample {
            shares,
            worker: worker.to_string(),
        })
    }
}

/// Per worker share totals for the samples inside the window
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowTotals {
    pub workers: BTreeMap<String, u64>,
    pub total_shares: u64,
}

impl WindowTotals {
    /// Sum raw samples per worker. Samples that do not decode are skipped.
    pub fn from_raw_samples<S: AsRef<str>>(samples: &[S]) -> Self {
        let mut totals = WindowTotals::default();
        for raw in samples {
            match HashrateSample::parse(raw.as_ref()) {
                Some(sample) => totals.add(sample),
                None => warn!("Skipping malformed hashrate sample {:?}", raw.as_ref()),
            }
        }
        totals
    }

    /// Totals saturate at `u64::MAX` rather than wrap.
    pub fn add(&mut self, sample: HashrateSample) {
        self.total_shares = match self.total_shares.checked_add(sample.shares) {
            Some(total) => total,
            None => {
                warn!(
                    "Share total overflowed adding {} shares from {}, saturating",
                    sample.shares, sample.worker
                );
                u64::MAX
            }
        };
        let worker_total = self.workers.entry(sample.worker).or_insert(0);
        *worker_total = worker_total.saturating_add(sample.shares);
    }
}

/// `floor(multiplier * total_shares / window_secs / 1000)`.
///
/// The result is in kilohashes per second. A zero window yields zero.
pub fn compute_hashrate(algorithm: Algorithm, total_shares: u64, window_secs: u64) -> u64 {
    if window_secs == 0 {
        return 0;
    }
    let hashes = algorithm.multiplier() as u128 * total_shares as u128;
    let rate = hashes / window_secs as u128 / 1000;
    rate.min(u64::MAX as u128) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multipliers() {
        assert_eq!(Algorithm::Scrypt.multiplier(), 65_536);
        assert_eq!(Algorithm::Sha256.multiplier(), 4_294_967_296);
    }

    #[test]
    fn test_algorithm_from_str() {
        assert_eq!("scrypt".parse::<Algorithm>().unwrap(), Algorithm::Scrypt);
        assert_eq!("SHA256".parse::<Algorithm>().unwrap(), Algorithm::Sha256);
        assert!("x11".parse::<Algorithm>().is_err());
    }

    #[test]
    fn test_algorithm_deserialize() {
        let algorithm: Algorithm = serde_json::from_str("\"sha256\"").unwrap();
        assert_eq!(algorithm, Algorithm::Sha256);
        assert_eq!(Algorithm::Scrypt.to_string(), "scrypt");
    }

    #[test]
    fn test_parse_sample() {
        let sample = HashrateSample::parse("16:addr.rig1").unwrap();
        assert_eq!(sample.shares, 16);
        assert_eq!(sample.worker, "addr.rig1");
    }

    #[test]
    fn test_parse_sample_keeps_colons_in_worker() {
        let sample = HashrateSample::parse("2:host:port").unwrap();
        assert_eq!(sample.worker, "host:port");
    }

    #[test]
    fn test_parse_sample_truncates_fraction() {
        assert_eq!(HashrateSample::parse("3.75:w").unwrap().shares, 3);
        assert_eq!(HashrateSample::parse("0.5:w").unwrap().shares, 0);
    }

    #[test]
    fn test_parse_sample_rejects_garbage() {
        assert!(HashrateSample::parse("no-separator").is_none());
        assert!(HashrateSample::parse("abc:w").is_none());
    }

    #[test_log::test]
    fn test_window_totals() {
        let totals = WindowTotals::from_raw_samples(&["8:w1", "4:w2", "2:w1", "bogus"]);
        assert_eq!(totals.total_shares, 14);
        assert_eq!(totals.workers.len(), 2);
        assert_eq!(totals.workers["w1"], 10);
        assert_eq!(totals.workers["w2"], 4);
    }

    #[test_log::test]
    fn test_window_totals_with_extreme_samples() {
        let totals =
            WindowTotals::from_raw_samples(&["18446744073709551615:w1", "1:w2", "5:w1"]);
        assert_eq!(totals.total_shares, u64::MAX);
        assert_eq!(totals.workers["w1"], u64::MAX);
        assert_eq!(totals.workers["w2"], 1);
        assert_eq!(
            compute_hashrate(Algorithm::Scrypt, totals.total_shares, 300),
            ((1u128 << 16) * u64::MAX as u128 / 300 / 1000) as u64
        );
    }

    #[test]
    fn test_compute_hashrate_scrypt() {
        // 65536 * 300 / 300 / 1000 = 65.536
        assert_eq!(compute_hashrate(Algorithm::Scrypt, 300, 300), 65);
    }

    #[test]
    fn test_compute_hashrate_sha256() {
        // 2^32 * 10 / 600 / 1000 = 71582.788...
        assert_eq!(compute_hashrate(Algorithm::Sha256, 10, 600), 71_582);
    }

    #[test]
    fn test_compute_hashrate_edges() {
        assert_eq!(compute_hashrate(Algorithm::Sha256, 0, 600), 0);
        assert_eq!(compute_hashrate(Algorithm::Sha256, 10, 0), 0);
        // Would overflow in u64 before dividing
        assert_eq!(
            compute_hashrate(Algorithm::Sha256, u64::MAX, 1),
            ((1u128 << 32) * u64::MAX as u128 / 1000).min(u64::MAX as u128) as u64
        );
    }
}
