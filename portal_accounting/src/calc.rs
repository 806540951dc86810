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

//! Fixed point helpers for fee and proportional reward calculation.
//!
//! Fees arrive from config as a fraction. They are converted once to parts
//! per million so the rest of the arithmetic is integer only, with u128
//! intermediates to avoid overflow on large rewards.

/// One whole, in parts per million
pub const PPM: u64 = 1_000_000;

/// Convert a fee fraction into parts per million.
/// Non finite fees are treated as zero, the result is clamped to [0, PPM].
pub fn fee_to_ppm(fee: f64) -> u64 {
    if !fee.is_finite() {
        return 0;
    }
    (fee.clamp(0.0, 1.0) * PPM as f64).round() as u64
}

/// Reward left for workers after the pool fee: `reward * (1 - fee)`, floored.
pub fn net_reward(declared_reward: u64, fee_ppm: u64) -> u64 {
    let keep_ppm = PPM.saturating_sub(fee_ppm) as u128;
    let net = declared_reward as u128 * keep_ppm / PPM as u128;
    net.min(u64::MAX as u128) as u64
}

/// `floor(net_reward * shares / total_shares)`, zero when there are no shares.
///
/// The total is a u128 so summing full range u64 share counts cannot wrap.
pub fn proportional_reward(net_reward: u64, shares: u64, total_shares: u128) -> u64 {
    if total_shares == 0 {
        return 0;
    }
    let reward = net_reward as u128 * shares as u128 / total_shares;
    reward.min(u64::MAX as u128) as u64
}

/// Share counts are written as decimal strings, possibly with a fractional
/// part. Only the integer part counts.
pub fn parse_share_count(raw: &str) -> Option<u64> {
    let integer_part = raw.trim().split('.').next().unwrap_or_default();
    integer_part.parse::<u64>().ok()
}
