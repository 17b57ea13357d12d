//! LWMA-1 difficulty retargeting and block timestamp validation.
//!
//! Everything in here is consensus-critical: two nodes that disagree on the
//! value returned by [`DifficultyParams::next_difficulty`] or
//! [`DifficultyParams::is_timestamp_valid`] will fork. Both are pure
//! functions of the caller's sample slice and the parameter set.

use std::cmp::min;

use log::{debug, error, warn};
use serde::{Deserialize, Serialize};

use crate::{
    network::Network, DIFFICULTY_TARGET, DIFFICULTY_WINDOW, TESTNET_MIN_DIFFICULTY,
    TIMESTAMP_MAX_MULTIPLIER, TIMESTAMP_MIN_MULTIPLIER, U256,
};

/// Timestamp and difficulty of one historical block.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockSample {
    pub timestamp: u64,
    pub difficulty: u64,
}

impl BlockSample {
    pub fn new(timestamp: u64, difficulty: u64) -> Self {
        BlockSample {
            timestamp,
            difficulty,
        }
    }
}

/// Consensus parameters for the retarget. Fixed per network.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct DifficultyParams {
    /// Nominal window size `N` in blocks.
    pub window: u64,
    /// Target seconds per block `T`.
    pub target_block_time: u64,
    /// Lower clamp for a single solve time, in seconds (negative).
    pub timestamp_min: i64,
    /// Upper clamp for a single solve time, and the allowed future drift
    /// of a proposed timestamp, in seconds.
    pub timestamp_max: i64,
    /// Floor applied to every result on testnet.
    pub testnet_min_difficulty: u64,
}

impl Default for DifficultyParams {
    fn default() -> Self {
        Self::reference()
    }
}

impl DifficultyParams {
    /// The live network parameters: N = 60, T = 120, clamp [-7T, +14T].
    pub fn reference() -> Self {
        Self::from_multipliers(
            DIFFICULTY_WINDOW,
            DIFFICULTY_TARGET,
            TIMESTAMP_MIN_MULTIPLIER,
            TIMESTAMP_MAX_MULTIPLIER,
            TESTNET_MIN_DIFFICULTY,
        )
    }

    /// Builds a parameter set whose clamp bounds are `-min_multiplier * T`
    /// and `+max_multiplier * T`. Bounds saturate at the `i64` range.
    pub fn from_multipliers(
        window: u64,
        target_block_time: u64,
        min_multiplier: u64,
        max_multiplier: u64,
        testnet_min_difficulty: u64,
    ) -> Self {
        let target = i64::try_from(target_block_time).unwrap_or(i64::MAX);
        let min_mult = i64::try_from(min_multiplier).unwrap_or(i64::MAX);
        let max_mult = i64::try_from(max_multiplier).unwrap_or(i64::MAX);
        DifficultyParams {
            window,
            target_block_time,
            timestamp_min: target.saturating_mul(min_mult).saturating_neg(),
            timestamp_max: target.saturating_mul(max_mult),
            testnet_min_difficulty,
        }
    }

    /// Smallest difficulty the estimator will ever return for `network`.
    pub fn min_difficulty(&self, network: Network) -> u64 {
        if network.is_testnet() {
            self.testnet_min_difficulty.max(1)
        } else {
            1
        }
    }

    /// Number of trailing timestamps whose median a new block must exceed.
    pub fn median_window(&self) -> usize {
        usize::try_from(self.window / 2).unwrap_or(usize::MAX).max(1)
    }

    fn clamp_solvetime(&self, solvetime: i128) -> i128 {
        solvetime
            .max(self.timestamp_min as i128)
            .min(self.timestamp_max as i128)
    }

    /// Computes the difficulty the block at `height` must satisfy.
    ///
    /// `blocks` is ordered by increasing height and ends with the parent of
    /// the block being produced. Only the last `min(len - 1, N) + 1` samples
    /// are read. `height` does not enter the math.
    ///
    /// Never fails: fewer than two samples give the network floor, a zero
    /// weighted solve time is treated as one second, and the result is
    /// clamped to the floor.
    pub fn next_difficulty(&self, blocks: &[BlockSample], height: u64, network: Network) -> u64 {
        let floor = self.min_difficulty(network);
        let n = blocks.len();

        if n < 2 {
            debug!(
                "Height {}: {} sample(s) available, using {} floor {}",
                height, n, network, floor
            );
            return floor;
        }

        let window = min((n - 1) as u64, self.window) as usize;
        if window == 0 {
            warn!("Difficulty window is configured as zero, using floor {}", floor);
            return floor;
        }

        let trailing = &blocks[n - window - 1..];
        let mut weighted_solvetime: i128 = 0;
        let mut sum_weights: u128 = 0;
        let mut sum_difficulty = U256::zero();

        for (i, pair) in trailing.windows(2).enumerate() {
            // Most recent solve time carries weight `window`, the oldest 1.
            let weight = i as u128 + 1;
            let raw = pair[1].timestamp as i128 - pair[0].timestamp as i128;
            let solvetime = self.clamp_solvetime(raw);
            if solvetime != raw {
                debug!(
                    "Solve time {}s between samples {} and {} clamped to {}s",
                    raw,
                    n - window - 1 + i,
                    n - window + i,
                    solvetime
                );
            }

            weighted_solvetime += solvetime * weight as i128;
            sum_weights += weight;
            sum_difficulty = sum_difficulty.saturating_add(U256::from(pair[1].difficulty));
        }

        let mut weighted_solvetime = weighted_solvetime_as_unsigned(weighted_solvetime);
        if weighted_solvetime == 0 {
            weighted_solvetime = 1;
        }

        let target_time = U256::from(self.target_block_time).saturating_mul(U256::from(sum_weights));
        let avg_difficulty = sum_difficulty / U256::from(window);
        let next_wide =
            avg_difficulty.saturating_mul(target_time) / U256::from(weighted_solvetime);

        debug_assert!(
            next_wide <= U256::from(u64::MAX),
            "next difficulty {} does not fit in u64",
            next_wide
        );
        let mut next = if next_wide > U256::from(u64::MAX) {
            error!(
                "Height {}: next difficulty {} exceeds u64, saturating",
                height, next_wide
            );
            u64::MAX
        } else {
            next_wide.low_u64()
        };

        if network.is_testnet() && next < self.testnet_min_difficulty {
            next = self.testnet_min_difficulty;
        }
        if next < 1 {
            next = 1;
        }

        debug!(
            "Height {}: window {} avg difficulty {} weighted solve time {}s target {}s -> {}",
            height, window, avg_difficulty, weighted_solvetime, target_time, next
        );
        next
    }

    /// Median of the last [`median_window`](Self::median_window) timestamps.
    ///
    /// For an even count this is the upper of the two middle values, never
    /// their average. Returns `None` for an empty slice.
    pub fn median_timestamp(&self, recent_blocks: &[BlockSample]) -> Option<u64> {
        if recent_blocks.is_empty() {
            return None;
        }
        let count = min(recent_blocks.len(), self.median_window());
        let mut timestamps: Vec<u64> = recent_blocks[recent_blocks.len() - count..]
            .iter()
            .map(|block| block.timestamp)
            .collect();
        timestamps.sort_unstable();
        Some(timestamps[timestamps.len() / 2])
    }

    /// Checks that `proposed` is strictly after the recent median timestamp
    /// and at most `timestamp_max` seconds ahead of `now`.
    ///
    /// An empty history accepts anything.
    pub fn is_timestamp_valid(&self, proposed: u64, recent_blocks: &[BlockSample], now: u64) -> bool {
        let median = match self.median_timestamp(recent_blocks) {
            Some(median) => median,
            None => return true,
        };

        if proposed <= median {
            debug!(
                "Timestamp {} rejected: not after median {}",
                proposed, median
            );
            return false;
        }

        let latest_allowed = now as i128 + self.timestamp_max as i128;
        if proposed as i128 > latest_allowed {
            debug!(
                "Timestamp {} rejected: more than {}s ahead of {}",
                proposed, self.timestamp_max, now
            );
            return false;
        }

        true
    }
}

/// The weighted solve-time sum as a 64-bit unsigned accumulator sees it.
///
/// A net-negative sum wraps to a huge value, which drives the retarget to
/// its floor. Nodes on the live network compute it this way.
fn weighted_solvetime_as_unsigned(sum: i128) -> u64 {
    match u64::try_from(sum) {
        Ok(value) => value,
        Err(_) => {
            warn!(
                "Weighted solve time {} outside u64, wrapping to 64 bits",
                sum
            );
            sum.rem_euclid(1i128 << 64) as u64
        }
    }
}

/// Free-function form of [`DifficultyParams::next_difficulty`].
pub fn calculate_next_difficulty(
    params: &DifficultyParams,
    blocks: &[BlockSample],
    height: u64,
    network: Network,
) -> u64 {
    params.next_difficulty(blocks, height, network)
}

/// Free-function form of [`DifficultyParams::is_timestamp_valid`].
pub fn validate_timestamp(
    params: &DifficultyParams,
    proposed: u64,
    recent_blocks: &[BlockSample],
    now: u64,
) -> bool {
    params.is_timestamp_valid(proposed, recent_blocks, now)
}
