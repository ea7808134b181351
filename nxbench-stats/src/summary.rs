//! Summary Triple Computation
//!
//! The reducer is a pure function over an ascending-sorted trial set. The
//! caller sorts once after the trial loop; nothing here mutates or copies
//! the samples.

use crate::{MICROS_PER_SECOND, Ticks};

/// Summary statistics for one completed scenario, in microseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    /// 75th percentile, truncated to whole microseconds.
    pub p75: i64,
    /// Mean of the middle half of the samples (lowest and highest quarters
    /// discarded), kept at full precision.
    pub trimmed_mean: f64,
    /// Fastest trial, truncated to whole microseconds.
    pub min: i64,
}

/// Convert a tick count to whole microseconds, truncating.
///
/// The multiply is widened to i128 so that long-running trials cannot
/// overflow before the division.
#[inline]
pub fn ticks_to_micros(ticks: Ticks, tick_frequency: i64) -> i64 {
    (ticks as i128 * MICROS_PER_SECOND as i128 / tick_frequency as i128) as i64
}

/// Convert a real-valued tick count to microseconds at full precision.
#[inline]
pub fn ticks_to_micros_f64(ticks: f64, tick_frequency: i64) -> f64 {
    ticks * MICROS_PER_SECOND as f64 / tick_frequency as f64
}

/// Reduce an ascending-sorted, non-empty trial set to its summary triple.
///
/// `sorted` must already be in ascending order; the trial runners sort
/// exactly once before calling this. Index arithmetic uses truncating
/// division, so a single sample yields p75 == trimmed mean == min.
///
/// # Panics
/// Panics if `sorted` is empty. An empty trial set means the scenario never
/// ran, and there is no meaningful triple to report.
pub fn reduce(sorted: &[Ticks], tick_frequency: i64) -> Summary {
    assert!(!sorted.is_empty(), "cannot reduce an empty trial set");
    debug_assert!(
        sorted.windows(2).all(|w| w[0] <= w[1]),
        "trial set must be sorted ascending"
    );

    let n = sorted.len();
    let p75 = sorted[n * 3 / 4];
    let min = sorted[0];

    // Middle half, inclusive of both quartile indexes.
    let window = &sorted[n / 4..=n * 3 / 4];
    let mean_ticks = window.iter().map(|&t| t as f64).sum::<f64>() / window.len() as f64;

    Summary {
        p75: ticks_to_micros(p75, tick_frequency),
        trimmed_mean: ticks_to_micros_f64(mean_ticks, tick_frequency),
        min: ticks_to_micros(min, tick_frequency),
    }
}
