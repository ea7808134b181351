//! Monotonic Tick Timing
//!
//! Timed operations bracket their own measured region with a `Timer`, so
//! per-scenario setup and teardown stay outside the recorded duration.

use nxbench_stats::Ticks;
use std::time::Instant;

/// Ticks per second of the harness clock. One tick is one nanosecond of
/// `std::time::Instant`.
pub const TICK_FREQUENCY: i64 = 1_000_000_000;

/// Timer for a single self-timed trial.
#[derive(Debug, Clone, Copy)]
pub struct Timer {
    start: Instant,
}

impl Timer {
    /// Start a new timer.
    #[inline(always)]
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Ticks elapsed since `start`.
    #[inline(always)]
    pub fn elapsed_ticks(&self) -> Ticks {
        self.start.elapsed().as_nanos() as Ticks
    }
}
