//! Live Progress Reporting
//!
//! Each scenario pins one terminal line and overwrites it in place as trials
//! complete. The anchor returned by `pin` is an explicit value handed back
//! to every `update`; there is no shared cursor state. Line-overwrite
//! mechanics are delegated to `indicatif`, which owns the terminal.

use crate::Scenario;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// One progress frame: the state shown after a trial or batch completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Scenario being run.
    pub label: Scenario,
    /// Trials completed so far.
    pub current: u32,
    /// Total trials requested.
    pub total: u32,
    /// Duration of the latest trial in microseconds; `None` in coarse
    /// (stepped) frames.
    pub current_us: Option<i64>,
    /// Best duration seen so far in microseconds; `None` until known.
    pub best_us: Option<i64>,
}

impl Frame {
    /// Render the status line: label, counters, current and best durations.
    pub fn render(&self) -> String {
        let current = match self.current_us {
            Some(us) => us.to_string(),
            None => "N/A".to_string(),
        };
        let best = match self.best_us {
            Some(us) => us.to_string(),
            None => "N/A".to_string(),
        };
        format!(
            "{:>2}: {:>4}/{:<4}; C{:>8} B{:>8}",
            self.label, self.current, self.total, current, best
        )
    }
}

/// Receiver for live progress frames.
pub trait Progress {
    /// Anchor identifying one scenario's pinned line.
    type Anchor;

    /// Capture a fresh anchor before a scenario's trials begin.
    fn pin(&mut self) -> Self::Anchor;

    /// Overwrite the anchored line with `frame`.
    fn update(&mut self, anchor: &Self::Anchor, frame: &Frame);
}

/// Terminal progress on the diagnostic stream.
///
/// Completed scenarios leave their final line in place; the next scenario
/// pins a new line below it.
#[derive(Debug, Default)]
pub struct TermProgress;

/// A pinned terminal line.
pub struct TermAnchor {
    line: ProgressBar,
}

impl Progress for TermProgress {
    type Anchor = TermAnchor;

    fn pin(&mut self) -> TermAnchor {
        let line = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
        line.set_style(
            ProgressStyle::default_spinner()
                .template("{msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        TermAnchor { line }
    }

    fn update(&mut self, anchor: &TermAnchor, frame: &Frame) {
        anchor.line.set_message(frame.render());
    }
}

impl Drop for TermAnchor {
    fn drop(&mut self) {
        self.line.abandon();
    }
}

/// Progress sink that discards every frame (quiet mode, redirected output).
#[derive(Debug, Default)]
pub struct NullProgress;

impl Progress for NullProgress {
    type Anchor = ();

    fn pin(&mut self) {}

    fn update(&mut self, _anchor: &(), _frame: &Frame) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_full_frame() {
        let frame = Frame {
            label: Scenario::Load,
            current: 12,
            total: 4096,
            current_us: Some(1234),
            best_us: Some(987),
        };
        assert_eq!(frame.render(), "Ld:   12/4096; C    1234 B     987");
    }

    #[test]
    fn test_render_coarse_frame() {
        let frame = Frame {
            label: Scenario::SearchAll,
            current: 64,
            total: 64,
            current_us: None,
            best_us: None,
        };
        assert_eq!(frame.render(), "SA:   64/64  ; C     N/A B     N/A");
    }
}
