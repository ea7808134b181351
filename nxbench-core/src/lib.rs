#![warn(missing_docs)]
//! nxbench Core - Harness Runtime
//!
//! This crate provides the execution environment for archive benchmarks:
//! - `Harness` for per-trial and stepped (batched) trial loops
//! - Monotonic tick timing (`Timer`)
//! - The `Progress` trait with a pinned-line terminal implementation
//! - The tab-separated results stream (`ResultWriter`)
//! - The collaborator interface archive libraries implement (`TreeArchive`)
//! - The five benchmark cases, generic over any collaborator

mod archive;
mod cases;
mod measure;
mod progress;
mod report;
mod runner;

pub use archive::{ArchiveError, ImagePayload, TreeArchive, TreeNode, Variant};
pub use cases::{
    CaseProfile, OpenSpec, RunOptions, decode_all, release_all, run_cases, search_all, visit_all,
};
pub use measure::{TICK_FREQUENCY, Timer};
pub use nxbench_stats::{Summary, Ticks};
pub use progress::{Frame, NullProgress, Progress, TermProgress};
pub use report::{RESULT_HEADER, ResultWriter};
pub use runner::{BenchError, Harness};

use std::fmt;
use std::str::FromStr;

/// A benchmark scenario label.
///
/// The display codes (`Ld`, `Re`, `LR`, `SA`, `De`) appear in both the live
/// progress line and the results stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scenario {
    /// Open a file handle, then close it.
    Load,
    /// Walk the full node tree of an already-open file.
    Recurse,
    /// Open, walk the full tree, close, all timed.
    LoadRecurse,
    /// Walk the tree verifying every child resolves through its parent's
    /// name index to the identical node.
    SearchAll,
    /// Walk the tree forcing the lazy decode of every image-bearing leaf.
    Decompress,
}

impl Scenario {
    /// Every scenario, in execution order.
    pub const ALL: [Scenario; 5] = [
        Scenario::Load,
        Scenario::Recurse,
        Scenario::LoadRecurse,
        Scenario::SearchAll,
        Scenario::Decompress,
    ];

    /// Two-letter display code.
    pub const fn code(self) -> &'static str {
        match self {
            Scenario::Load => "Ld",
            Scenario::Recurse => "Re",
            Scenario::LoadRecurse => "LR",
            Scenario::SearchAll => "SA",
            Scenario::Decompress => "De",
        }
    }

    /// Selection flag bit for this scenario.
    pub const fn bit(self) -> u8 {
        match self {
            Scenario::Load => 0x1,
            Scenario::LoadRecurse => 0x2,
            Scenario::Recurse => 0x4,
            Scenario::SearchAll => 0x8,
            Scenario::Decompress => 0x10,
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Scenario {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ld" | "load" => Ok(Scenario::Load),
            "re" | "recurse" => Ok(Scenario::Recurse),
            "lr" | "loadrecurse" => Ok(Scenario::LoadRecurse),
            "sa" | "searchall" => Ok(Scenario::SearchAll),
            "de" | "decompress" => Ok(Scenario::Decompress),
            other => Err(format!("unknown scenario '{other}'")),
        }
    }
}

/// A set of scenarios, used only for selecting which cases to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScenarioSet(u8);

impl ScenarioSet {
    /// The empty set.
    pub const EMPTY: ScenarioSet = ScenarioSet(0);

    /// All five scenarios.
    pub const ALL: ScenarioSet = ScenarioSet(0x1F);

    /// Add a scenario to the set.
    pub fn insert(&mut self, scenario: Scenario) {
        self.0 |= scenario.bit();
    }

    /// Whether the set contains `scenario`.
    pub const fn contains(self, scenario: Scenario) -> bool {
        self.0 & scenario.bit() != 0
    }

    /// Whether the set is empty.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl Default for ScenarioSet {
    fn default() -> Self {
        ScenarioSet::ALL
    }
}

impl FromIterator<Scenario> for ScenarioSet {
    fn from_iter<I: IntoIterator<Item = Scenario>>(iter: I) -> Self {
        let mut set = ScenarioSet::EMPTY;
        for scenario in iter {
            set.insert(scenario);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_roundtrip() {
        for scenario in Scenario::ALL {
            assert_eq!(scenario.code().parse::<Scenario>().unwrap(), scenario);
        }
        assert_eq!("LOAD".parse::<Scenario>().unwrap(), Scenario::Load);
        assert!("xx".parse::<Scenario>().is_err());
    }

    #[test]
    fn test_flag_bits_are_distinct() {
        let mut seen = 0u8;
        for scenario in Scenario::ALL {
            assert_eq!(seen & scenario.bit(), 0);
            seen |= scenario.bit();
        }
        assert_eq!(seen, 0x1F);
    }

    #[test]
    fn test_set_membership() {
        let set: ScenarioSet = [Scenario::Load, Scenario::SearchAll].into_iter().collect();
        assert!(set.contains(Scenario::Load));
        assert!(set.contains(Scenario::SearchAll));
        assert!(!set.contains(Scenario::Recurse));
        assert!(ScenarioSet::EMPTY.is_empty());
        assert!(!ScenarioSet::ALL.is_empty());
    }
}
