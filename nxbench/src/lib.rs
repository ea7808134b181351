#![warn(missing_docs)]
//! # nxbench
//!
//! Benchmarking harness for tree-structured archive parsers.
//!
//! nxbench runs fixed, named scenarios (open/close, full tree walks, name
//! index verification, forced image decodes) for a fixed trial count against
//! any library implementing the [`TreeArchive`] interface, and reduces each
//! scenario's per-trial timings to a `(p75, trimmed mean, min)` row on the
//! results stream.
//!
//! ## Quick Start
//!
//! ```ignore
//! use nxbench::prelude::*;
//!
//! let mut harness = Harness::new(TermProgress, std::io::stdout().lock());
//! harness.write_header()?;
//! run_cases::<LazyFile, _, _>(&mut harness, &spec, &profile, RunOptions::default())?;
//! ```
//!
//! The `nxbench` binary wires this up behind one positional argument
//! selecting the library under test:
//!
//! ```text
//! nxbench renx > results.tsv
//! ```

// Re-export harness types
pub use nxbench_core::{
    ArchiveError, BenchError, CaseProfile, Frame, Harness, ImagePayload, NullProgress, OpenSpec,
    Progress, RESULT_HEADER, RunOptions, Scenario, ScenarioSet, TICK_FREQUENCY, TermProgress,
    Ticks, Timer, TreeArchive, TreeNode, Variant, decode_all, release_all, run_cases, search_all,
    visit_all,
};

// Re-export statistics
pub use nxbench_stats::{Summary, reduce, ticks_to_micros, ticks_to_micros_f64};

// Re-export the bundled reference readers
pub use nxbench_archive::{BundleBuilder, IndexedFile, LazyFile, ScannedFile};

// Re-export the CLI surface
pub use nxbench_cli::{BenchConfig, Cli, Library};

/// Run the nxbench CLI harness.
///
/// Call this from a benchmark binary's `main()`:
/// ```ignore
/// fn main() -> anyhow::Result<()> {
///     nxbench::run()
/// }
/// ```
pub use nxbench_cli::run;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        BenchError, CaseProfile, Harness, NullProgress, OpenSpec, Progress, RunOptions, Scenario,
        ScenarioSet, Summary, TermProgress, TreeArchive, TreeNode, Variant, run_cases,
    };
}
