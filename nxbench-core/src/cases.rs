//! Benchmark Case Set
//!
//! The five scenarios, generic over any [`TreeArchive`] collaborator. Each
//! case is a self-timed operation handed to the harness; scenarios that
//! reuse one handle across trials open it in `prepare` and drop it in
//! `postpare`, so open/close cost stays out of their timed region.

use crate::archive::{ArchiveError, ImagePayload, TreeArchive, TreeNode, Variant};
use crate::measure::Timer;
use crate::progress::Progress;
use crate::runner::{BenchError, Harness};
use crate::{Scenario, ScenarioSet};
use nxbench_stats::Summary;
use std::hint::black_box;
use std::io::Write;
use std::path::PathBuf;

/// Which archive a case set opens, and how.
#[derive(Debug, Clone)]
pub struct OpenSpec {
    /// Path to the archive file.
    pub path: PathBuf,
    /// Variant passed to every open.
    pub variant: Variant,
}

/// Trial counts for one library's case set.
#[derive(Debug, Clone, Copy)]
pub struct CaseProfile {
    /// Trials for Load.
    pub load_trials: u32,
    /// Batch size for Load's stepped progress.
    pub load_step: u32,
    /// Trials for Recurse.
    pub recurse_trials: u32,
    /// Trials for LoadRecurse.
    pub load_recurse_trials: u32,
    /// Trials for SearchAll.
    pub search_trials: u32,
    /// Trials for Decompress.
    pub decompress_trials: u32,
}

/// Options controlling a case-set run.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// Scenarios to run; the rest are skipped.
    pub cases: ScenarioSet,
    /// Skip a failing scenario and move on instead of aborting the run.
    pub keep_going: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            cases: ScenarioSet::ALL,
            keep_going: false,
        }
    }
}

/// Run the selected scenarios of one library's case set, in order.
///
/// By default the first failing scenario aborts the whole run; with
/// `keep_going` it is logged and skipped, and later scenarios still run.
/// Either way the failing scenario emits no results row.
pub fn run_cases<A, P, W>(
    harness: &mut Harness<P, W>,
    spec: &OpenSpec,
    profile: &CaseProfile,
    options: RunOptions,
) -> Result<(), BenchError>
where
    A: TreeArchive,
    P: Progress,
    W: Write,
{
    for scenario in Scenario::ALL {
        if !options.cases.contains(scenario) {
            continue;
        }
        match run_case::<A, P, W>(harness, scenario, spec, profile) {
            Ok(_) => {}
            Err(err) if options.keep_going => {
                tracing::warn!(scenario = %scenario, error = %err, "scenario failed, skipping");
            }
            Err(err) => return Err(err),
        }
    }
    Ok(())
}

fn run_case<A, P, W>(
    harness: &mut Harness<P, W>,
    scenario: Scenario,
    spec: &OpenSpec,
    profile: &CaseProfile,
) -> Result<Summary, BenchError>
where
    A: TreeArchive,
    P: Progress,
    W: Write,
{
    let open = || A::open(&spec.path, spec.variant).map_err(BenchError::from);

    match scenario {
        Scenario::Load => {
            harness.run_stepped(scenario, profile.load_trials, profile.load_step, || {
                let timer = Timer::start();
                let file = open()?;
                drop(file);
                Ok(timer.elapsed_ticks())
            })
        }
        Scenario::Recurse => harness.run_with(
            scenario,
            profile.recurse_trials,
            open,
            |file| {
                let timer = Timer::start();
                black_box(visit_all(&file.root()));
                Ok(timer.elapsed_ticks())
            },
            |file| {
                drop(file);
                Ok(())
            },
        ),
        Scenario::LoadRecurse => harness.run(scenario, profile.load_recurse_trials, || {
            let timer = Timer::start();
            let file = open()?;
            black_box(visit_all(&file.root()));
            drop(file);
            Ok(timer.elapsed_ticks())
        }),
        Scenario::SearchAll => harness.run_with(
            scenario,
            profile.search_trials,
            open,
            |file| {
                let timer = Timer::start();
                search_all(&file.root())?;
                Ok(timer.elapsed_ticks())
            },
            |file| {
                drop(file);
                Ok(())
            },
        ),
        Scenario::Decompress => harness.run_with(
            scenario,
            profile.decompress_trials,
            open,
            |file| {
                let timer = Timer::start();
                black_box(decode_all(&file.root())?);
                let ticks = timer.elapsed_ticks();
                release_all(&file.root());
                Ok(ticks)
            },
            |file| {
                drop(file);
                Ok(())
            },
        ),
    }
}

/// Walk the tree depth-first, visiting every descendant exactly once.
/// Returns the number of nodes visited.
pub fn visit_all<N: TreeNode>(node: &N) -> u64 {
    let mut visited = 0;
    for child in node.children() {
        visited += 1 + visit_all(&child);
    }
    visited
}

/// Walk the tree verifying that every child, looked up by name through its
/// parent's own index, resolves to the identical node.
pub fn search_all<N: TreeNode>(node: &N) -> Result<(), BenchError> {
    for child in node.children() {
        match node.child(child.name()) {
            Some(found) if found == child => search_all(&child)?,
            _ => {
                return Err(BenchError::Integrity {
                    node: child.name().to_string(),
                });
            }
        }
    }
    Ok(())
}

/// Walk the tree forcing the decode of every image-bearing leaf. Returns the
/// total decoded byte count.
pub fn decode_all<N: TreeNode>(node: &N) -> Result<u64, ArchiveError> {
    let mut bytes = 0;
    if let Some(image) = node.image() {
        bytes += image.decode()? as u64;
    }
    for child in node.children() {
        bytes += decode_all(&child)?;
    }
    Ok(bytes)
}

/// Walk the tree releasing every decoded image buffer.
pub fn release_all<N: TreeNode>(node: &N) {
    if let Some(image) = node.image() {
        image.dispose();
    }
    for child in node.children() {
        release_all(&child);
    }
}
