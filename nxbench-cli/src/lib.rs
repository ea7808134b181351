#![warn(missing_docs)]
//! nxbench CLI Library
//!
//! One positional argument selects the library under test; its case set runs
//! against the archive configured for that library. Results go to stdout as
//! tab-separated rows, live progress and diagnostics to stderr, so
//! redirecting stdout captures only final results.

mod config;

pub use config::*;

use clap::{Parser, ValueEnum};
use nxbench_archive::{IndexedFile, LazyFile, ScannedFile};
use nxbench_core::{
    CaseProfile, Harness, NullProgress, OpenSpec, Progress, RunOptions, Scenario, ScenarioSet,
    TermProgress, Variant, run_cases,
};
use std::io::Write;
use std::path::PathBuf;

/// nxbench CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "nxbench")]
#[command(author, version, about = "nxbench - archive-parser benchmarking harness")]
pub struct Cli {
    /// Library under test
    #[arg(value_enum, ignore_case = true)]
    pub library: Library,

    /// Archive to open, overriding nxbench.toml
    #[arg(long)]
    pub archive: Option<PathBuf>,

    /// Scenarios to run (codes ld, re, lr, sa, de); default is all five
    #[arg(long, value_delimiter = ',')]
    pub cases: Vec<Scenario>,

    /// Skip a failing scenario and continue instead of aborting the run
    #[arg(long)]
    pub keep_going: bool,

    /// Suppress live progress output
    #[arg(short, long)]
    pub quiet: bool,
}

/// The archive-parsing implementations nxbench can measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Library {
    /// Zero-copy lazy reader (NX-style parsing).
    Renx,
    /// Eager reader with a hashed child index (WZ-style parsing).
    Rewz,
    /// Eager reader with linear child lookup (legacy baseline).
    Ml,
}

impl Library {
    /// Trial counts for this library's case set.
    pub fn profile(self) -> CaseProfile {
        match self {
            Library::Renx => CaseProfile {
                load_trials: 0x1000,
                load_step: 0x200,
                recurse_trials: 0x80,
                load_recurse_trials: 0x10,
                search_trials: 0x40,
                decompress_trials: 0x5,
            },
            Library::Rewz | Library::Ml => CaseProfile {
                load_trials: 0x400,
                load_step: 0x40,
                recurse_trials: 0x80,
                load_recurse_trials: 0x4,
                search_trials: 0x40,
                decompress_trials: 0x4,
            },
        }
    }

    /// Variant passed to every open for this library.
    pub fn variant(self) -> Variant {
        match self {
            Library::Renx => Variant::Plain,
            Library::Rewz | Library::Ml => Variant::Classic,
        }
    }

    fn archive_path(self, config: &BenchConfig) -> PathBuf {
        match self {
            Library::Renx => config.archives.nx.clone(),
            Library::Rewz | Library::Ml => config.archives.wz.clone(),
        }
    }
}

/// Run the nxbench CLI. This is the entry point for the `nxbench` binary.
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run_with_cli(cli)
}

/// Run with already-parsed arguments.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    init_tracing();

    let config = BenchConfig::discover(&std::env::current_dir()?)?;
    let spec = OpenSpec {
        path: cli
            .archive
            .clone()
            .unwrap_or_else(|| cli.library.archive_path(&config)),
        variant: cli.library.variant(),
    };
    let options = RunOptions {
        cases: if cli.cases.is_empty() {
            ScenarioSet::ALL
        } else {
            cli.cases.iter().copied().collect()
        },
        keep_going: cli.keep_going,
    };

    let stdout = std::io::stdout().lock();
    if cli.quiet {
        dispatch(cli.library, NullProgress, stdout, &spec, options)
    } else {
        dispatch(cli.library, TermProgress, stdout, &spec, options)
    }
}

fn dispatch<P, W>(
    library: Library,
    progress: P,
    out: W,
    spec: &OpenSpec,
    options: RunOptions,
) -> anyhow::Result<()>
where
    P: Progress,
    W: Write,
{
    tracing::debug!(?library, path = %spec.path.display(), "starting benchmark run");

    let mut harness = Harness::new(progress, out);
    harness.write_header()?;

    let profile = library.profile();
    match library {
        Library::Renx => run_cases::<LazyFile, P, W>(&mut harness, spec, &profile, options)?,
        Library::Rewz => run_cases::<IndexedFile, P, W>(&mut harness, spec, &profile, options)?,
        Library::Ml => run_cases::<ScannedFile, P, W>(&mut harness, spec, &profile, options)?,
    }
    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_parsing_is_case_insensitive() {
        for raw in ["renx", "ReNX", "RENX"] {
            let cli = Cli::try_parse_from(["nxbench", raw]).unwrap();
            assert_eq!(cli.library, Library::Renx);
        }
        let cli = Cli::try_parse_from(["nxbench", "ML"]).unwrap();
        assert_eq!(cli.library, Library::Ml);
    }

    #[test]
    fn test_unknown_library_is_a_usage_error() {
        assert!(Cli::try_parse_from(["nxbench", "wcr"]).is_err());
        assert!(Cli::try_parse_from(["nxbench"]).is_err());
    }

    #[test]
    fn test_cases_filter_parses_codes() {
        let cli = Cli::try_parse_from(["nxbench", "rewz", "--cases", "ld,sa"]).unwrap();
        assert_eq!(cli.cases, vec![Scenario::Load, Scenario::SearchAll]);
    }

    #[test]
    fn test_profiles_match_historic_trial_counts() {
        let renx = Library::Renx.profile();
        assert_eq!(renx.load_trials, 0x1000);
        assert_eq!(renx.load_step, 0x200);
        assert_eq!(renx.recurse_trials, 0x80);
        assert_eq!(renx.load_recurse_trials, 0x10);
        assert_eq!(renx.search_trials, 0x40);
        assert_eq!(renx.decompress_trials, 0x5);

        let rewz = Library::Rewz.profile();
        assert_eq!(rewz.load_trials, 0x400);
        assert_eq!(rewz.load_step, 0x40);
        assert_eq!(rewz.load_recurse_trials, 0x4);
        assert_eq!(rewz.decompress_trials, 0x4);
    }

    #[test]
    fn test_variants() {
        assert_eq!(Library::Renx.variant(), Variant::Plain);
        assert_eq!(Library::Rewz.variant(), Variant::Classic);
        assert_eq!(Library::Ml.variant(), Variant::Classic);
    }
}
