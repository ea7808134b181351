//! Trial Execution
//!
//! The `Harness` runs a scenario's trials strictly in sequence, collects the
//! self-timed durations into a pre-sized trial set, and reduces them to one
//! summary row. Two loop shapes are provided: per-trial progress (`run`,
//! `run_with`) and stepped batches for scenarios whose per-trial cost is too
//! low to report individually (`run_stepped`, `run_stepped_with`).

use crate::archive::ArchiveError;
use crate::measure::TICK_FREQUENCY;
use crate::progress::{Frame, Progress};
use crate::report::ResultWriter;
use crate::Scenario;
use nxbench_stats::{Summary, Ticks, reduce, ticks_to_micros};
use std::io::{self, Write};
use thiserror::Error;

/// Errors that abort a scenario.
///
/// The variants stay distinguishable so callers can choose between aborting
/// the whole run and skipping the failing scenario.
#[derive(Debug, Error)]
pub enum BenchError {
    /// The collaborator library failed to open or read an archive.
    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// A name lookup through the collaborator's own index did not return
    /// the node being looked up. A contract breach in the library, not a
    /// harness failure.
    #[error("index integrity violation at node '{node}'")]
    Integrity {
        /// Name of the child whose lookup mismatched.
        node: String,
    },

    /// The results stream could not be written.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Runs scenarios and emits their summary rows.
#[derive(Debug)]
pub struct Harness<P, W> {
    progress: P,
    results: ResultWriter<W>,
    tick_frequency: i64,
}

impl<P: Progress, W: Write> Harness<P, W> {
    /// Create a harness reporting to `progress` and writing result rows to
    /// `out`.
    pub fn new(progress: P, out: W) -> Self {
        Self::with_frequency(progress, out, TICK_FREQUENCY)
    }

    /// Create a harness with an explicit tick frequency. Trials feed the
    /// harness raw ticks, so tests can use synthetic clocks.
    pub fn with_frequency(progress: P, out: W, tick_frequency: i64) -> Self {
        Self {
            progress,
            results: ResultWriter::new(out),
            tick_frequency,
        }
    }

    /// Write the results-stream header line.
    pub fn write_header(&mut self) -> io::Result<()> {
        self.results.write_header()
    }

    /// Run `trials` self-timed trials of `op`, reporting after each one.
    pub fn run<O>(&mut self, label: Scenario, trials: u32, mut op: O) -> Result<Summary, BenchError>
    where
        O: FnMut() -> Result<Ticks, BenchError>,
    {
        self.run_with(label, trials, || Ok(()), |_| op(), |()| Ok(()))
    }

    /// Run `trials` self-timed trials with one-time setup and teardown.
    ///
    /// `prepare` runs exactly once before the loop and yields the context
    /// threaded into every trial; `postpare` consumes it exactly once after
    /// the loop. Any error propagates immediately: the trial set is
    /// discarded and no row is emitted.
    pub fn run_with<C, S, O, T>(
        &mut self,
        label: Scenario,
        trials: u32,
        prepare: S,
        mut op: O,
        postpare: T,
    ) -> Result<Summary, BenchError>
    where
        S: FnOnce() -> Result<C, BenchError>,
        O: FnMut(&mut C) -> Result<Ticks, BenchError>,
        T: FnOnce(C) -> Result<(), BenchError>,
    {
        assert!(trials > 0, "trial count must be non-zero");

        let anchor = self.progress.pin();
        let mut samples = vec![0 as Ticks; trials as usize];
        let mut best = Ticks::MAX;

        let mut context = prepare()?;
        for i in 0..trials as usize {
            let ticks = op(&mut context)?;
            samples[i] = ticks;
            best = best.min(ticks);
            self.progress.update(
                &anchor,
                &Frame {
                    label,
                    current: i as u32 + 1,
                    total: trials,
                    current_us: Some(ticks_to_micros(ticks, self.tick_frequency)),
                    best_us: Some(ticks_to_micros(best, self.tick_frequency)),
                },
            );
        }
        postpare(context)?;

        self.finish(label, samples)
    }

    /// Run `trials` trials reporting once per `step`-sized batch.
    pub fn run_stepped<O>(
        &mut self,
        label: Scenario,
        trials: u32,
        step: u32,
        mut op: O,
    ) -> Result<Summary, BenchError>
    where
        O: FnMut() -> Result<Ticks, BenchError>,
    {
        self.run_stepped_with(label, trials, step, || Ok(()), |_| op(), |()| Ok(()))
    }

    /// Stepped variant of [`Harness::run_with`].
    ///
    /// Progress is coarse: one frame after every `step` trials (durations
    /// rendered as N/A), plus a final frame carrying the definitive best
    /// once all trials are in. Statistics are identical to `run_with`.
    pub fn run_stepped_with<C, S, O, T>(
        &mut self,
        label: Scenario,
        trials: u32,
        step: u32,
        prepare: S,
        mut op: O,
        postpare: T,
    ) -> Result<Summary, BenchError>
    where
        S: FnOnce() -> Result<C, BenchError>,
        O: FnMut(&mut C) -> Result<Ticks, BenchError>,
        T: FnOnce(C) -> Result<(), BenchError>,
    {
        assert!(trials > 0, "trial count must be non-zero");
        assert!(step > 0, "step must be non-zero");

        let anchor = self.progress.pin();
        let mut samples = vec![0 as Ticks; trials as usize];

        let mut context = prepare()?;
        let mut i = 0usize;
        while i < trials as usize {
            let mut j = 0;
            while j < step && i < trials as usize {
                samples[i] = op(&mut context)?;
                i += 1;
                j += 1;
            }
            self.progress.update(
                &anchor,
                &Frame {
                    label,
                    current: i as u32,
                    total: trials,
                    current_us: None,
                    best_us: None,
                },
            );
        }
        postpare(context)?;

        samples.sort_unstable();
        self.progress.update(
            &anchor,
            &Frame {
                label,
                current: trials,
                total: trials,
                current_us: None,
                best_us: Some(ticks_to_micros(samples[0], self.tick_frequency)),
            },
        );

        self.finish_sorted(label, samples)
    }

    fn finish(&mut self, label: Scenario, mut samples: Vec<Ticks>) -> Result<Summary, BenchError> {
        samples.sort_unstable();
        self.finish_sorted(label, samples)
    }

    fn finish_sorted(
        &mut self,
        label: Scenario,
        samples: Vec<Ticks>,
    ) -> Result<Summary, BenchError> {
        let summary = reduce(&samples, self.tick_frequency);
        self.results.write_row(label, &summary)?;
        Ok(summary)
    }

    /// The progress sink.
    pub fn progress(&self) -> &P {
        &self.progress
    }

    /// Consume the harness, returning the progress sink and results writer.
    pub fn into_parts(self) -> (P, W) {
        (self.progress, self.results.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NullProgress;
    use std::cell::Cell;

    /// Progress sink that records every frame.
    #[derive(Debug, Default)]
    struct Recording {
        frames: Vec<Frame>,
    }

    impl Progress for Recording {
        type Anchor = ();

        fn pin(&mut self) {}

        fn update(&mut self, _anchor: &(), frame: &Frame) {
            self.frames.push(frame.clone());
        }
    }

    const FREQ: i64 = 10_000_000;

    fn scripted(ticks: Vec<Ticks>) -> impl FnMut() -> Result<Ticks, BenchError> {
        let mut it = ticks.into_iter();
        move || Ok(it.next().expect("op called more often than scripted"))
    }

    #[test]
    fn test_run_reduces_reference_vector() {
        let mut harness = Harness::with_frequency(NullProgress, Vec::new(), FREQ);
        harness.write_header().unwrap();
        let ticks: Vec<Ticks> = vec![70, 10, 90, 30, 50, 100, 20, 80, 40, 60];
        let summary = harness
            .run(Scenario::Load, 10, scripted(ticks))
            .unwrap();

        assert_eq!(summary.p75, 8);
        assert_eq!(summary.min, 1);
        assert!((summary.trimmed_mean - 5.5).abs() < f64::EPSILON);

        let (_, out) = harness.into_parts();
        let out = String::from_utf8(out).unwrap();
        assert_eq!(out, "Name\t75%t\tM50%\tBest\nLd\t8\t5.5\t1\n");
    }

    #[test]
    fn test_running_best_never_increases() {
        let mut harness = Harness::with_frequency(Recording::default(), Vec::new(), FREQ);
        let ticks: Vec<Ticks> = vec![500, 300, 400, 200, 600, 200, 100];
        harness
            .run(Scenario::Recurse, 7, scripted(ticks))
            .unwrap();

        let frames = &harness.progress().frames;
        assert_eq!(frames.len(), 7);
        let bests: Vec<i64> = frames.iter().map(|f| f.best_us.unwrap()).collect();
        assert!(bests.windows(2).all(|w| w[1] <= w[0]));
        assert_eq!(*bests.last().unwrap(), ticks_to_micros(100, FREQ));
    }

    #[test]
    fn test_prepare_and_postpare_run_once() {
        let prepared = Cell::new(0u32);
        let postpared = Cell::new(0u32);

        let mut harness = Harness::with_frequency(NullProgress, Vec::new(), FREQ);
        harness
            .run_with(
                Scenario::Recurse,
                5,
                || {
                    prepared.set(prepared.get() + 1);
                    Ok(7u8)
                },
                |context| Ok(*context as Ticks * 10),
                |_context| {
                    postpared.set(postpared.get() + 1);
                    Ok(())
                },
            )
            .unwrap();

        assert_eq!(prepared.get(), 1);
        assert_eq!(postpared.get(), 1);
    }

    #[test]
    fn test_op_failure_aborts_without_row() {
        let postpared = Cell::new(false);
        let mut calls = 0;

        let mut harness = Harness::with_frequency(NullProgress, Vec::new(), FREQ);
        let result = harness.run_with(
            Scenario::SearchAll,
            8,
            || Ok(()),
            |_| {
                calls += 1;
                if calls == 3 {
                    Err(BenchError::Integrity {
                        node: "Map".to_string(),
                    })
                } else {
                    Ok(10)
                }
            },
            |()| {
                postpared.set(true);
                Ok(())
            },
        );

        assert!(matches!(result, Err(BenchError::Integrity { .. })));
        assert!(!postpared.get());

        let (_, out) = harness.into_parts();
        assert!(out.is_empty());
    }

    #[test]
    fn test_stepped_cadence() {
        let mut harness = Harness::with_frequency(Recording::default(), Vec::new(), FREQ);
        let ticks: Vec<Ticks> = (1..=0x40).collect();
        let summary = harness
            .run_stepped(Scenario::Load, 0x40, 0x10, scripted(ticks))
            .unwrap();

        let frames = &harness.progress().frames;
        // Four batch frames plus the final completion frame.
        assert_eq!(frames.len(), 5);
        for frame in &frames[..4] {
            assert_eq!(frame.current_us, None);
            assert_eq!(frame.best_us, None);
        }
        let last = frames.last().unwrap();
        assert_eq!(last.current, 0x40);
        assert_eq!(last.best_us, Some(ticks_to_micros(1, FREQ)));

        // Statistics still cover all 0x40 samples.
        assert_eq!(summary.min, 0);
        assert_eq!(summary.p75, ticks_to_micros(0x40 * 3 / 4 + 1, FREQ));
    }

    #[test]
    fn test_stepped_partial_final_batch() {
        let mut harness = Harness::with_frequency(Recording::default(), Vec::new(), FREQ);
        let ticks: Vec<Ticks> = (1..=10).collect();
        harness
            .run_stepped(Scenario::Load, 10, 4, scripted(ticks))
            .unwrap();

        let counts: Vec<u32> = harness
            .progress()
            .frames
            .iter()
            .map(|f| f.current)
            .collect();
        assert_eq!(counts, vec![4, 8, 10, 10]);
    }

    #[test]
    fn test_trial_set_is_presized() {
        let mut harness = Harness::with_frequency(NullProgress, Vec::new(), FREQ);
        // Every scripted value is consumed exactly once; a shrinking or
        // growing trial set would panic in `scripted`.
        let summary = harness
            .run(Scenario::LoadRecurse, 64, scripted((1..=64).collect()))
            .unwrap();
        assert_eq!(summary.min, 0);
    }
}
