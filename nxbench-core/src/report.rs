//! Results Stream
//!
//! One header line, then one tab-separated row per completed scenario. The
//! stream is kept apart from progress output so redirecting it captures
//! only final results. Rows are flushed as they are written; a run aborted
//! mid-way keeps every completed scenario's row.

use crate::Scenario;
use nxbench_stats::Summary;
use std::io::{self, Write};

/// Header line of the results stream.
pub const RESULT_HEADER: &str = "Name\t75%t\tM50%\tBest";

/// Writes scenario summaries as tab-separated rows.
#[derive(Debug)]
pub struct ResultWriter<W> {
    out: W,
}

impl<W: Write> ResultWriter<W> {
    /// Create a writer over `out`.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Write the header line.
    pub fn write_header(&mut self) -> io::Result<()> {
        writeln!(self.out, "{RESULT_HEADER}")?;
        self.out.flush()
    }

    /// Write one scenario's row: label, p75, trimmed mean, min, in
    /// microseconds.
    pub fn write_row(&mut self, label: Scenario, summary: &Summary) -> io::Result<()> {
        writeln!(
            self.out,
            "{}\t{}\t{}\t{}",
            label, summary.p75, summary.trimmed_mean, summary.min
        )?;
        self.out.flush()
    }

    /// Get mutable reference to the inner writer.
    pub fn inner_mut(&mut self) -> &mut W {
        &mut self.out
    }

    /// Consume and return the inner writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}
