use log::info;
use std::io::Write;
use std::path::PathBuf;

use crate::config::MergeConfig;
use crate::error::MergeError;
use crate::merge_frontier::{MergeFrontier, RowSource};
use crate::output_sink::OutputSink;
use crate::progress::ProgressReporter;
use crate::source_stream::{SourceStats, SourceStream};

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeSummary {
    pub output: PathBuf,

    pub rows_written: u64,

    /// In input order.
    pub sources: Vec<SourceStats>,
}

/// Merges N timestamp-sorted trace files into one timestamp-sorted trace.
///
/// Single threaded and pull based: the merger pops the smallest pending row
/// from the `MergeFrontier`, writes it, and refills the frontier from the
/// source that row came from. Any I/O failure aborts the whole run, a
/// partially merged trace is not resumable.
pub struct TraceMerger {
    config: MergeConfig,
}

impl TraceMerger {
    pub fn new(config: MergeConfig) -> Self {
        Self { config }
    }

    /// Open every input in argument order, `source_index` is the position in that order.
    pub fn open_sources(&self) -> Result<Vec<SourceStream>, MergeError> {
        self.config
            .inputs
            .iter()
            .map(|path| SourceStream::open(path, self.config.source_options))
            .collect()
    }

    /// Run the merge into the configured output file.
    ///
    /// All inputs are opened and checked against the output before the output
    /// is created, so a missing input or an output that is really an input
    /// leaves every file untouched.
    pub fn run(&self) -> Result<MergeSummary, MergeError> {
        info!(
            "start merge, inputs: {}, group_size: {}, policy: {}, decode mode: {}, order check: {}",
            self.config.inputs.len(),
            self.config.group_size(),
            self.config.policy(),
            self.config.source_options.decode_mode,
            self.config.source_options.order_check,
        );

        let sources = self.open_sources()?;
        self.config.check_output_is_not_input()?;
        let sink = OutputSink::create(&self.config.output)?;

        let (sources, rows_written) = self.merge(sources, sink)?;

        info!("Merged trace saved to: {}", self.config.output.display());

        Ok(MergeSummary {
            output: self.config.output.clone(),
            rows_written,
            sources: sources.iter().map(|s| s.stats().clone()).collect(),
        })
    }

    /// Merge `sources` into `sink` and close it.
    ///
    /// Returns the sources, exhausted, and the number of rows written.
    pub fn merge<S: RowSource, W: Write>(
        &self,
        sources: Vec<S>,
        mut sink: OutputSink<W>,
    ) -> Result<(Vec<S>, u64), MergeError> {
        let mut progress = ProgressReporter::new(self.config.progress_interval);
        let mut frontier = MergeFrontier::seed(sources)?;

        while let Some(row) = frontier.pop_min() {
            sink.write(&row)?;
            progress.record();

            frontier.refill(row.source_index)?;
        }

        let rows_written = sink.rows_written();
        sink.close()?;

        progress.finish();

        Ok((frontier.into_sources(), rows_written))
    }
}
