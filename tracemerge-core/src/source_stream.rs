use likely_stable::{likely, unlikely};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::{Path, PathBuf};

use crate::config::{OrderCheck, SourceOptions};
use crate::decoder::RowDecoder;
use crate::error::{DecodeError, MergeError};
use crate::local_file_reader::LocalFileReader;
use crate::merge_frontier::RowSource;
use crate::row::Row;

/// Upper bound of the window preallocation, larger windows grow on demand.
const MAX_WINDOW_CAPACITY: u32 = 4096;

/// Counters of one source, for diagnostics only.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct SourceStats {
    pub path: PathBuf,

    /// Physical lines read.
    pub lines_read: u64,

    pub field_count_errors: u64,

    pub numeric_parse_errors: u64,

    /// Lines that are not valid UTF-8.
    pub encoding_errors: u64,

    /// Decoded rows whose operation was rejected by the filter.
    pub filtered_out: u64,

    /// Rows handed to the merge, after sampling.
    pub rows_emitted: u64,

    /// Number of times a filtered row had a smaller timestamp than the one before it.
    pub order_violations: u64,
}

impl SourceStats {
    pub fn decode_errors(&self) -> u64 {
        self.field_count_errors + self.numeric_parse_errors + self.encoding_errors
    }
}

/// One input trace file as a filtered, optionally down-sampled, ordered
/// sequence of rows.
///
/// Rows are pulled one at a time. With `group_size > 1`, up to `group_size`
/// filtered rows are collected into a window and one of them, chosen uniformly
/// at random, is emitted. A partial window at end of file still yields one row.
///
/// Decode failures and filtered rows never leave this type, they are counted
/// in `SourceStats` and skipped.
pub struct SourceStream {
    reader: LocalFileReader,

    decoder: RowDecoder,

    options: SourceOptions,

    /// Current window, reused across calls.
    window: Vec<Row>,

    rng: StdRng,

    /// Timestamp of the last filtered row, for the order check.
    last_timestamp: Option<u64>,

    /// Stats are logged once, when the stream is exhausted.
    finished: bool,

    stats: SourceStats,
}

impl SourceStream {
    /// Open `path` with a randomly seeded generator.
    pub fn open(path: &Path, options: SourceOptions) -> Result<Self, MergeError> {
        options.validate()?;

        let reader = LocalFileReader::new(path)?;

        Self::with_rng(reader, options, StdRng::from_entropy())
    }

    /// Build from an already opened reader and an explicit generator.
    pub fn with_rng(
        reader: LocalFileReader,
        options: SourceOptions,
        rng: StdRng,
    ) -> Result<Self, MergeError> {
        options.validate()?;

        let stats = SourceStats {
            path: reader.path().to_path_buf(),
            ..SourceStats::default()
        };

        Ok(Self {
            reader,
            decoder: RowDecoder::new(options.decode_mode),
            options,
            window: Vec::with_capacity(options.group_size.min(MAX_WINDOW_CAPACITY) as usize),
            rng,
            last_timestamp: None,
            finished: false,
            stats,
        })
    }

    pub fn stats(&self) -> &SourceStats {
        &self.stats
    }

    pub fn path(&self) -> &Path {
        self.reader.path()
    }

    /// Pull the next row that passes decoding and filtering, `None` at end of file.
    fn next_filtered(&mut self) -> Result<Option<Row>, MergeError> {
        while let Some(line) = self.reader.next() {
            let line = line?;
            self.stats.lines_read += 1;

            let row = match self.decoder.decode_bytes(&line) {
                Ok(row) => row,
                Err(e) => {
                    match e {
                        DecodeError::FieldCount { .. } => self.stats.field_count_errors += 1,
                        DecodeError::NumericParse { .. } => self.stats.numeric_parse_errors += 1,
                        DecodeError::InvalidUtf8 { .. } => self.stats.encoding_errors += 1,
                    }

                    debug!(
                        "skip line {} of {}: {}",
                        self.reader.pos(),
                        self.path().display(),
                        e
                    );
                    continue;
                }
            };

            if !self.options.policy.accepts(&row.operation) {
                self.stats.filtered_out += 1;
                continue;
            }

            self.check_order(row.timestamp)?;

            return Ok(Some(row));
        }

        Ok(None)
    }

    fn check_order(&mut self, timestamp: u64) -> Result<(), MergeError> {
        let previous = match self.last_timestamp.replace(timestamp) {
            Some(previous) => previous,
            None => return Ok(()),
        };

        if likely(previous <= timestamp) {
            return Ok(());
        }

        self.stats.order_violations += 1;

        match self.options.order_check {
            OrderCheck::Off => Ok(()),
            OrderCheck::Warn => {
                if self.stats.order_violations == 1 {
                    warn!(
                        "{} is not sorted by timestamp, line {}: {} after {}, output will be locally out of order",
                        self.path().display(),
                        self.reader.pos(),
                        timestamp,
                        previous
                    );
                }
                Ok(())
            }
            OrderCheck::Reject => Err(MergeError::OutOfOrder {
                path: self.path().to_path_buf(),
                previous,
                current: timestamp,
            }),
        }
    }

    /// Fill the window, then keep one random element.
    fn next_sampled(&mut self) -> Result<Option<Row>, MergeError> {
        self.window.clear();

        while self.window.len() < self.options.group_size as usize {
            match self.next_filtered()? {
                Some(row) => self.window.push(row),
                None => break,
            }
        }

        if self.window.is_empty() {
            return Ok(None);
        }

        let index = self.rng.gen_range(0..self.window.len());
        let row = self.window.swap_remove(index);
        self.window.clear();

        Ok(Some(row))
    }

    fn finish(&mut self) {
        if self.finished {
            return;
        }

        self.finished = true;

        info!(
            "source done: {}, lines: {}, decode errors: {} (field count: {}, numeric: {}, encoding: {}), filtered out: {}, emitted: {}, out of order: {}",
            self.stats.path.display(),
            self.stats.lines_read,
            self.stats.decode_errors(),
            self.stats.field_count_errors,
            self.stats.numeric_parse_errors,
            self.stats.encoding_errors,
            self.stats.filtered_out,
            self.stats.rows_emitted,
            self.stats.order_violations,
        );
    }
}

impl RowSource for SourceStream {
    fn next_row(&mut self) -> Result<Option<Row>, MergeError> {
        if unlikely(self.finished) {
            return Ok(None);
        }

        let row = if self.options.group_size == 1 {
            self.next_filtered()?
        } else {
            self.next_sampled()?
        };

        match row {
            Some(row) => {
                self.stats.rows_emitted += 1;
                Ok(Some(row))
            }
            None => {
                self.finish();
                Ok(None)
            }
        }
    }
}

impl Iterator for SourceStream {
    type Item = Result<Row, MergeError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_row().transpose()
    }
}
