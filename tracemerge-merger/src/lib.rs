//! Command line front end of the trace merger.
//!
//! Usage:
//!
//! merge <output_file> <group_size> [--include-set-ops] <input_file_1> [input_file_2 ...]
//!
//! Every input must already be sorted by `timestamp` and must not have a header line.
//! The output has the same 7-column layout, sorted by `timestamp`, without header.
//!
//! `group_size` reduces every `group_size` consecutive rows of one input, after
//! filtering, to one random representative. `1` keeps every row.
//!
//! By default only `get`, `gets` and `delete` are kept. `--include-set-ops` also
//! keeps `set`, `cas`, `add`, `replace`, `incr`, `decr`, `prepend` and `append`.
//!
//! Exit status is `0` on a completed merge, non-zero on invalid arguments, an
//! input that cannot be opened, or an output that cannot be written.

use clap::Parser;
use std::path::PathBuf;

use tracemerge_core::config::{MergeConfig, OrderCheck};
use tracemerge_core::decoder::DecodeMode;
use tracemerge_core::error::ConfigError;
use tracemerge_core::operation::FilterPolicy;
use tracemerge_core::tool::DEFAULT_PROGRESS_INTERVAL;

#[derive(Parser, Debug)]
#[command(
    name = "merge",
    author,
    version,
    about = "Merge timestamp-sorted cache access traces into one sorted trace.",
    long_about = None
)]
pub struct Args {
    /// Merged trace file, created or truncated.
    pub output_file: PathBuf,

    /// Number of filtered rows per window, one random row of each window is kept.
    #[arg(allow_negative_numbers = true)]
    pub group_size: i64,

    /// Input trace files, each sorted by timestamp.
    #[arg(required = true, num_args = 1..)]
    pub input_files: Vec<PathBuf>,

    /// Also keep set, cas, add, replace, incr, decr, prepend and append.
    #[arg(long)]
    pub include_set_ops: bool,

    /// Rebuild keys that contain unescaped commas instead of dropping the line.
    #[arg(long)]
    pub loose_keys: bool,

    /// What to do when an input is not sorted by timestamp: off, warn or reject.
    #[arg(long, default_value_t = OrderCheck::Warn)]
    pub order_check: OrderCheck,

    /// Log throughput every N written rows, 0 disables it.
    #[arg(long, default_value_t = DEFAULT_PROGRESS_INTERVAL)]
    pub progress_interval: u64,
}

impl Args {
    pub fn to_config(&self) -> Result<MergeConfig, ConfigError> {
        let decode_mode = if self.loose_keys {
            DecodeMode::Loose
        } else {
            DecodeMode::Strict
        };

        let config = MergeConfig::new(
            self.output_file.clone(),
            self.group_size,
            FilterPolicy::from_include_writes(self.include_set_ops),
            self.input_files.clone(),
        )?
        .with_decode_mode(decode_mode)
        .with_order_check(self.order_check)
        .with_progress_interval(self.progress_interval);

        Ok(config)
    }
}
