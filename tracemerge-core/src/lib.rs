//! Streaming merge of cache access traces.
//!
//! Every input trace is a text file with one access per line,
//! `timestamp,key,key_size,value_size,client_id,operation,ttl`, sorted by
//! `timestamp`. Traces may have tens of billions of rows, so no input is ever
//! loaded as a whole.
//!
//! Each input is wrapped in a `SourceStream`, which decodes lines, drops
//! malformed ones, filters by operation class, and optionally reduces every
//! window of `group_size` rows to one random representative. The
//! `MergeFrontier` keeps one pending row per source in a min-heap, and the
//! `TraceMerger` repeatedly writes the smallest one and refills from the same
//! source.

pub mod config;
pub mod decoder;
pub mod error;
pub mod local_file_reader;
pub mod merge_frontier;
pub mod merger;
pub mod operation;
pub mod output_sink;
pub mod progress;
pub mod row;
pub mod source_stream;
pub mod tool;

// Used by `error_bail!`, so callers need neither crate as a direct dependency.
#[doc(hidden)]
pub use anyhow as __anyhow;
#[doc(hidden)]
pub use log as __log;
