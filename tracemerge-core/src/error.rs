use std::path::PathBuf;

/// Why one physical line could not be turned into a `Row`.
///
/// Never fatal: `SourceStream` drops the line and moves on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("expected 7 fields, found {found}")]
    FieldCount { found: usize },

    #[error("invalid unsigned integer in field {field}: {value:?}")]
    NumericParse { field: &'static str, value: String },

    #[error("line is not valid UTF-8 after byte {valid_up_to}")]
    InvalidUtf8 { valid_up_to: usize },
}

/// Invalid configuration, detected before any file is touched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("group size must be a positive integer, got {0}")]
    InvalidGroupSize(i64),

    #[error("missing required argument: {0}")]
    MissingArgument(&'static str),

    #[error("invalid value for {name}: {value}")]
    InvalidArgument { name: &'static str, value: String },
}

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("failed to open {path:?}: {source}")]
    OpenFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read {path:?}: {source}")]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path:?}: {source}")]
    WriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Everything that aborts a merge run.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] IoError),

    #[error("{path:?} is not sorted by timestamp: {current} after {previous}")]
    OutOfOrder {
        path: PathBuf,
        previous: u64,
        current: u64,
    },
}
