use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::IoError;
use crate::row::Row;

/// Writes rows in the 7-column record format, one per line, no header.
pub struct OutputSink<W: Write> {
    writer: W,

    /// Path, for error messages.
    path: PathBuf,

    rows_written: u64,
}

impl OutputSink<BufWriter<File>> {
    /// Create or truncate the output file.
    pub fn create(path: &Path) -> Result<Self, IoError> {
        let file = File::create(path).map_err(|source| IoError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self::new(BufWriter::new(file), path))
    }
}

impl<W: Write> OutputSink<W> {
    pub fn new(writer: W, path: &Path) -> Self {
        Self {
            writer,
            path: path.to_path_buf(),
            rows_written: 0,
        }
    }

    /// Append one record, `source_index` is not written.
    pub fn write(&mut self, row: &Row) -> Result<(), IoError> {
        writeln!(self.writer, "{}", row).map_err(|source| self.write_failed(source))?;
        self.rows_written += 1;

        Ok(())
    }

    /// Flush and give back the writer. Dropping it releases the file handle.
    pub fn close(mut self) -> Result<W, IoError> {
        self.writer
            .flush()
            .map_err(|source| self.write_failed(source))?;

        Ok(self.writer)
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    fn write_failed(&self, source: std::io::Error) -> IoError {
        IoError::WriteFailed {
            path: self.path.clone(),
            source,
        }
    }
}
