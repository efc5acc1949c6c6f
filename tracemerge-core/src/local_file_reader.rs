use log::info;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::error::IoError;

/// Line cursor over one trace file.
///
/// Lines are read one at a time through a `BufReader`, the file is never
/// loaded as a whole. Lines are raw bytes with their terminator kept; the
/// decoder checks the encoding and strips the terminator.
pub struct LocalFileReader {
    /// Path, for error messages.
    path: PathBuf,

    /// Buffered handle. `None` once end of file is reached, so the handle is
    /// released as soon as the source is exhausted.
    reader: Option<Box<dyn BufRead + Send>>,

    /// Number of physical lines returned so far.
    pos: u64,
}

impl LocalFileReader {
    pub fn new(path: &Path) -> Result<Self, IoError> {
        let file = File::open(path).map_err(|source| IoError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;

        info!("open trace file: {}", path.display());

        Ok(Self::from_reader(path, BufReader::new(file)))
    }

    /// Read lines from any buffered reader, `path` only names it in errors.
    pub fn from_reader<R: BufRead + Send + 'static>(path: &Path, reader: R) -> Self {
        Self {
            path: path.to_path_buf(),
            reader: Some(Box::new(reader)),
            pos: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn pos(&self) -> u64 {
        self.pos
    }

    pub fn is_exhausted(&self) -> bool {
        self.reader.is_none()
    }
}

impl Iterator for LocalFileReader {
    type Item = Result<Vec<u8>, IoError>;

    fn next(&mut self) -> Option<Self::Item> {
        let reader = self.reader.as_mut()?;

        let mut line = Vec::new();
        match reader.read_until(b'\n', &mut line) {
            Ok(0) => {
                self.reader = None;
                None
            }
            Ok(_) => {
                self.pos += 1;
                Some(Ok(line))
            }
            Err(source) => {
                self.reader = None;
                Some(Err(IoError::ReadFailed {
                    path: self.path.clone(),
                    source,
                }))
            }
        }
    }
}
