//! Append-only transcript file used as the recorder's persistence target.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// Appends flushed JSONL batches to a file.
#[derive(Debug, Clone)]
pub struct TranscriptFile {
    path: PathBuf,
}

impl TranscriptFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a batch, creating the file if needed. Failures are logged and
    /// the batch is lost.
    pub fn append(&self, batch: &[u8]) {
        match self.try_append(batch) {
            Ok(()) => debug!(
                target: "termwatch::cli",
                bytes = batch.len(),
                path = %self.path.display(),
                "Appended transcript batch"
            ),
            Err(e) => error!(
                target: "termwatch::cli",
                path = %self.path.display(),
                "Failed to write transcript batch: {}",
                e
            ),
        }
    }

    fn try_append(&self, batch: &[u8]) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(batch)
    }
}
