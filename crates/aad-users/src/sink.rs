//! Where a successful read's aggregate is written

use crate::result::UsersResult;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Receives the aggregate of a read. Called at most once per read, and only
/// after every lookup and check has passed.
pub trait ResultSink {
    fn write(&mut self, result: &UsersResult) -> Result<(), SinkError>;
}

/// Keeps written results in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    last: Option<UsersResult>,
    writes: usize,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<&UsersResult> {
        self.last.as_ref()
    }

    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl ResultSink for MemorySink {
    fn write(&mut self, result: &UsersResult) -> Result<(), SinkError> {
        self.last = Some(result.clone());
        self.writes += 1;
        Ok(())
    }
}

/// Writes the aggregate as pretty JSON to a state file.
///
/// The file is replaced through a temporary file in the same directory and
/// a rename, so a reader never sees a half-written state. A failed write
/// leaves the previous state and no temporary file behind.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read back a previously written state file.
    pub fn load(&self) -> Result<UsersResult, SinkError> {
        let content = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

impl ResultSink for JsonFileSink {
    fn write(&mut self, result: &UsersResult) -> Result<(), SinkError> {
        let json = serde_json::to_vec_pretty(result)?;

        let parent = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };

        // Dropping an unpersisted temp file deletes it
        let mut tmp = NamedTempFile::new_in(&parent)?;
        tmp.write_all(&json)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        info!(path = %self.path.display(), id = %result.id, "Wrote users state");
        Ok(())
    }
}

/// Prints the aggregate as pretty JSON on stdout
#[derive(Debug, Default)]
pub struct StdoutSink;

impl ResultSink for StdoutSink {
    fn write(&mut self, result: &UsersResult) -> Result<(), SinkError> {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        serde_json::to_writer_pretty(&mut out, result)?;
        writeln!(out)?;
        Ok(())
    }
}
