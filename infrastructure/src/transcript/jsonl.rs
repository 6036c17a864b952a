//! JSONL file store for transcripts.
//!
//! Each [`TranscriptEntry`] is serialized as a single JSON line and appended
//! through a buffered writer. Existing lines are read back on open, so a
//! restarted process continues the same transcripts.

use super::memory::MemoryTranscriptStore;
use async_trait::async_trait;
use relay_application::{TranscriptEntry, TranscriptError, TranscriptStore};
use relay_domain::Message;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

/// Append-only transcript file.
///
/// Thread-safe via `Mutex<BufWriter<File>>`; every record is flushed as it is
/// written. Reads are served from an in-memory index.
pub struct JsonlTranscriptStore {
    writer: Mutex<BufWriter<File>>,
    index: MemoryTranscriptStore,
    path: PathBuf,
}

impl JsonlTranscriptStore {
    /// Open (or create) the transcript file at `path`.
    ///
    /// Creates parent directories as needed. A line that is not a valid entry
    /// fails the open rather than silently dropping history.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, TranscriptError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                TranscriptError::Storage(format!(
                    "could not create transcript directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let index = MemoryTranscriptStore::new();
        let mut loaded = 0usize;
        if path.exists() {
            let file = File::open(path).map_err(|e| storage(path, e))?;
            for (n, line) in BufReader::new(file).lines().enumerate() {
                let line = line.map_err(|e| storage(path, e))?;
                if line.trim().is_empty() {
                    continue;
                }
                let entry: TranscriptEntry = serde_json::from_str(&line).map_err(|e| {
                    TranscriptError::Corrupt(format!("{}:{}: {}", path.display(), n + 1, e))
                })?;
                index.insert(entry)?;
                loaded += 1;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| storage(path, e))?;
        debug!(path = %path.display(), loaded, "Opened transcript file");

        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
            index,
            path: path.to_path_buf(),
        })
    }

    /// Get the path to the transcript file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, entry: &TranscriptEntry) -> Result<(), TranscriptError> {
        let line = serde_json::to_string(entry)
            .map_err(|e| TranscriptError::Storage(format!("could not encode entry: {e}")))?;
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| TranscriptError::Storage("transcript lock poisoned".to_string()))?;
        writeln!(writer, "{}", line).map_err(|e| storage(&self.path, e))?;
        writer.flush().map_err(|e| storage(&self.path, e))
    }
}

fn storage(path: &Path, error: std::io::Error) -> TranscriptError {
    TranscriptError::Storage(format!("{}: {}", path.display(), error))
}

#[async_trait]
impl TranscriptStore for JsonlTranscriptStore {
    async fn append(
        &self,
        participant_id: &str,
        message: &Message,
    ) -> Result<TranscriptEntry, TranscriptError> {
        let entry = TranscriptEntry::new(participant_id, message);
        self.write(&entry)?;
        self.index.insert(entry.clone())?;
        Ok(entry)
    }

    async fn history(&self, participant_id: &str) -> Result<Vec<TranscriptEntry>, TranscriptError> {
        self.index.history(participant_id).await
    }
}

impl Drop for JsonlTranscriptStore {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock()
            && let Err(e) = writer.flush()
        {
            warn!("Could not flush transcript {}: {}", self.path.display(), e);
        }
    }
}
