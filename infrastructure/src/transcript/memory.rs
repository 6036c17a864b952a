//! In-memory transcript store.
//!
//! Keeps entries per participant for the life of the process; used when no
//! transcript file is configured.

use async_trait::async_trait;
use relay_application::{TranscriptEntry, TranscriptError, TranscriptStore};
use relay_domain::Message;
use std::collections::HashMap;
use std::sync::Mutex;

/// Keeps transcripts in memory, grouped by participant.
#[derive(Debug, Default)]
pub struct MemoryTranscriptStore {
    entries: Mutex<HashMap<String, Vec<TranscriptEntry>>>,
}

impl MemoryTranscriptStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&self, entry: TranscriptEntry) -> Result<(), TranscriptError> {
        self.entries
            .lock()
            .map_err(|_| TranscriptError::Storage("transcript lock poisoned".to_string()))?
            .entry(entry.participant_id.clone())
            .or_default()
            .push(entry);
        Ok(())
    }
}

#[async_trait]
impl TranscriptStore for MemoryTranscriptStore {
    async fn append(
        &self,
        participant_id: &str,
        message: &Message,
    ) -> Result<TranscriptEntry, TranscriptError> {
        let entry = TranscriptEntry::new(participant_id, message);
        self.insert(entry.clone())?;
        Ok(entry)
    }

    async fn history(&self, participant_id: &str) -> Result<Vec<TranscriptEntry>, TranscriptError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| TranscriptError::Storage("transcript lock poisoned".to_string()))?;
        let mut history = entries.get(participant_id).cloned().unwrap_or_default();
        // Stable: entries sharing a timestamp keep insertion order.
        history.sort_by_key(|entry| entry.timestamp);
        Ok(history)
    }
}
