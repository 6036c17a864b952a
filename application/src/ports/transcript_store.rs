//! Transcript store port
//!
//! Persists every message of a participant's conversation. The store assigns
//! timestamps; history comes back in ascending timestamp order.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use relay_domain::{Message, Role};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TranscriptError {
    #[error("Transcript storage error: {0}")]
    Storage(String),

    #[error("Corrupt transcript record: {0}")]
    Corrupt(String),
}

/// One persisted message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub participant_id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl TranscriptEntry {
    pub fn new(participant_id: impl Into<String>, message: &Message) -> Self {
        Self {
            participant_id: participant_id.into(),
            role: message.role,
            content: message.content.clone(),
            timestamp: Utc::now(),
        }
    }

    pub fn to_message(&self) -> Message {
        Message::new(self.role, self.content.clone())
    }
}

#[async_trait]
pub trait TranscriptStore: Send + Sync {
    /// Persist `message` for `participant_id` and return the stored entry.
    async fn append(
        &self,
        participant_id: &str,
        message: &Message,
    ) -> Result<TranscriptEntry, TranscriptError>;

    /// All entries for `participant_id`, oldest first.
    async fn history(&self, participant_id: &str) -> Result<Vec<TranscriptEntry>, TranscriptError>;
}
