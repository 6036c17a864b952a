//! Fakes shared by use case tests.

use crate::ports::completion_transport::{
    CompletionRequest, CompletionTransport, FragmentStream, UpstreamError,
};
use crate::ports::sleeper::Sleeper;
use crate::ports::transcript_store::{TranscriptEntry, TranscriptError, TranscriptStore};
use async_trait::async_trait;
use futures::StreamExt;
use relay_domain::Message;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::Notify;

pub(crate) type ScriptedStream = Result<Vec<Result<String, UpstreamError>>, UpstreamError>;

/// Transport that replays a fixed script, one entry per attempt.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<String, UpstreamError>>>,
    streams: Mutex<VecDeque<ScriptedStream>>,
    requests: Mutex<Vec<CompletionRequest>>,
    stall: bool,
}

impl ScriptedTransport {
    pub(crate) fn replies(replies: Vec<Result<String, UpstreamError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            ..Self::default()
        }
    }

    pub(crate) fn streams(streams: Vec<ScriptedStream>) -> Self {
        Self {
            streams: Mutex::new(streams.into()),
            ..Self::default()
        }
    }

    /// Scripted streams never end: after their fragments the next poll pends.
    pub(crate) fn stalling(mut self) -> Self {
        self.stall = true;
        self
    }

    pub(crate) fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionTransport for ScriptedTransport {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, UpstreamError> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(UpstreamError::Unexpected("script exhausted".to_string())))
    }

    async fn open_stream(
        &self,
        request: &CompletionRequest,
    ) -> Result<FragmentStream, UpstreamError> {
        self.requests.lock().unwrap().push(request.clone());
        let fragments = self
            .streams
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(UpstreamError::Unexpected("script exhausted".to_string())))?;
        let stream = futures::stream::iter(fragments);
        if self.stall {
            Ok(stream.chain(futures::stream::pending()).boxed())
        } else {
            Ok(stream.boxed())
        }
    }
}

/// Sleeper that records requested waits and returns immediately.
#[derive(Default)]
pub(crate) struct RecordingSleeper {
    waits: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub(crate) fn waits(&self) -> Vec<Duration> {
        self.waits.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.waits.lock().unwrap().push(duration);
    }
}

/// Sleeper whose waits never finish; `entered` fires when one starts.
#[derive(Default)]
pub(crate) struct PendingSleeper {
    pub(crate) entered: Notify,
}

#[async_trait]
impl Sleeper for PendingSleeper {
    async fn sleep(&self, _duration: Duration) {
        self.entered.notify_one();
        futures::future::pending::<()>().await;
    }
}

/// Transcript store backed by a vector; timestamps come from insertion order.
#[derive(Default)]
pub(crate) struct MemoryStore {
    entries: Mutex<Vec<TranscriptEntry>>,
}

impl MemoryStore {
    pub(crate) fn entries(&self) -> Vec<TranscriptEntry> {
        self.entries.lock().unwrap().clone()
    }
}

#[async_trait]
impl TranscriptStore for MemoryStore {
    async fn append(
        &self,
        participant_id: &str,
        message: &Message,
    ) -> Result<TranscriptEntry, TranscriptError> {
        let entry = TranscriptEntry::new(participant_id, message);
        self.entries.lock().unwrap().push(entry.clone());
        Ok(entry)
    }

    async fn history(&self, participant_id: &str) -> Result<Vec<TranscriptEntry>, TranscriptError> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.participant_id == participant_id)
            .cloned()
            .collect())
    }
}
