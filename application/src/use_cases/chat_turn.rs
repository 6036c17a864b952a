//! One participant turn: persist, build the outbound conversation, call the
//! model, persist the reply.
//!
//! The user message is written to the transcript before the model is called
//! and stays there whatever happens upstream. Whether the study task is still
//! active is decided by the caller on every turn; the transcript marker is an
//! audit record only.

use crate::config::CompletionParams;
use crate::ports::completion_transport::CompletionTransport;
use crate::ports::fragment_sink::FragmentSink;
use crate::ports::sleeper::Sleeper;
use crate::ports::transcript_store::{TranscriptEntry, TranscriptError, TranscriptStore};
use crate::use_cases::complete_chat::CompletionClient;
use crate::use_cases::shared::CompletionError;
use crate::use_cases::stream_chat::{StreamMetrics, StreamingCompletionClient};
use relay_domain::{Message, ResolvedConfig, Role, apply_task_override};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// System transcript entry recording that the participant finished the task.
pub const TASK_INACTIVE_MARKER: &str = "TASK_STATE: inactive - Task completion mode enabled";

#[derive(Error, Debug)]
pub enum ChatTurnError {
    #[error(transparent)]
    Transcript(#[from] TranscriptError),

    /// The user message was saved but no reply could be obtained.
    #[error("Assistant unavailable: {0}")]
    AssistantUnavailable(#[source] CompletionError),
}

/// Assistant reply for one turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnReply {
    pub text: String,
    pub attempts: u32,
    /// Present for streamed replies.
    pub metrics: Option<StreamMetrics>,
}

pub struct ChatTurnUseCase {
    store: Arc<dyn TranscriptStore>,
    client: CompletionClient,
    streaming: StreamingCompletionClient,
}

impl ChatTurnUseCase {
    pub fn new(store: Arc<dyn TranscriptStore>, transport: Arc<dyn CompletionTransport>) -> Self {
        Self {
            store,
            client: CompletionClient::new(Arc::clone(&transport)),
            streaming: StreamingCompletionClient::new(transport),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.client = self.client.with_sleeper(Arc::clone(&sleeper));
        self.streaming = self.streaming.with_sleeper(sleeper);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.client = self.client.with_cancellation(token.clone());
        self.streaming = self.streaming.with_cancellation(token);
        self
    }

    /// Record the condition's system prompt as the first transcript entry.
    ///
    /// Returns `false` when the participant already has history.
    pub async fn start_session(
        &self,
        participant_id: &str,
        config: &ResolvedConfig,
    ) -> Result<bool, ChatTurnError> {
        if !self.store.history(participant_id).await?.is_empty() {
            return Ok(false);
        }
        self.store
            .append(participant_id, &Message::system(&config.system_prompt))
            .await?;
        info!(
            participant = participant_id,
            condition = %config.condition_id,
            "Session started"
        );
        Ok(true)
    }

    /// Record in the transcript that the participant entered task-complete mode.
    ///
    /// The marker is for later review and does not change how turns are sent.
    /// Returns `false` when the last entry already is the marker.
    pub async fn mark_task_inactive(&self, participant_id: &str) -> Result<bool, ChatTurnError> {
        let history = self.store.history(participant_id).await?;
        if history.last().is_some_and(is_task_marker) {
            return Ok(false);
        }
        self.store
            .append(participant_id, &Message::system(TASK_INACTIVE_MARKER))
            .await?;
        info!(participant = participant_id, "Task marked inactive");
        Ok(true)
    }

    /// Full transcript for `participant_id`.
    pub async fn history(&self, participant_id: &str) -> Result<Vec<TranscriptEntry>, ChatTurnError> {
        Ok(self.store.history(participant_id).await?)
    }

    /// Send `text` and wait for the complete reply.
    ///
    /// With `task_active == false` the task-complete override is injected.
    pub async fn send(
        &self,
        participant_id: &str,
        text: &str,
        task_active: bool,
        params: &CompletionParams,
    ) -> Result<TurnReply, ChatTurnError> {
        let conversation = self.prepare(participant_id, text, task_active).await?;
        let completion = self
            .client
            .complete(&conversation, params)
            .await
            .map_err(|e| unavailable(participant_id, e))?;

        self.store
            .append(participant_id, &Message::assistant(&completion.text))
            .await?;
        Ok(TurnReply {
            text: completion.text,
            attempts: completion.attempts,
            metrics: None,
        })
    }

    /// Send `text` and forward the reply to `sink` as it arrives.
    ///
    /// The reply is persisted only once the stream has completed.
    pub async fn send_streaming(
        &self,
        participant_id: &str,
        text: &str,
        task_active: bool,
        params: &CompletionParams,
        sink: &mut dyn FragmentSink,
    ) -> Result<TurnReply, ChatTurnError> {
        let conversation = self.prepare(participant_id, text, task_active).await?;
        let summary = self
            .streaming
            .complete_streaming(&conversation, params, sink)
            .await
            .map_err(|e| unavailable(participant_id, e))?;

        self.store
            .append(participant_id, &Message::assistant(&summary.text))
            .await?;
        Ok(TurnReply {
            text: summary.text,
            attempts: summary.attempts,
            metrics: Some(summary.metrics),
        })
    }

    async fn prepare(
        &self,
        participant_id: &str,
        text: &str,
        task_active: bool,
    ) -> Result<Vec<Message>, ChatTurnError> {
        self.store
            .append(participant_id, &Message::user(text))
            .await?;
        let history = self.store.history(participant_id).await?;

        let conversation: Vec<Message> = history
            .iter()
            .filter(|entry| !is_task_marker(entry))
            .map(TranscriptEntry::to_message)
            .collect();
        Ok(apply_task_override(&conversation, task_active))
    }
}

fn is_task_marker(entry: &TranscriptEntry) -> bool {
    entry.role == Role::System && entry.content == TASK_INACTIVE_MARKER
}

fn unavailable(participant_id: &str, error: CompletionError) -> ChatTurnError {
    warn!(participant = participant_id, "No assistant reply: {}", error);
    ChatTurnError::AssistantUnavailable(error)
}
