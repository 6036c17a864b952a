//! Wire types for the Azure OpenAI chat-completions API.
//!
//! # Protocol Overview
//!
//! - **Request**: `{messages, temperature, max_completion_tokens, stream}`
//! - **Blocking response**: `choices[0].message.content`
//! - **Streamed response**: server-sent events, one `data: <chunk>` line per
//!   event, each chunk carrying `choices[0].delta.content`; `data: [DONE]`
//!   closes the stream.

use relay_application::UpstreamError;
use relay_domain::Message;
use serde::{Deserialize, Serialize};

/// Finish reason reported when the provider filters generated content.
pub const CONTENT_FILTER_REASON: &str = "content_filter";

/// Terminal payload of a streamed response.
pub const STREAM_DONE: &str = "[DONE]";

#[derive(Debug, Serialize)]
pub struct ChatCompletionBody<'a> {
    pub messages: &'a [Message],
    pub temperature: f64,
    pub max_completion_tokens: u32,
    pub stream: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

impl ChatCompletionResponse {
    /// Content of the first choice; empty when there are no choices.
    pub fn into_content(self) -> String {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub message: Option<ChoiceMessage>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: Option<Delta>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Delta {
    #[serde(default)]
    pub content: Option<String>,
}

/// Meaning of one line of the event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    Fragment(String),
    Done,
    /// Comments, keep-alives, metadata chunks and empty deltas.
    Skip,
}

/// Interpret one event-stream line.
pub fn parse_sse_line(line: &str) -> Result<SseEvent, UpstreamError> {
    let line = line.trim_end_matches('\r');
    let Some(payload) = line.strip_prefix("data:") else {
        return Ok(SseEvent::Skip);
    };
    let payload = payload.trim_start();
    if payload == STREAM_DONE {
        return Ok(SseEvent::Done);
    }
    if payload.is_empty() {
        return Ok(SseEvent::Skip);
    }

    let chunk: ChatCompletionChunk = serde_json::from_str(payload)
        .map_err(|e| UpstreamError::Unexpected(format!("invalid stream chunk: {e}")))?;

    // Azure opens with a chunk of prompt filter results and no choices.
    let Some(choice) = chunk.choices.into_iter().next() else {
        return Ok(SseEvent::Skip);
    };
    if choice.finish_reason.as_deref() == Some(CONTENT_FILTER_REASON) {
        return Err(UpstreamError::ContentFiltered(
            "generation stopped by content filter".to_string(),
        ));
    }
    match choice.delta.and_then(|delta| delta.content) {
        Some(content) if !content.is_empty() => Ok(SseEvent::Fragment(content)),
        _ => Ok(SseEvent::Skip),
    }
}

/// Splits a byte stream into lines, holding partial lines between chunks.
///
/// Works on bytes so a UTF-8 sequence split across chunks is reassembled.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    /// Add a chunk and return every line it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);
        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            lines.push(String::from_utf8_lossy(&line[..line.len() - 1]).into_owned());
        }
        lines
    }

    /// Flush a trailing line that had no newline.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.pending);
        Some(String::from_utf8_lossy(&rest).into_owned())
    }
}
