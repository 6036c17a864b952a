//! Line-delimited event-stream framing for streamed responses.
//!
//! Each event is `data: <payload>\n\n`. Payloads cannot carry raw newlines, so
//! fragments have them replaced with [`NEWLINE_PLACEHOLDER`] and the client
//! restores them.

/// Placeholder substituted for `\n` inside fragment payloads.
pub const NEWLINE_PLACEHOLDER: &str = "<NEWLINE>";

/// Payload sent after every fragment was delivered and the text accumulated.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Payload sent when no response could be obtained.
pub const ERROR_SENTINEL: &str = "[ERROR]";

/// Terminal state of a streamed response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamTermination {
    Done,
    Error,
}

impl StreamTermination {
    pub fn sentinel(&self) -> &'static str {
        match self {
            StreamTermination::Done => DONE_SENTINEL,
            StreamTermination::Error => ERROR_SENTINEL,
        }
    }
}

/// Replace literal newlines with the transport placeholder.
pub fn encode_fragment(fragment: &str) -> String {
    fragment.replace('\n', NEWLINE_PLACEHOLDER)
}

/// Reverse of [`encode_fragment`].
pub fn decode_fragment(payload: &str) -> String {
    payload.replace(NEWLINE_PLACEHOLDER, "\n")
}

/// Frame an already-encoded payload as one event.
pub fn frame_event(payload: &str) -> String {
    format!("data: {payload}\n\n")
}

/// Encode and frame a content fragment.
pub fn frame_fragment(fragment: &str) -> String {
    frame_event(&encode_fragment(fragment))
}

/// Frame the terminal sentinel.
pub fn frame_termination(termination: StreamTermination) -> String {
    frame_event(termination.sentinel())
}
