//! Completion transport port
//!
//! The minimal capability the completion clients need from the upstream
//! endpoint: one request/response exchange, or one incremental stream.
//! Retry, backoff and classification policy live in the clients, not here.

use async_trait::async_trait;
use futures::stream::BoxStream;
use relay_domain::{ErrorKind, Message};
use thiserror::Error;

/// Errors reported by a single upstream exchange
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    #[error("Content filter triggered: {0}")]
    ContentFiltered(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl UpstreamError {
    /// Map onto the retry policy's failure classes.
    pub fn kind(&self) -> ErrorKind {
        match self {
            UpstreamError::ContentFiltered(_) => ErrorKind::ContentFiltered,
            UpstreamError::RateLimited(_) => ErrorKind::RateLimited,
            UpstreamError::Api { .. } => ErrorKind::TransientUpstream,
            UpstreamError::Connection(_) => ErrorKind::Connection,
            UpstreamError::Unexpected(_) => ErrorKind::Unexpected,
        }
    }
}

/// One outbound chat-completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub deployment: String,
    pub messages: Vec<Message>,
    pub temperature: f64,
    pub max_completion_tokens: u32,
}

/// Lazy, finite, single-use sequence of content fragments.
///
/// Polling drives the upstream read, so the consumer controls backpressure.
/// Dropping the stream releases the upstream connection.
pub type FragmentStream = BoxStream<'static, Result<String, UpstreamError>>;

/// Upstream chat-completion endpoint
///
/// Implementations must be safe to share across concurrent requests.
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    /// Issue one blocking request and return the first choice's content.
    ///
    /// A response without choices yields an empty string.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, UpstreamError>;

    /// Open one incremental response stream.
    async fn open_stream(&self, request: &CompletionRequest)
    -> Result<FragmentStream, UpstreamError>;
}
