//! Shared utilities for use cases.
//!
//! Completion errors and the cancellation helper used by both the blocking
//! and the streaming client.

use relay_domain::ErrorKind;
use std::future::Future;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Final failure of a completion call. Raw upstream errors never escape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompletionError {
    #[error("Content filter triggered; the assistant is unavailable for this message")]
    ContentFiltered,

    #[error("All retry attempts failed ({attempts} attempts)")]
    Exhausted {
        attempts: u32,
        last_error: Option<ErrorKind>,
    },

    #[error("Operation cancelled")]
    Cancelled,
}

impl CompletionError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CompletionError::Cancelled)
    }
}

/// Run `fut` unless `token` fires first.
///
/// Losing the race drops `fut`, which aborts an in-flight request or timer.
pub(crate) async fn cancellable<F: Future>(
    token: &Option<CancellationToken>,
    fut: F,
) -> Result<F::Output, CompletionError> {
    match token {
        Some(token) => {
            tokio::select! {
                biased;
                _ = token.cancelled() => Err(CompletionError::Cancelled),
                output = fut => Ok(output),
            }
        }
        None => Ok(fut.await),
    }
}
