//! Blocking completion with bounded retry.
//!
//! Runs attempts strictly one after another; each attempt is classified and
//! handed to the domain [`RetryPolicy`](relay_domain::RetryPolicy) which picks
//! the wait before the next one.

use crate::config::CompletionParams;
use crate::ports::completion_transport::CompletionTransport;
use crate::ports::sleeper::{Sleeper, TokioSleeper};
use crate::use_cases::shared::{CompletionError, cancellable};
use relay_domain::{AttemptOutcome, ErrorKind, Message, RetryDecision, RetryState};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Successful completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    /// Attempts used, including the successful one.
    pub attempts: u32,
}

/// Blocking request/response client for the upstream completion endpoint
pub struct CompletionClient {
    transport: Arc<dyn CompletionTransport>,
    sleeper: Arc<dyn Sleeper>,
    cancellation_token: Option<CancellationToken>,
}

impl CompletionClient {
    pub fn new(transport: Arc<dyn CompletionTransport>) -> Self {
        Self {
            transport,
            sleeper: Arc::new(TokioSleeper),
            cancellation_token: None,
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Set a cancellation token tied to the surrounding request
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    /// Send `conversation` upstream and return the first non-empty reply.
    pub async fn complete(
        &self,
        conversation: &[Message],
        params: &CompletionParams,
    ) -> Result<Completion, CompletionError> {
        let policy = params.retry_policy();
        let request = params.request(conversation);
        let max = policy.max_retries();
        let mut state = RetryState::new();

        debug!(
            deployment = %params.deployment,
            messages = conversation.len(),
            max_retries = max,
            "Requesting completion"
        );

        while state.attempt < max {
            let attempt = state.attempt;
            let result = cancellable(&self.cancellation_token, self.transport.complete(&request))
                .await?;

            let kind = match result {
                Ok(text) if !text.trim().is_empty() => {
                    info!(attempt = attempt + 1, max, "Completion received");
                    return Ok(Completion {
                        text,
                        attempts: attempt + 1,
                    });
                }
                Ok(_) => {
                    warn!("Empty response on attempt {}/{}", attempt + 1, max);
                    ErrorKind::EmptyResponse
                }
                Err(e) => {
                    warn!("{} on attempt {}/{}", e, attempt + 1, max);
                    e.kind()
                }
            };
            state.record_failure(kind);

            match policy.decide(attempt, AttemptOutcome::Failed(kind)) {
                RetryDecision::RetryAfter(delay) => {
                    info!("Waiting {:.1}s before retry", delay.as_secs_f64());
                    cancellable(&self.cancellation_token, self.sleeper.sleep(delay)).await?;
                }
                RetryDecision::Abort(_) => {
                    warn!("Content filter triggered; not retrying");
                    return Err(CompletionError::ContentFiltered);
                }
                RetryDecision::Exhausted | RetryDecision::Finish => break,
            }
        }

        warn!("All retry attempts failed");
        Err(CompletionError::Exhausted {
            attempts: state.attempts(),
            last_error: state.last_error,
        })
    }
}
