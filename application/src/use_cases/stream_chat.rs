//! Streaming completion with the same retry envelope as the blocking client.
//!
//! Each attempt opens a fresh fragment stream. Fragments go to the sink one at
//! a time, in arrival order, before the next one is polled. Accumulated text
//! and timing metrics start from zero on every attempt.

use crate::config::CompletionParams;
use crate::ports::completion_transport::{CompletionRequest, CompletionTransport};
use crate::ports::fragment_sink::FragmentSink;
use crate::ports::sleeper::{Sleeper, TokioSleeper};
use crate::use_cases::shared::{CompletionError, cancellable};
use futures::StreamExt;
use relay_domain::{AttemptOutcome, ErrorKind, Message, RetryDecision, RetryState};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Timing and volume of the successful attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamMetrics {
    pub time_to_first_fragment: Option<Duration>,
    pub fragment_count: usize,
    pub total_chars: usize,
}

/// Result of a successful streamed completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSummary {
    /// Concatenation of the successful attempt's fragments.
    pub text: String,
    pub metrics: StreamMetrics,
    pub attempts: u32,
}

enum StreamAttempt {
    Completed { text: String, metrics: StreamMetrics },
    Failed(ErrorKind),
}

/// Incremental client for the upstream completion endpoint
pub struct StreamingCompletionClient {
    transport: Arc<dyn CompletionTransport>,
    sleeper: Arc<dyn Sleeper>,
    cancellation_token: Option<CancellationToken>,
}

impl StreamingCompletionClient {
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

    /// Stream a reply for `conversation`, forwarding fragments to `sink`.
    ///
    /// Fragments already forwarded by a failed attempt are not recalled; the
    /// returned summary only covers the attempt that succeeded. A sink that
    /// closes ends the call with [`CompletionError::Cancelled`].
    pub async fn complete_streaming(
        &self,
        conversation: &[Message],
        params: &CompletionParams,
        sink: &mut dyn FragmentSink,
    ) -> Result<StreamSummary, CompletionError> {
        let policy = params.retry_policy();
        let request = params.request(conversation);
        let max = policy.max_retries();
        let mut state = RetryState::new();

        debug!(
            deployment = %params.deployment,
            messages = conversation.len(),
            max_retries = max,
            "Requesting streamed completion"
        );

        while state.attempt < max {
            let attempt = state.attempt;

            let kind = match self.run_attempt(&request, sink).await? {
                StreamAttempt::Completed { text, metrics } => {
                    info!(
                        attempt = attempt + 1,
                        fragments = metrics.fragment_count,
                        chars = metrics.total_chars,
                        "Stream completed"
                    );
                    return Ok(StreamSummary {
                        text,
                        metrics,
                        attempts: attempt + 1,
                    });
                }
                StreamAttempt::Failed(kind) => {
                    warn!("Stream attempt {}/{} failed: {}", attempt + 1, max, kind);
                    kind
                }
            };
            state.record_failure(kind);

            match policy.decide(attempt, AttemptOutcome::Failed(kind)) {
                RetryDecision::RetryAfter(delay) => {
                    info!("Waiting {:.1}s before retry", delay.as_secs_f64());
                    cancellable(&self.cancellation_token, self.sleeper.sleep(delay)).await?;
                }
                RetryDecision::Abort(_) => {
                    warn!("Content filter triggered mid-stream; not retrying");
                    return Err(CompletionError::ContentFiltered);
                }
                RetryDecision::Exhausted | RetryDecision::Finish => break,
            }
        }

        warn!("All streaming attempts failed");
        Err(CompletionError::Exhausted {
            attempts: state.attempts(),
            last_error: state.last_error,
        })
    }

    async fn run_attempt(
        &self,
        request: &CompletionRequest,
        sink: &mut dyn FragmentSink,
    ) -> Result<StreamAttempt, CompletionError> {
        let token = &self.cancellation_token;
        let started = Instant::now();

        let mut stream = match cancellable(token, self.transport.open_stream(request)).await? {
            Ok(stream) => stream,
            Err(e) => {
                debug!("Failed to open stream: {}", e);
                return Ok(StreamAttempt::Failed(e.kind()));
            }
        };

        let mut text = String::new();
        let mut metrics = StreamMetrics::default();

        while let Some(item) = cancellable(token, stream.next()).await? {
            let fragment = match item {
                Ok(fragment) => fragment,
                Err(e) => {
                    debug!("Stream interrupted after {} fragments: {}", metrics.fragment_count, e);
                    return Ok(StreamAttempt::Failed(e.kind()));
                }
            };
            if fragment.is_empty() {
                continue;
            }

            if metrics.time_to_first_fragment.is_none() {
                metrics.time_to_first_fragment = Some(started.elapsed());
            }
            metrics.fragment_count += 1;
            metrics.total_chars += fragment.chars().count();

            cancellable(token, sink.accept(&fragment))
                .await?
                .map_err(|_| CompletionError::Cancelled)?;
            text.push_str(&fragment);
        }

        if text.is_empty() {
            return Ok(StreamAttempt::Failed(ErrorKind::EmptyResponse));
        }
        Ok(StreamAttempt::Completed { text, metrics })
    }
}
