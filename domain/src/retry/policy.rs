//! Retry/backoff policy for upstream completion attempts.
//!
//! Each attempt ends in an [`AttemptOutcome`]; [`RetryPolicy::decide`] turns it
//! into the next step. Keeping this free of I/O lets the blocking and streaming
//! clients share one policy and lets it be tested without a network.

use std::fmt;
use std::time::Duration;

/// Classified failure of a single attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The upstream answered, but with no usable text.
    EmptyResponse,
    /// Content policy rejection. Retrying cannot succeed.
    ContentFiltered,
    RateLimited,
    TransientUpstream,
    Connection,
    /// Anything the transport could not classify.
    Unexpected,
}

impl ErrorKind {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ErrorKind::ContentFiltered)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::EmptyResponse => "empty response",
            ErrorKind::ContentFiltered => "content filtered",
            ErrorKind::RateLimited => "rate limited",
            ErrorKind::TransientUpstream => "upstream error",
            ErrorKind::Connection => "connection error",
            ErrorKind::Unexpected => "unexpected error",
        };
        f.write_str(s)
    }
}

/// What one attempt produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    Failed(ErrorKind),
}

/// Next step after an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Terminal success.
    Finish,
    /// Wait, then run the next attempt.
    RetryAfter(Duration),
    /// Terminal failure; no further attempts.
    Abort(ErrorKind),
    /// No attempts left.
    Exhausted,
}

/// Bounded retry with constant or exponential waits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    retry_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, retry_delay: Duration) -> Self {
        Self {
            max_retries,
            retry_delay,
        }
    }

    /// Total number of attempts allowed.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn retry_delay(&self) -> Duration {
        self.retry_delay
    }

    /// Wait before the attempt following `attempt` (0-indexed) failed with `kind`.
    ///
    /// Rate limits back off exponentially (`delay * 2^attempt`); everything
    /// else waits the constant delay.
    pub fn backoff(&self, attempt: u32, kind: ErrorKind) -> Duration {
        match kind {
            ErrorKind::RateLimited => self
                .retry_delay
                .saturating_mul(2u32.saturating_pow(attempt)),
            _ => self.retry_delay,
        }
    }

    /// Decide what follows `attempt` (0-indexed) ending in `outcome`.
    pub fn decide(&self, attempt: u32, outcome: AttemptOutcome) -> RetryDecision {
        match outcome {
            AttemptOutcome::Success => RetryDecision::Finish,
            AttemptOutcome::Failed(kind) if kind.is_terminal() => RetryDecision::Abort(kind),
            AttemptOutcome::Failed(kind) => {
                if attempt + 1 < self.max_retries {
                    RetryDecision::RetryAfter(self.backoff(attempt, kind))
                } else {
                    RetryDecision::Exhausted
                }
            }
        }
    }
}

/// Per-call attempt bookkeeping. Lives only for one completion call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryState {
    pub attempt: u32,
    pub last_error: Option<ErrorKind>,
}

impl RetryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failed attempt and advance the counter.
    pub fn record_failure(&mut self, kind: ErrorKind) {
        self.last_error = Some(kind);
        self.attempt += 1;
    }

    /// Number of attempts made so far.
    pub fn attempts(&self) -> u32 {
        self.attempt
    }
}
