//! Application-level configuration.
//!
//! [`CompletionParams`] is the slice of a resolved condition the completion
//! clients need: what to ask upstream and how hard to retry.

use crate::ports::completion_transport::CompletionRequest;
use relay_domain::{Message, ResolvedConfig, RetryPolicy};
use std::time::Duration;

/// Parameters for one completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionParams {
    pub deployment: String,
    pub temperature: f64,
    pub max_completion_tokens: u32,
    /// Total number of attempts.
    pub max_retries: u32,
    /// Base wait between attempts.
    pub retry_delay: Duration,
}

impl CompletionParams {
    pub fn new(deployment: impl Into<String>) -> Self {
        Self {
            deployment: deployment.into(),
            temperature: relay_domain::study::resolved::FALLBACK_TEMPERATURE,
            max_completion_tokens: relay_domain::study::resolved::FALLBACK_MAX_COMPLETION_TOKENS,
            max_retries: 5,
            retry_delay: Duration::from_secs(2),
        }
    }

    pub fn with_retries(mut self, max_retries: u32, retry_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_delay = retry_delay;
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, self.retry_delay)
    }

    /// Build the upstream request; `conversation` is copied, never modified.
    pub fn request(&self, conversation: &[Message]) -> CompletionRequest {
        CompletionRequest {
            deployment: self.deployment.clone(),
            messages: conversation.to_vec(),
            temperature: self.temperature,
            max_completion_tokens: self.max_completion_tokens,
        }
    }
}

impl From<&ResolvedConfig> for CompletionParams {
    fn from(config: &ResolvedConfig) -> Self {
        Self {
            deployment: config.deployment.clone(),
            temperature: config.temperature,
            max_completion_tokens: config.max_completion_tokens,
            max_retries: config.max_retries,
            retry_delay: config.retry_delay,
        }
    }
}
