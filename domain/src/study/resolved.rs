//! Resolved condition configuration (Value Object)

use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Literal fallback when neither the condition nor the study sets a temperature.
pub const FALLBACK_TEMPERATURE: f64 = 0.7;

/// Literal fallback for the completion token limit.
pub const FALLBACK_MAX_COMPLETION_TOKENS: u32 = 2000;

/// Upstream API secret. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Deployment parameters sourced from the host environment.
///
/// These never come from the study document.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvDefaults {
    pub endpoint: String,
    pub deployment: String,
    pub api_version: String,
    pub api_key: ApiKey,
    pub max_retries: u32,
    pub retry_delay: Duration,
}

/// Fully merged parameters for one condition.
///
/// Built fresh by the resolver for every request and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedConfig {
    pub condition_index: usize,
    pub condition_id: String,
    pub condition_name: String,
    pub condition_description: String,
    pub bot_name: String,
    pub bot_icon: String,
    pub bot_styles: serde_json::Value,
    pub enabled: bool,
    pub system_prompt: String,
    pub temperature: f64,
    pub max_completion_tokens: u32,
    pub has_temperature_override: bool,
    pub has_max_tokens_override: bool,
    pub deployment: String,
    pub max_retries: u32,
    #[serde(serialize_with = "serialize_secs")]
    pub retry_delay: Duration,
    pub endpoint: String,
    pub api_version: String,
    #[serde(skip_serializing)]
    pub api_key: ApiKey,
}

fn serialize_secs<S: serde::Serializer>(delay: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(delay.as_secs_f64())
}

/// Non-blocking issues found while resolving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveWarning {
    /// The condition is disabled; resolution still proceeds so it can be previewed.
    ConditionDisabled { index: usize, name: String },
}

impl fmt::Display for ResolveWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveWarning::ConditionDisabled { index, name } => {
                write!(f, "condition {index} ('{name}') is disabled")
            }
        }
    }
}

/// Result of a successful resolve: the config plus advisory warnings.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub config: ResolvedConfig,
    pub warnings: Vec<ResolveWarning>,
}
