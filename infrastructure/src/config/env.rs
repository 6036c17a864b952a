//! Deployment defaults from `MODEL_*` environment variables.

use figment::{Figment, Provider, providers::Env};
use relay_domain::{ApiKey, EnvDefaults};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Prefix shared by every deployment variable.
pub const ENV_PREFIX: &str = "MODEL_";

/// Required variables, in reporting order.
pub const REQUIRED_VARS: [&str; 6] = [
    "MODEL_ENDPOINT",
    "MODEL_DEPLOYMENT",
    "MODEL_API_VERSION",
    "MODEL_SUBSCRIPTION_KEY",
    "MODEL_MAX_RETRIES",
    "MODEL_RETRY_DELAY",
];

#[derive(Error, Debug)]
pub enum EnvConfigError {
    #[error("Missing required environment variables: {}", .0.join(", "))]
    Missing(Vec<String>),

    #[error("Invalid value for {name}: {message}")]
    Invalid { name: String, message: String },

    #[error("Failed to read environment: {0}")]
    Figment(#[from] Box<figment::Error>),
}

/// Raw values; figment parses numeric-looking variables as numbers, so every
/// field is taken as a loose JSON value and normalised afterwards.
#[derive(Debug, Default, Deserialize)]
struct RawEnv {
    endpoint: Option<Value>,
    deployment: Option<Value>,
    api_version: Option<Value>,
    subscription_key: Option<Value>,
    max_retries: Option<Value>,
    retry_delay: Option<Value>,
}

pub struct EnvLoader;

impl EnvLoader {
    /// Read the deployment defaults from the process environment.
    pub fn load() -> Result<EnvDefaults, EnvConfigError> {
        Self::load_from(Env::prefixed(ENV_PREFIX))
    }

    /// Read the deployment defaults from any figment provider keyed like the
    /// environment with its prefix stripped (`endpoint`, `max_retries`, ...).
    pub fn load_from(provider: impl Provider) -> Result<EnvDefaults, EnvConfigError> {
        let raw: RawEnv = Figment::from(provider).extract().map_err(Box::new)?;

        let fields = [
            &raw.endpoint,
            &raw.deployment,
            &raw.api_version,
            &raw.subscription_key,
            &raw.max_retries,
            &raw.retry_delay,
        ];
        let missing: Vec<String> = REQUIRED_VARS
            .iter()
            .zip(fields)
            .filter(|(_, value)| text(value).is_none_or(|s| s.is_empty()))
            .map(|(name, _)| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(EnvConfigError::Missing(missing));
        }

        let max_retries = parse_field::<u32>("MODEL_MAX_RETRIES", &raw.max_retries)?;
        let retry_delay = parse_field::<f64>("MODEL_RETRY_DELAY", &raw.retry_delay)?;
        let retry_delay = Duration::try_from_secs_f64(retry_delay).map_err(|e| {
            EnvConfigError::Invalid {
                name: "MODEL_RETRY_DELAY".to_string(),
                message: e.to_string(),
            }
        })?;

        Ok(EnvDefaults {
            endpoint: text(&raw.endpoint).unwrap_or_default(),
            deployment: text(&raw.deployment).unwrap_or_default(),
            api_version: text(&raw.api_version).unwrap_or_default(),
            api_key: ApiKey::new(text(&raw.subscription_key).unwrap_or_default()),
            max_retries,
            retry_delay,
        })
    }
}

fn text(value: &Option<Value>) -> Option<String> {
    match value.as_ref()? {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn parse_field<T>(name: &str, value: &Option<Value>) -> Result<T, EnvConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = text(value).unwrap_or_default();
    raw.parse().map_err(|e: T::Err| EnvConfigError::Invalid {
        name: name.to_string(),
        message: format!("'{raw}': {e}"),
    })
}
