//! Configuration loading for study-relay
//!
//! Two sources: the optional TOML settings file ([`ConfigLoader`]) and the
//! required `MODEL_*` deployment variables ([`EnvLoader`]).
//!
//! TOML priority (highest to lowest):
//!
//! 1. `--config <path>` specified file
//! 2. Project root: `./relay.toml` or `./.relay.toml`
//! 3. Global: `$XDG_CONFIG_HOME/study-relay/config.toml`
//! 4. Default values

mod env;
mod file_config;
mod loader;

pub use env::{ENV_PREFIX, EnvConfigError, EnvLoader, REQUIRED_VARS};
pub use file_config::{
    DEFAULT_CONDITIONS_FILE, FileChatConfig, FileConfig, FileOutputConfig, FileStudyConfig,
    FileTranscriptConfig,
};
pub use loader::ConfigLoader;
