//! Infrastructure layer for study-relay
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration loading.

pub mod azure;
pub mod config;
pub mod study;
pub mod transcript;

// Re-export commonly used types
pub use azure::AzureOpenAiTransport;
pub use config::{
    ConfigLoader, DEFAULT_CONDITIONS_FILE, EnvConfigError, EnvLoader, FileChatConfig, FileConfig,
    FileOutputConfig, FileStudyConfig, FileTranscriptConfig,
};
pub use study::JsonStudyConfigSource;
pub use transcript::{JsonlTranscriptStore, MemoryTranscriptStore};
