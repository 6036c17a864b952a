//! Study configuration source port

use async_trait::async_trait;
use relay_domain::StudyConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors while loading a study document
#[derive(Error, Debug)]
pub enum StudyConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read {}: {message}", path.display())]
    Io { path: PathBuf, message: String },

    #[error("Invalid study configuration in {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },
}

/// Loads study documents. Implementations live in the infrastructure layer.
#[async_trait]
pub trait StudyConfigSource: Send + Sync {
    async fn load(&self, path: &Path) -> Result<StudyConfig, StudyConfigError>;
}
