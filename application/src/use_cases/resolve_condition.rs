//! Resolve a condition from a cached study file.

use crate::ports::study_config_source::StudyConfigError;
use crate::use_cases::study_cache::StudyConfigCache;
use relay_domain::{EnvDefaults, ResolveError, ResolvedConfig, StudyConfig, resolve_condition};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ConditionLookupError {
    #[error(transparent)]
    Study(#[from] StudyConfigError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// Resolves conditions of one study file against fixed deployment defaults.
pub struct ConditionResolver {
    cache: Arc<StudyConfigCache>,
    study_path: PathBuf,
    env: EnvDefaults,
}

impl ConditionResolver {
    pub fn new(cache: Arc<StudyConfigCache>, study_path: impl Into<PathBuf>, env: EnvDefaults) -> Self {
        Self {
            cache,
            study_path: study_path.into(),
            env,
        }
    }

    pub async fn study(&self) -> Result<Arc<StudyConfig>, ConditionLookupError> {
        Ok(self.cache.get(&self.study_path).await?)
    }

    /// Resolve `index`, logging any advisory warnings.
    pub async fn resolve(&self, index: usize) -> Result<ResolvedConfig, ConditionLookupError> {
        let study = self.study().await?;
        let resolution = resolve_condition(index, &study, &self.env)?;
        for warning in &resolution.warnings {
            warn!("Resolved {}", warning);
        }
        info!(
            index,
            condition = %resolution.config.condition_name,
            temperature = resolution.config.temperature,
            max_completion_tokens = resolution.config.max_completion_tokens,
            "Resolved condition"
        );
        Ok(resolution.config)
    }
}
