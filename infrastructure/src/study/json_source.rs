//! Study documents stored as JSON files.

use async_trait::async_trait;
use relay_application::{StudyConfigError, StudyConfigSource};
use relay_domain::StudyConfig;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

/// Reads study documents from the local filesystem.
///
/// Accepts both the structured `{study_metadata, conditions}` document and
/// the legacy bare array of conditions.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonStudyConfigSource;

#[async_trait]
impl StudyConfigSource for JsonStudyConfigSource {
    async fn load(&self, path: &Path) -> Result<StudyConfig, StudyConfigError> {
        debug!(path = %path.display(), "Reading study document");
        let text = tokio::fs::read_to_string(path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => StudyConfigError::NotFound(path.to_path_buf()),
            _ => StudyConfigError::Io {
                path: path.to_path_buf(),
                message: e.to_string(),
            },
        })?;

        StudyConfig::from_json(&text).map_err(|e| StudyConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn loads_structured_document() {
        let file = write(
            r#"{
                "study_metadata": {
                    "default_model_params": {"temperature": 1.0},
                    "identity_protection": {"enabled": true}
                },
                "conditions": [
                    {"id": "a", "name": "Warm", "system_prompt": {"role": "Be warm."}},
                    {"name": "Cold", "enabled": false}
                ]
            }"#,
        );

        let study = JsonStudyConfigSource.load(file.path()).await.unwrap();
        assert_eq!(study.len(), 2);
        assert_eq!(study.default_model_params.temperature, Some(1.0));
        assert!(study.identity_protection.enabled);
        assert_eq!(study.enabled_indices(), vec![0]);
        assert_eq!(study.conditions[1].id, "condition_1");
    }

    #[tokio::test]
    async fn loads_legacy_array() {
        let file = write(r#"[{"name": "Only"}]"#);
        let study = JsonStudyConfigSource.load(file.path()).await.unwrap();
        assert_eq!(study.len(), 1);
        assert!(!study.identity_protection.enabled);
    }

    #[tokio::test]
    async fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = JsonStudyConfigSource
            .load(&dir.path().join("absent.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, StudyConfigError::NotFound(_)));
    }

    #[tokio::test]
    async fn malformed_json() {
        let file = write("{\"conditions\": [");
        let err = JsonStudyConfigSource.load(file.path()).await.unwrap_err();
        assert!(matches!(err, StudyConfigError::Parse { .. }));
    }
}
