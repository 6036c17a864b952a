//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! Every field is optional on disk; command-line flags win over these values.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default study document, relative to the working directory.
pub const DEFAULT_CONDITIONS_FILE: &str = "experimental_conditions.json";

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Study document location
    pub study: FileStudyConfig,
    /// Transcript persistence
    pub transcript: FileTranscriptConfig,
    /// Console chat behaviour
    pub chat: FileChatConfig,
    /// Output settings
    pub output: FileOutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStudyConfig {
    pub conditions: PathBuf,
}

impl Default for FileStudyConfig {
    fn default() -> Self {
        Self {
            conditions: PathBuf::from(DEFAULT_CONDITIONS_FILE),
        }
    }
}

/// `[transcript]` section; no path keeps transcripts in memory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileTranscriptConfig {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileChatConfig {
    /// Print replies as they stream in
    pub stream: bool,
    /// Show a spinner while waiting for a blocking reply
    pub show_progress: bool,
}

impl Default for FileChatConfig {
    fn default() -> Self {
        Self {
            stream: false,
            show_progress: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOutputConfig {
    /// Enable colored terminal output
    pub color: bool,
}

impl Default for FileOutputConfig {
    fn default() -> Self {
        Self { color: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[study]
conditions = "studies/pilot.json"

[transcript]
path = "data/transcripts.jsonl"

[chat]
stream = true
show_progress = false

[output]
color = false
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.study.conditions, PathBuf::from("studies/pilot.json"));
        assert_eq!(
            config.transcript.path,
            Some(PathBuf::from("data/transcripts.jsonl"))
        );
        assert!(config.chat.stream);
        assert!(!config.chat.show_progress);
        assert!(!config.output.color);
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: FileConfig = toml::from_str("[chat]\nstream = true\n").unwrap();
        assert!(config.chat.stream);
        assert!(config.chat.show_progress);
        assert_eq!(
            config.study.conditions,
            PathBuf::from(DEFAULT_CONDITIONS_FILE)
        );
        assert!(config.transcript.path.is_none());
        assert!(config.output.color);
    }
}
