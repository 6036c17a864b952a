//! Study configuration entities
//!
//! A study document lists the experimental conditions plus study-wide
//! defaults. Both the structured form and the legacy bare array of
//! conditions are accepted.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Ordered system prompt sections (section name → text).
///
/// Document order is preserved; it decides the order sections are joined in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptSections(Vec<(String, String)>);

impl PromptSections {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_section(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(name, text);
        self
    }

    /// Insert a section; an existing name keeps its position and gets the new text.
    pub fn insert(&mut self, name: impl Into<String>, text: impl Into<String>) {
        let name = name.into();
        let text = text.into();
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = text,
            None => self.0.push((name, text)),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|(n, _)| n == name)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, text)| text.as_str())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Section texts joined with newlines, in document order.
    pub fn joined(&self) -> String {
        self.0
            .iter()
            .map(|(_, text)| text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Serialize for PromptSections {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, text) in &self.0 {
            map.serialize_entry(name, text)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for PromptSections {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SectionsVisitor;

        impl<'de> Visitor<'de> for SectionsVisitor {
            type Value = PromptSections;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of prompt section names to text")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut sections = PromptSections::new();
                while let Some((name, text)) = access.next_entry::<String, String>()? {
                    sections.insert(name, text);
                }
                Ok(sections)
            }
        }

        deserializer.deserialize_map(SectionsVisitor)
    }
}

/// Sampling parameters, used both for study defaults and condition overrides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelParams {
    pub temperature: Option<f64>,
    pub max_completion_tokens: Option<u32>,
}

/// Study-level identity protection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityProtection {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Template used when the condition names its bot; `{bot_name}` is substituted.
    #[serde(default)]
    pub template_named: Option<String>,
    #[serde(default)]
    pub template_unnamed: Option<String>,
}

impl IdentityProtection {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            template_named: None,
            template_unnamed: None,
        }
    }

    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Self::disabled()
        }
    }
}

impl Default for IdentityProtection {
    fn default() -> Self {
        Self::disabled()
    }
}

fn default_true() -> bool {
    true
}

/// One experimental condition (Entity)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionSpec {
    pub id: String,
    pub name: String,
    pub description: String,
    pub bot_name: String,
    pub bot_icon: String,
    pub bot_styles: serde_json::Value,
    pub system_prompt: PromptSections,
    pub model_overrides: ModelParams,
    pub enabled: bool,
}

impl ConditionSpec {
    /// A condition with the same defaults a sparse document entry gets.
    pub fn new(index: usize) -> Self {
        RawCondition::default().into_spec(index)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_bot_name(mut self, bot_name: impl Into<String>) -> Self {
        self.bot_name = bot_name.into();
        self
    }

    pub fn with_section(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.system_prompt.insert(name, text);
        self
    }

    pub fn with_overrides(mut self, overrides: ModelParams) -> Self {
        self.model_overrides = overrides;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Study configuration (Aggregate root, immutable after load)
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "StudyDocument")]
pub struct StudyConfig {
    pub conditions: Vec<ConditionSpec>,
    pub default_model_params: ModelParams,
    pub identity_protection: IdentityProtection,
}

impl StudyConfig {
    pub fn new(conditions: Vec<ConditionSpec>) -> Self {
        Self {
            conditions,
            ..Self::default()
        }
    }

    pub fn with_default_params(mut self, params: ModelParams) -> Self {
        self.default_model_params = params;
        self
    }

    pub fn with_identity_protection(mut self, identity: IdentityProtection) -> Self {
        self.identity_protection = identity;
        self
    }

    /// Parse a study document from JSON text.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn condition(&self, index: usize) -> Option<&ConditionSpec> {
        self.conditions.get(index)
    }

    /// Indices of all enabled conditions, ascending.
    pub fn enabled_indices(&self) -> Vec<usize> {
        self.conditions
            .iter()
            .enumerate()
            .filter(|(_, c)| c.enabled)
            .map(|(i, _)| i)
            .collect()
    }
}

// ==================== Document shapes ====================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCondition {
    id: Option<String>,
    name: Option<String>,
    description: Option<String>,
    bot_name: Option<String>,
    bot_icon: Option<String>,
    bot_styles: Option<serde_json::Value>,
    system_prompt: PromptSections,
    model_overrides: ModelParams,
    enabled: Option<bool>,
}

impl RawCondition {
    fn into_spec(self, index: usize) -> ConditionSpec {
        ConditionSpec {
            id: self.id.unwrap_or_else(|| format!("condition_{index}")),
            name: self.name.unwrap_or_else(|| "Unknown".to_string()),
            description: self.description.unwrap_or_default(),
            bot_name: self.bot_name.unwrap_or_else(|| "Assistant".to_string()),
            bot_icon: self.bot_icon.unwrap_or_default(),
            bot_styles: self
                .bot_styles
                .unwrap_or_else(|| serde_json::Value::Object(serde_json::Map::new())),
            system_prompt: self.system_prompt,
            model_overrides: self.model_overrides,
            enabled: self.enabled.unwrap_or(true),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StudyMetadata {
    default_model_params: ModelParams,
    identity_protection: Option<IdentityProtection>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StudyDocument {
    Legacy(Vec<RawCondition>),
    Structured {
        #[serde(default)]
        study_metadata: StudyMetadata,
        conditions: Vec<RawCondition>,
    },
}

impl From<StudyDocument> for StudyConfig {
    fn from(document: StudyDocument) -> Self {
        let (metadata, raw) = match document {
            StudyDocument::Structured {
                study_metadata,
                conditions,
            } => (study_metadata, conditions),
            StudyDocument::Legacy(conditions) => (StudyMetadata::default(), conditions),
        };

        Self {
            conditions: raw
                .into_iter()
                .enumerate()
                .map(|(i, c)| c.into_spec(i))
                .collect(),
            default_model_params: metadata.default_model_params,
            identity_protection: metadata.identity_protection.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STRUCTURED: &str = r#"{
        "study_metadata": {
            "default_model_params": {"temperature": 1.0, "max_completion_tokens": 2500},
            "identity_protection": {"template_named": "You are {bot_name}.\n"}
        },
        "conditions": [
            {
                "id": "warm",
                "name": "Warm",
                "bot_name": "Aria",
                "bot_icon": "🌞",
                "bot_styles": {"color": "orange"},
                "system_prompt": {"zeta": "Z", "alpha": "A", "mid": "M"},
                "model_overrides": {"temperature": 0.2}
            },
            {"system_prompt": {"role": "R"}, "enabled": false}
        ]
    }"#;

    #[test]
    fn parses_structured_document() {
        let study = StudyConfig::from_json(STRUCTURED).unwrap();

        assert_eq!(study.len(), 2);
        assert_eq!(study.default_model_params.temperature, Some(1.0));
        assert_eq!(study.default_model_params.max_completion_tokens, Some(2500));
        assert!(study.identity_protection.enabled);
        assert_eq!(
            study.identity_protection.template_named.as_deref(),
            Some("You are {bot_name}.\n")
        );
        assert_eq!(study.identity_protection.template_unnamed, None);

        let warm = &study.conditions[0];
        assert_eq!(warm.id, "warm");
        assert_eq!(warm.bot_name, "Aria");
        assert_eq!(warm.bot_styles["color"], "orange");
        assert_eq!(warm.model_overrides.temperature, Some(0.2));
        assert_eq!(warm.model_overrides.max_completion_tokens, None);
        assert!(warm.enabled);
    }

    #[test]
    fn section_order_follows_document() {
        let study = StudyConfig::from_json(STRUCTURED).unwrap();
        let names: Vec<_> = study.conditions[0].system_prompt.names().collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
        assert_eq!(study.conditions[0].system_prompt.joined(), "Z\nA\nM");
    }

    #[test]
    fn sparse_condition_gets_defaults() {
        let study = StudyConfig::from_json(STRUCTURED).unwrap();
        let sparse = &study.conditions[1];

        assert_eq!(sparse.id, "condition_1");
        assert_eq!(sparse.name, "Unknown");
        assert_eq!(sparse.bot_name, "Assistant");
        assert_eq!(sparse.bot_icon, "");
        assert!(sparse.bot_styles.as_object().unwrap().is_empty());
        assert!(!sparse.enabled);
        assert_eq!(study.enabled_indices(), vec![0]);
    }

    #[test]
    fn parses_legacy_array_document() {
        let study = StudyConfig::from_json(
            r#"[{"name": "A", "system_prompt": {"s": "one"}}, {"name": "B", "system_prompt": {}}]"#,
        )
        .unwrap();

        assert_eq!(study.len(), 2);
        assert_eq!(study.conditions[1].name, "B");
        assert!(!study.identity_protection.enabled);
        assert_eq!(study.default_model_params, ModelParams::default());
    }

    #[test]
    fn identity_block_absent_means_disabled() {
        let study = StudyConfig::from_json(r#"{"conditions": []}"#).unwrap();
        assert!(!study.identity_protection.enabled);
        assert!(study.is_empty());
    }

    #[test]
    fn prompt_sections_roundtrip_keeps_order() {
        let sections = PromptSections::new()
            .with_section("b", "2")
            .with_section("a", "1");
        let json = serde_json::to_string(&sections).unwrap();
        assert_eq!(json, r#"{"b":"2","a":"1"}"#);
    }

    #[test]
    fn reinserting_section_keeps_position() {
        let mut sections = PromptSections::new()
            .with_section("a", "1")
            .with_section("b", "2");
        sections.insert("a", "updated");
        assert_eq!(sections.joined(), "updated\n2");
        assert_eq!(sections.get("a"), Some("updated"));
    }
}
