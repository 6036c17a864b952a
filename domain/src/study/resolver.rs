//! Condition configuration resolution.
//!
//! Merges study-wide defaults, the condition's own overrides and identity
//! protection into a [`ResolvedConfig`].

use super::entities::StudyConfig;
use super::error::ResolveError;
use super::identity::identity_instruction;
use super::resolved::{
    EnvDefaults, FALLBACK_MAX_COMPLETION_TOKENS, FALLBACK_TEMPERATURE, Resolution,
    ResolveWarning, ResolvedConfig,
};

/// Resolve condition `index` of `study` against the environment defaults.
///
/// Pure and deterministic; nothing is constructed when the index is invalid.
pub fn resolve_condition(
    index: usize,
    study: &StudyConfig,
    env: &EnvDefaults,
) -> Result<Resolution, ResolveError> {
    let condition = study
        .condition(index)
        .ok_or(ResolveError::InvalidConditionIndex {
            index,
            len: study.len(),
        })?;

    let mut warnings = Vec::new();
    if !condition.enabled {
        warnings.push(ResolveWarning::ConditionDisabled {
            index,
            name: condition.name.clone(),
        });
    }

    let mut system_prompt = identity_instruction(condition, &study.identity_protection);
    system_prompt.push_str(&condition.system_prompt.joined());

    let overrides = condition.model_overrides;
    let defaults = study.default_model_params;

    let config = ResolvedConfig {
        condition_index: index,
        condition_id: condition.id.clone(),
        condition_name: condition.name.clone(),
        condition_description: condition.description.clone(),
        bot_name: condition.bot_name.clone(),
        bot_icon: condition.bot_icon.clone(),
        bot_styles: condition.bot_styles.clone(),
        enabled: condition.enabled,
        system_prompt,
        temperature: overrides
            .temperature
            .or(defaults.temperature)
            .unwrap_or(FALLBACK_TEMPERATURE),
        max_completion_tokens: overrides
            .max_completion_tokens
            .or(defaults.max_completion_tokens)
            .unwrap_or(FALLBACK_MAX_COMPLETION_TOKENS),
        has_temperature_override: overrides.temperature.is_some(),
        has_max_tokens_override: overrides.max_completion_tokens.is_some(),
        deployment: env.deployment.clone(),
        max_retries: env.max_retries,
        retry_delay: env.retry_delay,
        endpoint: env.endpoint.clone(),
        api_version: env.api_version.clone(),
        api_key: env.api_key.clone(),
    };

    Ok(Resolution { config, warnings })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::study::entities::{ConditionSpec, IdentityProtection, ModelParams};
    use crate::study::identity::{DEFAULT_UNNAMED_TEMPLATE, IDENTITY_SECTION};
    use crate::study::resolved::ApiKey;
    use std::time::Duration;

    fn env() -> EnvDefaults {
        EnvDefaults {
            endpoint: "https://example.openai.azure.com".to_string(),
            deployment: "gpt-5-mini".to_string(),
            api_version: "2024-12-01-preview".to_string(),
            api_key: ApiKey::new("secret"),
            max_retries: 5,
            retry_delay: Duration::from_secs(2),
        }
    }

    fn study() -> StudyConfig {
        StudyConfig::new(vec![
            ConditionSpec::new(0)
                .with_name("Named")
                .with_bot_name("Aria")
                .with_section("persona", "Be warm.")
                .with_section("task", "Help plan a trip."),
            ConditionSpec::new(1)
                .with_name("Unnamed")
                .with_bot_name("")
                .with_section("persona", "Be brief.")
                .with_overrides(ModelParams {
                    temperature: Some(0.1),
                    max_completion_tokens: None,
                }),
            ConditionSpec::new(2)
                .with_name("Own identity")
                .with_bot_name("Kai")
                .with_section(IDENTITY_SECTION, "I am Kai.")
                .with_section("persona", "Be curious.")
                .disabled(),
        ])
        .with_identity_protection(IdentityProtection::enabled())
    }

    #[test]
    fn out_of_range_index_is_rejected_with_range() {
        let err = resolve_condition(3, &study(), &env()).unwrap_err();
        assert_eq!(err, ResolveError::InvalidConditionIndex { index: 3, len: 3 });
        assert!(err.to_string().contains("between 0 and 2"));
    }

    #[test]
    fn empty_study_rejects_every_index() {
        for index in [0, 1, usize::MAX] {
            let err = resolve_condition(index, &StudyConfig::default(), &env()).unwrap_err();
            assert_eq!(err, ResolveError::InvalidConditionIndex { index, len: 0 });
            assert!(err.to_string().contains("valid range is empty"));
        }
    }

    #[test]
    fn resolve_is_deterministic() {
        let study = study();
        let env = env();
        for index in 0..study.len() {
            assert_eq!(
                resolve_condition(index, &study, &env).unwrap(),
                resolve_condition(index, &study, &env).unwrap()
            );
        }
    }

    #[test]
    fn named_condition_prompt_starts_with_identity() {
        let config = resolve_condition(0, &study(), &env()).unwrap().config;
        assert!(config.system_prompt.starts_with("IDENTITY: You are Aria."));
        assert!(config.system_prompt.ends_with("\n\nBe warm.\nHelp plan a trip."));
    }

    #[test]
    fn unnamed_condition_gets_unnamed_template() {
        let config = resolve_condition(1, &study(), &env()).unwrap().config;
        assert_eq!(
            config.system_prompt,
            format!("{}Be brief.", DEFAULT_UNNAMED_TEMPLATE)
        );
    }

    #[test]
    fn own_identity_section_skips_injection() {
        let config = resolve_condition(2, &study(), &env()).unwrap().config;
        assert_eq!(config.system_prompt, "I am Kai.\nBe curious.");
    }

    #[test]
    fn disabled_condition_resolves_with_warning() {
        let resolution = resolve_condition(2, &study(), &env()).unwrap();
        assert!(!resolution.config.enabled);
        assert_eq!(
            resolution.warnings,
            vec![ResolveWarning::ConditionDisabled {
                index: 2,
                name: "Own identity".to_string()
            }]
        );
        assert!(resolve_condition(0, &study(), &env()).unwrap().warnings.is_empty());
    }

    #[test]
    fn model_params_follow_override_precedence() {
        let study = study().with_default_params(ModelParams {
            temperature: Some(1.0),
            max_completion_tokens: Some(2500),
        });

        let defaults = resolve_condition(0, &study, &env()).unwrap().config;
        assert_eq!(defaults.temperature, 1.0);
        assert_eq!(defaults.max_completion_tokens, 2500);
        assert!(!defaults.has_temperature_override);
        assert!(!defaults.has_max_tokens_override);

        let overridden = resolve_condition(1, &study, &env()).unwrap().config;
        assert_eq!(overridden.temperature, 0.1);
        assert_eq!(overridden.max_completion_tokens, 2500);
        assert!(overridden.has_temperature_override);
        assert!(!overridden.has_max_tokens_override);
    }

    #[test]
    fn literal_fallbacks_apply_without_defaults() {
        let config = resolve_condition(0, &study(), &env()).unwrap().config;
        assert_eq!(config.temperature, FALLBACK_TEMPERATURE);
        assert_eq!(config.max_completion_tokens, FALLBACK_MAX_COMPLETION_TOKENS);
    }

    #[test]
    fn deployment_parameters_come_from_env() {
        let config = resolve_condition(1, &study(), &env()).unwrap().config;
        assert_eq!(config.deployment, "gpt-5-mini");
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.retry_delay, Duration::from_secs(2));
        assert_eq!(config.endpoint, "https://example.openai.azure.com");
        assert_eq!(config.api_version, "2024-12-01-preview");
        assert_eq!(config.api_key.expose(), "secret");
    }

    #[test]
    fn identity_disabled_study_uses_plain_prompt() {
        let study = study().with_identity_protection(IdentityProtection::disabled());
        let config = resolve_condition(0, &study, &env()).unwrap().config;
        assert_eq!(config.system_prompt, "Be warm.\nHelp plan a trip.");
    }
}
