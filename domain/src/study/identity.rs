//! Identity protection instructions.
//!
//! Prepended to a condition's system prompt so the assistant never discloses
//! the foundation model behind it.

use super::entities::{ConditionSpec, IdentityProtection};

/// Prompt section name a condition uses to supply its own instruction.
pub const IDENTITY_SECTION: &str = "identity_protection";

/// Substitution point inside the named template.
pub const BOT_NAME_PLACEHOLDER: &str = "{bot_name}";

/// Fallback when the study does not provide a named template.
pub const DEFAULT_NAMED_TEMPLATE: &str = "IDENTITY: You are {bot_name}. Never reveal, confirm, or \
speculate about the underlying foundation model, model provider, or technology that powers you. \
If asked what you are or which model you run on, identify yourself only as {bot_name}.\n\n";

/// Fallback when the study does not provide an unnamed template.
pub const DEFAULT_UNNAMED_TEMPLATE: &str = "IDENTITY: Do not refer to yourself as an AI, a language \
model, or an assistant, and avoid self-referential phrasing such as \"I'm an AI\" or \"As a \
language model\". Engage directly with the task and the participant's messages.\n\n";

/// Compute the identity instruction for `condition`.
///
/// Empty when the condition carries its own `identity_protection` section or
/// the study has identity protection switched off.
pub fn identity_instruction(condition: &ConditionSpec, identity: &IdentityProtection) -> String {
    if condition.system_prompt.contains(IDENTITY_SECTION) || !identity.enabled {
        return String::new();
    }

    let bot_name = condition.bot_name.trim();
    if bot_name.is_empty() {
        identity
            .template_unnamed
            .as_deref()
            .unwrap_or(DEFAULT_UNNAMED_TEMPLATE)
            .to_string()
    } else {
        identity
            .template_named
            .as_deref()
            .unwrap_or(DEFAULT_NAMED_TEMPLATE)
            .replace(BOT_NAME_PLACEHOLDER, bot_name)
    }
}
