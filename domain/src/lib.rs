//! Domain layer for study-relay
//!
//! This crate contains the core rules of the experiment relay: study and
//! condition configuration, conversation transformations, the retry policy
//! for upstream completions and the event-stream framing literals.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! - **Condition**: one arm of the experiment, defining a system prompt and
//!   optional model-parameter overrides.
//! - **Resolved configuration**: the merged, ready-to-use parameter set for
//!   one condition.
//! - **Task override**: a system instruction that stops the assistant from
//!   working on the study task once the participant has moved on.
//! - **Soft failure**: a retryable attempt outcome, as opposed to a terminal
//!   content-filter rejection or exhaustion.

pub mod conversation;
pub mod retry;
pub mod study;

// Re-export commonly used types
pub use conversation::{
    entities::{Message, Role},
    framing::{
        DONE_SENTINEL, ERROR_SENTINEL, NEWLINE_PLACEHOLDER, StreamTermination, decode_fragment,
        encode_fragment, frame_event, frame_fragment, frame_termination,
    },
    task_override::{OVERRIDE_MARKER, TASK_COMPLETE_OVERRIDE, apply_task_override},
};
pub use retry::policy::{AttemptOutcome, ErrorKind, RetryDecision, RetryPolicy, RetryState};
pub use study::{
    entities::{ConditionSpec, IdentityProtection, ModelParams, PromptSections, StudyConfig},
    error::ResolveError,
    identity::{DEFAULT_NAMED_TEMPLATE, DEFAULT_UNNAMED_TEMPLATE, IDENTITY_SECTION},
    resolved::{ApiKey, EnvDefaults, Resolution, ResolveWarning, ResolvedConfig},
    resolver::resolve_condition,
};
