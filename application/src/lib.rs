//! Application layer for study-relay
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::CompletionParams;
pub use ports::{
    completion_transport::{CompletionRequest, CompletionTransport, FragmentStream, UpstreamError},
    fragment_sink::{FnSink, FragmentSink, SinkClosed},
    sleeper::{Sleeper, TokioSleeper},
    study_config_source::{StudyConfigError, StudyConfigSource},
    transcript_store::{TranscriptEntry, TranscriptError, TranscriptStore},
};
pub use use_cases::chat_turn::{ChatTurnError, ChatTurnUseCase, TASK_INACTIVE_MARKER, TurnReply};
pub use use_cases::complete_chat::{Completion, CompletionClient};
pub use use_cases::resolve_condition::{ConditionLookupError, ConditionResolver};
pub use use_cases::select_condition::{SelectError, select_condition};
pub use use_cases::shared::CompletionError;
pub use use_cases::stream_chat::{StreamMetrics, StreamSummary, StreamingCompletionClient};
pub use use_cases::study_cache::StudyConfigCache;
