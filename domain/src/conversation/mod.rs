//! Conversation domain.
//!
//! - [`entities::Message`] — a single message sent upstream
//! - [`task_override`] — task-completion override injection
//! - [`framing`] — event-stream payload encoding and sentinels

pub mod entities;
pub mod framing;
pub mod task_override;
