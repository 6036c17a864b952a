//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod chat_turn;
pub mod complete_chat;
pub mod resolve_condition;
pub mod select_condition;
pub(crate) mod shared;
pub mod stream_chat;
pub mod study_cache;

#[cfg(test)]
pub(crate) mod test_support;
