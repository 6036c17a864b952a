//! Transcript store adapters
//!
//! - [`MemoryTranscriptStore`] — process-local, for console sessions and tests
//! - [`JsonlTranscriptStore`] — append-only JSON Lines file

mod jsonl;
mod memory;

pub use jsonl::JsonlTranscriptStore;
pub use memory::MemoryTranscriptStore;
