//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod completion_transport;
pub mod fragment_sink;
pub mod sleeper;
pub mod study_config_source;
pub mod transcript_store;
