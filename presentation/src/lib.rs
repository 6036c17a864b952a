//! Presentation layer for study-relay
//!
//! This crate contains CLI definitions, console formatting, the event-stream
//! relay for streamed replies, and the interactive chat interface.

pub mod chat;
pub mod cli;
pub mod output;
pub mod progress;
pub mod sse;

// Re-export commonly used types
pub use chat::{ChatRepl, END_COMMAND};
pub use cli::commands::{ChatArgs, Cli, Command, SendArgs, SessionArgs};
pub use output::console::ConsoleFormatter;
pub use progress::spinner::WaitSpinner;
pub use sse::{DEFAULT_FRAME_BUFFER, SseRelay};
