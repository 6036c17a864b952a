//! Interactive chat module
//!
//! Provides a line-editor based console conversation with one condition.

mod repl;

pub use repl::{ChatRepl, END_COMMAND};
