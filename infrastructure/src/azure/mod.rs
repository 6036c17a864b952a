//! Azure OpenAI chat-completions adapter
//!
//! - [`transport`] — reqwest-based [`CompletionTransport`](relay_application::CompletionTransport)
//! - [`protocol`] — request/response and event-stream wire types
//! - [`error`] — HTTP failure classification

pub mod error;
pub mod protocol;
pub mod transport;

pub use transport::AzureOpenAiTransport;
