//! Event-stream output for streamed replies

mod relay;

pub use relay::{DEFAULT_FRAME_BUFFER, SseRelay};
