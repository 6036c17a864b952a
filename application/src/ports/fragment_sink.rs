//! Fragment sink port
//!
//! Receives streamed content fragments, one call per fragment, in upstream
//! order. A sink that reports [`SinkClosed`] ends the operation (for example
//! when the client connection went away).

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Fragment sink closed")]
pub struct SinkClosed;

#[async_trait]
pub trait FragmentSink: Send {
    async fn accept(&mut self, fragment: &str) -> Result<(), SinkClosed>;
}

#[async_trait]
impl FragmentSink for mpsc::Sender<String> {
    async fn accept(&mut self, fragment: &str) -> Result<(), SinkClosed> {
        self.send(fragment.to_string()).await.map_err(|_| SinkClosed)
    }
}

/// Collects fragments in memory.
#[async_trait]
impl FragmentSink for Vec<String> {
    async fn accept(&mut self, fragment: &str) -> Result<(), SinkClosed> {
        self.push(fragment.to_string());
        Ok(())
    }
}

/// Adapts a plain callback into a sink.
pub struct FnSink<F>(pub F);

#[async_trait]
impl<F> FragmentSink for FnSink<F>
where
    F: FnMut(&str) + Send,
{
    async fn accept(&mut self, fragment: &str) -> Result<(), SinkClosed> {
        (self.0)(fragment);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn channel_sink_reports_closed_receiver() {
        let (mut tx, rx) = mpsc::channel::<String>(1);
        drop(rx);
        assert_eq!(tx.accept("x").await, Err(SinkClosed));
    }

    #[tokio::test]
    async fn callback_sink_sees_each_fragment() {
        let mut seen = Vec::new();
        {
            let mut sink = FnSink(|f: &str| seen.push(f.to_uppercase()));
            sink.accept("a").await.unwrap();
            sink.accept("b").await.unwrap();
        }
        assert_eq!(seen, vec!["A", "B"]);
    }
}
