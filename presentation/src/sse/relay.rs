//! Event-stream relay for streamed chat turns.
//!
//! Drives one streaming turn and pushes `data:` frames into a channel.
//! Every relay ends with exactly one terminal frame: `[DONE]` once the full
//! reply is accumulated and persisted, `[ERROR]` otherwise.

use async_trait::async_trait;
use relay_application::{
    ChatTurnError, ChatTurnUseCase, CompletionParams, FragmentSink, SinkClosed, TurnReply,
};
use relay_domain::{StreamTermination, frame_fragment, frame_termination};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Frames buffered between the relay task and a slow consumer.
pub const DEFAULT_FRAME_BUFFER: usize = 64;

/// Sink that frames each fragment before handing it on.
struct FramingSink {
    frames: mpsc::Sender<String>,
}

#[async_trait]
impl FragmentSink for FramingSink {
    async fn accept(&mut self, fragment: &str) -> Result<(), SinkClosed> {
        self.frames
            .send(frame_fragment(fragment))
            .await
            .map_err(|_| SinkClosed)
    }
}

pub struct SseRelay {
    turns: Arc<ChatTurnUseCase>,
}

impl SseRelay {
    pub fn new(turns: Arc<ChatTurnUseCase>) -> Self {
        Self { turns }
    }

    /// Run one turn, writing frames to `frames`.
    ///
    /// A consumer that drops its receiver stops the turn; the user message
    /// stays in the transcript either way.
    pub async fn relay(
        &self,
        participant_id: &str,
        text: &str,
        task_active: bool,
        params: &CompletionParams,
        frames: mpsc::Sender<String>,
    ) -> Result<TurnReply, ChatTurnError> {
        let mut sink = FramingSink {
            frames: frames.clone(),
        };
        let result = self
            .turns
            .send_streaming(participant_id, text, task_active, params, &mut sink)
            .await;

        let termination = match &result {
            Ok(_) => StreamTermination::Done,
            Err(_) => StreamTermination::Error,
        };
        if frames.send(frame_termination(termination)).await.is_err() {
            debug!("Stream consumer went away before the terminal frame");
        }
        result
    }

    /// Run one turn on its own task and return the frame receiver.
    pub fn spawn(
        &self,
        participant_id: String,
        text: String,
        task_active: bool,
        params: CompletionParams,
    ) -> (
        mpsc::Receiver<String>,
        JoinHandle<Result<TurnReply, ChatTurnError>>,
    ) {
        let (tx, rx) = mpsc::channel(DEFAULT_FRAME_BUFFER);
        let relay = Self::new(Arc::clone(&self.turns));
        let handle =
            tokio::spawn(async move {
            relay
                .relay(&participant_id, &text, task_active, &params, tx)
                .await
        });
        (rx, handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use relay_application::{
        CompletionRequest, CompletionTransport, FragmentStream, Sleeper, TranscriptEntry,
        TranscriptError, TranscriptStore, UpstreamError,
    };
    use relay_domain::{DONE_SENTINEL, ERROR_SENTINEL, Message, Role};
    use std::sync::Mutex;
    use std::time::Duration;

    struct OneStream(Mutex<Option<Vec<Result<String, UpstreamError>>>>);

    impl OneStream {
        fn new(items: Vec<Result<String, UpstreamError>>) -> Self {
            Self(Mutex::new(Some(items)))
        }
    }

    #[async_trait]
    impl CompletionTransport for OneStream {
        async fn complete(&self, _request: &CompletionRequest) -> Result<String, UpstreamError> {
            Err(UpstreamError::Unexpected("not scripted".to_string()))
        }

        async fn open_stream(
            &self,
            _request: &CompletionRequest,
        ) -> Result<FragmentStream, UpstreamError> {
            let items = self.0.lock().unwrap().take().unwrap_or_default();
            Ok(futures::stream::iter(items).boxed())
        }
    }

    #[derive(Default)]
    struct VecStore(Mutex<Vec<TranscriptEntry>>);

    #[async_trait]
    impl TranscriptStore for VecStore {
        async fn append(
            &self,
            participant_id: &str,
            message: &Message,
        ) -> Result<TranscriptEntry, TranscriptError> {
            let entry = TranscriptEntry::new(participant_id, message);
            self.0.lock().unwrap().push(entry.clone());
            Ok(entry)
        }

        async fn history(
            &self,
            participant_id: &str,
        ) -> Result<Vec<TranscriptEntry>, TranscriptError> {
            Ok(self
                .0
                .lock()
                .unwrap()
                .iter()
                .filter(|e| e.participant_id == participant_id)
                .cloned()
                .collect())
        }
    }

    struct NoWait;

    #[async_trait]
    impl Sleeper for NoWait {
        async fn sleep(&self, _duration: Duration) {}
    }

    fn relay(
        items: Vec<Result<String, UpstreamError>>,
    ) -> (SseRelay, Arc<VecStore>) {
        let store = Arc::new(VecStore::default());
        let turns = ChatTurnUseCase::new(store.clone(), Arc::new(OneStream::new(items)))
            .with_sleeper(Arc::new(NoWait));
        (SseRelay::new(Arc::new(turns)), store)
    }

    fn params(max_retries: u32) -> CompletionParams {
        CompletionParams::new("gpt-5-mini").with_retries(max_retries, Duration::from_millis(1))
    }

    async fn drain(mut rx: mpsc::Receiver<String>) -> Vec<String> {
        let mut frames = Vec::new();
        while let Some(frame) = rx.recv().await {
            frames.push(frame);
        }
        frames
    }

    #[tokio::test]
    async fn success_ends_with_done_after_persisting() {
        let (relay, store) = relay(vec![Ok("line one\n".to_string()), Ok("two".to_string())]);

        let (rx, handle) = relay.spawn("p1".to_string(), "hi".to_string(), true, params(2));
        let frames = drain(rx).await;
        let reply = handle.await.unwrap().unwrap();

        assert_eq!(
            frames,
            vec![
                "data: line one<NEWLINE>\n\n".to_string(),
                "data: two\n\n".to_string(),
                format!("data: {DONE_SENTINEL}\n\n"),
            ]
        );
        assert_eq!(reply.text, "line one\ntwo");
        let entries = store.0.lock().unwrap().clone();
        assert_eq!(entries.last().map(|e| e.role), Some(Role::Assistant));
        assert_eq!(entries.last().map(|e| e.content.clone()), Some("line one\ntwo".to_string()));
    }

    #[tokio::test]
    async fn content_filter_ends_with_single_error_frame() {
        let (relay, store) = relay(vec![
            Ok("partial".to_string()),
            Err(UpstreamError::ContentFiltered("content_filter".to_string())),
        ]);

        let (rx, handle) = relay.spawn("p1".to_string(), "hi".to_string(), true, params(3));
        let frames = drain(rx).await;
        let result = handle.await.unwrap();

        assert!(result.is_err());
        assert_eq!(
            frames,
            vec![
                "data: partial\n\n".to_string(),
                format!("data: {ERROR_SENTINEL}\n\n"),
            ]
        );
        let roles: Vec<Role> = store.0.lock().unwrap().iter().map(|e| e.role).collect();
        assert_eq!(roles, vec![Role::User]);
    }

    #[tokio::test]
    async fn exhaustion_emits_error_only() {
        // First attempt empty, second attempt has nothing scripted: both fail.
        let (relay, _store) = relay(vec![]);

        let (rx, handle) = relay.spawn("p1".to_string(), "hi".to_string(), true, params(2));
        let frames = drain(rx).await;

        assert!(handle.await.unwrap().is_err());
        assert_eq!(frames, vec![format!("data: {ERROR_SENTINEL}\n\n")]);
    }
}
