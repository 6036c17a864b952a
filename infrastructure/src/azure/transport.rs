//! HTTP transport for Azure OpenAI deployments.

use super::error::{classify_status, connection_error};
use super::protocol::{ChatCompletionBody, ChatCompletionResponse, LineBuffer, SseEvent, parse_sse_line};
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use relay_application::{CompletionRequest, CompletionTransport, FragmentStream, UpstreamError};
use relay_domain::{ApiKey, EnvDefaults};
use std::collections::VecDeque;
use std::fmt::Display;
use std::pin::Pin;
use tracing::debug;

/// [`CompletionTransport`] speaking the Azure OpenAI chat-completions API.
///
/// Cloning is cheap; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct AzureOpenAiTransport {
    client: reqwest::Client,
    endpoint: String,
    api_version: String,
    api_key: ApiKey,
}

impl AzureOpenAiTransport {
    pub fn new(endpoint: impl Into<String>, api_version: impl Into<String>, api_key: ApiKey) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_version: api_version.into(),
            api_key,
        }
    }

    pub fn from_env(env: &EnvDefaults) -> Self {
        Self::new(&env.endpoint, &env.api_version, env.api_key.clone())
    }

    /// Share an existing connection pool.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn url(&self, deployment: &str) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint.trim_end_matches('/'),
            deployment,
            self.api_version
        )
    }

    async fn post(
        &self,
        request: &CompletionRequest,
        stream: bool,
    ) -> Result<reqwest::Response, UpstreamError> {
        let body = ChatCompletionBody {
            messages: &request.messages,
            temperature: request.temperature,
            max_completion_tokens: request.max_completion_tokens,
            stream,
        };
        debug!(
            deployment = %request.deployment,
            messages = request.messages.len(),
            stream,
            "POST chat/completions"
        );

        let response = self
            .client
            .post(self.url(&request.deployment))
            .header("api-key", self.api_key.expose())
            .json(&body)
            .send()
            .await
            .map_err(connection_error)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_status(status.as_u16(), &text));
        }
        Ok(response)
    }
}

#[async_trait]
impl CompletionTransport for AzureOpenAiTransport {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, UpstreamError> {
        let response = self.post(request, false).await?;
        let text = response.text().await.map_err(connection_error)?;
        let parsed: ChatCompletionResponse = serde_json::from_str(&text)
            .map_err(|e| UpstreamError::Unexpected(format!("invalid completion response: {e}")))?;
        Ok(parsed.into_content())
    }

    async fn open_stream(
        &self,
        request: &CompletionRequest,
    ) -> Result<FragmentStream, UpstreamError> {
        let response = self.post(request, true).await?;
        Ok(sse_fragments(response.bytes_stream()))
    }
}

struct SseState<S> {
    bytes: Pin<Box<S>>,
    lines: LineBuffer,
    pending: VecDeque<String>,
    finished: bool,
}

/// Turn a raw event-stream body into content fragments.
///
/// Reads only as far as the consumer polls. The stream ends at `[DONE]`,
/// at the end of the body, or right after yielding an error.
pub fn sse_fragments<S, B, E>(bytes: S) -> FragmentStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    let state = SseState {
        bytes: Box::pin(bytes),
        lines: LineBuffer::default(),
        pending: VecDeque::new(),
        finished: false,
    };

    futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(line) = state.pending.pop_front() {
                match parse_sse_line(&line) {
                    Ok(SseEvent::Fragment(text)) => return Some((Ok(text), state)),
                    Ok(SseEvent::Skip) => continue,
                    Ok(SseEvent::Done) => return None,
                    Err(e) => {
                        state.pending.clear();
                        state.finished = true;
                        return Some((Err(e), state));
                    }
                }
            }
            if state.finished {
                return None;
            }
            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    let lines = state.lines.push(chunk.as_ref());
                    state.pending.extend(lines);
                }
                Some(Err(e)) => {
                    state.finished = true;
                    return Some((Err(UpstreamError::Connection(e.to_string())), state));
                }
                None => {
                    state.finished = true;
                    state.pending.extend(state.lines.finish());
                }
            }
        }
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(chunks: Vec<Result<&'static str, String>>) -> FragmentStream {
        sse_fragments(futures::stream::iter(
            chunks.into_iter().map(|c| c.map(|s| s.as_bytes().to_vec())),
        ))
    }

    async fn collect(stream: FragmentStream) -> Vec<Result<String, UpstreamError>> {
        stream.collect().await
    }

    #[test]
    fn url_layout() {
        let transport = AzureOpenAiTransport::new(
            "https://example.openai.azure.com/",
            "2024-12-01-preview",
            ApiKey::new("k"),
        );
        assert_eq!(
            transport.url("gpt-5-mini"),
            "https://example.openai.azure.com/openai/deployments/gpt-5-mini/chat/completions?api-version=2024-12-01-preview"
        );
    }

    #[test]
    fn api_key_stays_out_of_debug() {
        let transport =
            AzureOpenAiTransport::new("https://e", "v", ApiKey::new("super-secret"));
        assert!(!format!("{:?}", transport).contains("super-secret"));
    }

    #[tokio::test]
    async fn fragments_across_chunk_boundaries() {
        let stream = body(vec![
            Ok("data: {\"choices\":[],\"prompt_filter_results\":[]}\n\n"),
            Ok("data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\ndata: {\"choi"),
            Ok("ces\":[{\"delta\":{\"content\":\"lo\"}}]}\n\n"),
            Ok("data: [DONE]\n\n"),
            Ok("data: {\"choices\":[{\"delta\":{\"content\":\"after\"}}]}\n\n"),
        ]);
        let items: Vec<String> = collect(stream).await.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(items, vec!["Hel", "lo"]);
    }

    #[tokio::test]
    async fn content_filter_ends_stream_with_error() {
        let stream = body(vec![
            Ok("data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\n"),
            Ok("data: {\"choices\":[{\"delta\":{},\"finish_reason\":\"content_filter\"}]}\n"),
            Ok("data: {\"choices\":[{\"delta\":{\"content\":\"b\"}}]}\n"),
        ]);
        let items = collect(stream).await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0], Ok("a".to_string()));
        assert!(matches!(items[1], Err(UpstreamError::ContentFiltered(_))));
    }

    #[tokio::test]
    async fn read_error_is_a_connection_error() {
        let stream = body(vec![
            Ok("data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\n"),
            Err("connection reset".to_string()),
        ]);
        let items = collect(stream).await;
        assert_eq!(
            items,
            vec![
                Ok("a".to_string()),
                Err(UpstreamError::Connection("connection reset".to_string()))
            ]
        );
    }

    #[tokio::test]
    async fn body_without_done_and_trailing_newline() {
        let stream = body(vec![Ok("data: {\"choices\":[{\"delta\":{\"content\":\"x\"}}]}")]);
        let items = collect(stream).await;
        assert_eq!(items, vec![Ok("x".to_string())]);
    }
}
