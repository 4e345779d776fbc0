// SPDX-FileCopyrightText: 2026 Penny Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Ollama chat API.
//!
//! Provides [`OllamaClient`] which handles request construction and retry
//! of transient failures (connection errors, 429, 5xx gateway errors).

use std::time::Duration;

use penny_core::PennyError;
use tracing::{debug, warn};

use crate::types::{ApiErrorBody, ChatRequest, ChatResponseBody};

/// HTTP client for a local or remote Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl OllamaClient {
    /// Creates a new client.
    ///
    /// # Arguments
    /// * `base_url` - Server root, e.g. `http://localhost:11434`
    /// * `max_retries` - Extra attempts after a transient failure
    /// * `retry_delay` - Pause between attempts
    /// * `timeout` - Per-request timeout
    pub fn new(
        base_url: &str,
        max_retries: u32,
        retry_delay: Duration,
        timeout: Duration,
    ) -> Result<Self, PennyError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PennyError::inference("failed to build HTTP client", e))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_retries,
            retry_delay,
        })
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url)
    }

    /// Sends a non-streaming chat request and returns the decoded body.
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponseBody, PennyError> {
        let mut req = request.clone();
        req.stream = false;

        let url = self.chat_url();
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying chat request after transient error");
                tokio::time::sleep(self.retry_delay).await;
            }

            let response = match self.client.post(&url).json(&req).send().await {
                Ok(response) => response,
                Err(e) if is_transient_transport(&e) && attempt < self.max_retries => {
                    warn!(error = %e, "ollama unreachable, will retry");
                    last_error = Some(PennyError::inference(format!("HTTP request failed: {e}"), e));
                    continue;
                }
                Err(e) => {
                    return Err(PennyError::inference(format!("HTTP request failed: {e}"), e));
                }
            };

            let status = response.status();
            debug!(status = %status, attempt, model = %req.model, "chat response received");

            if status.is_success() {
                let body = response
                    .text()
                    .await
                    .map_err(|e| PennyError::inference("failed to read response body", e))?;
                return serde_json::from_str(&body)
                    .map_err(|e| PennyError::inference(format!("failed to parse chat response: {e}"), e));
            }

            let body = response.text().await.unwrap_or_default();

            if is_transient_error(status) && attempt < self.max_retries {
                warn!(status = %status, body = %body, "transient error, will retry");
                last_error = Some(PennyError::Inference {
                    message: format!("ollama returned {status}: {body}"),
                    source: None,
                });
                continue;
            }

            let message = match serde_json::from_str::<ApiErrorBody>(&body) {
                Ok(api_err) => format!("ollama error ({status}): {}", api_err.error),
                Err(_) => format!("ollama returned {status}: {body}"),
            };
            return Err(PennyError::Inference {
                message,
                source: None,
            });
        }

        Err(last_error.unwrap_or_else(|| PennyError::Inference {
            message: "chat request failed after retries".into(),
            source: None,
        }))
    }
}

/// Returns true for HTTP status codes that indicate transient errors worth retrying.
fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503 | 504)
}

fn is_transient_transport(err: &reqwest::Error) -> bool {
    err.is_connect() || err.is_timeout()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ApiMessage;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str, max_retries: u32) -> OllamaClient {
        OllamaClient::new(
            base_url,
            max_retries,
            Duration::from_millis(10),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn test_request() -> ChatRequest {
        ChatRequest {
            model: "llama3.2".into(),
            messages: vec![ApiMessage {
                role: "user".into(),
                content: "Hello".into(),
                ..Default::default()
            }],
            tools: Vec::new(),
            stream: true,
        }
    }

    fn reply(content: &str) -> serde_json::Value {
        serde_json::json!({
            "model": "llama3.2",
            "message": {"role": "assistant", "content": content},
            "done": true
        })
    }

    #[tokio::test]
    async fn chat_success_forces_non_streaming() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(serde_json::json!({"model": "llama3.2", "stream": false})))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply("Hi there!")))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), 0);
        let result = client.chat(&test_request()).await.unwrap();
        assert_eq!(result.message.content, "Hi there!");
    }

    #[tokio::test]
    async fn chat_retries_on_503() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(503).set_body_string("loading model"))
            .up_to_n_times(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply("After retry")))
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), 2);
        let result = client.chat(&test_request()).await.unwrap();
        assert_eq!(result.message.content, "After retry");
    }

    #[tokio::test]
    async fn chat_fails_on_404_without_retry() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(serde_json::json!({"error": "model 'nope' not found"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), 3);
        let err = client.chat(&test_request()).await.unwrap_err();
        assert!(err.to_string().contains("not found"), "got: {err}");
    }

    #[tokio::test]
    async fn chat_exhausts_retries_on_500() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(3)
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), 2);
        let err = client.chat(&test_request()).await.unwrap_err();
        assert!(matches!(err, PennyError::Inference { .. }));
    }

    #[tokio::test]
    async fn chat_rejects_undecodable_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), 0);
        let err = client.chat(&test_request()).await.unwrap_err();
        assert!(err.to_string().contains("failed to parse"));
    }

    #[tokio::test]
    async fn unreachable_server_is_an_inference_error() {
        // Port 9 (discard) is closed on test hosts.
        let client = test_client("http://127.0.0.1:9", 1);
        let err = client.chat(&test_request()).await.unwrap_err();
        assert!(matches!(err, PennyError::Inference { .. }));
    }
}
