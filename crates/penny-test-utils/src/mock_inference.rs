// SPDX-FileCopyrightText: 2026 Penny Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock inference adapter for deterministic testing.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use penny_core::traits::adapter::PluginAdapter;
use penny_core::traits::inference::InferenceAdapter;
use penny_core::types::{AdapterType, ChatMessage, ChatResponse, HealthStatus, ToolCall, ToolSchema};
use penny_core::PennyError;

/// A plain text reply.
pub fn reply(content: impl Into<String>) -> ChatResponse {
    ChatResponse {
        content: content.into(),
        ..ChatResponse::default()
    }
}

/// A reply requesting a single tool call.
pub fn tool_call(tool: impl Into<String>, arguments: serde_json::Value) -> ChatResponse {
    ChatResponse {
        tool_calls: vec![ToolCall {
            tool: tool.into(),
            arguments,
        }],
        ..ChatResponse::default()
    }
}

enum Scripted {
    Reply(ChatResponse),
    Fail(String),
}

/// One recorded `chat` call.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub messages: Vec<ChatMessage>,
    pub tools: Vec<ToolSchema>,
}

/// A mock model that pops scripted replies from a FIFO queue.
///
/// When the queue is empty the fallback reply is returned, which defaults
/// to the text "mock response".
pub struct MockInference {
    model: String,
    script: Arc<Mutex<VecDeque<Scripted>>>,
    fallback: Arc<Mutex<ChatResponse>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    closed: Arc<Mutex<bool>>,
    delay: Option<Duration>,
}

impl MockInference {
    pub fn new() -> Self {
        Self::with_responses(Vec::new())
    }

    /// Create a mock pre-loaded with the given replies.
    pub fn with_responses(responses: Vec<ChatResponse>) -> Self {
        Self {
            model: "mock-model".to_string(),
            script: Arc::new(Mutex::new(
                responses.into_iter().map(Scripted::Reply).collect(),
            )),
            fallback: Arc::new(Mutex::new(reply("mock response"))),
            requests: Arc::new(Mutex::new(Vec::new())),
            closed: Arc::new(Mutex::new(false)),
            delay: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sleep this long inside every `chat` call, after recording it.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue another reply.
    pub async fn push(&self, response: ChatResponse) {
        self.script.lock().await.push_back(Scripted::Reply(response));
    }

    /// Queue a transport failure.
    pub async fn push_error(&self, message: impl Into<String>) {
        self.script.lock().await.push_back(Scripted::Fail(message.into()));
    }

    /// Reply returned once the script runs out.
    pub async fn set_fallback(&self, response: ChatResponse) {
        *self.fallback.lock().await = response;
    }

    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.requests.lock().await.len()
    }

    pub async fn is_closed(&self) -> bool {
        *self.closed.lock().await
    }
}

impl Default for MockInference {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockInference {
    fn name(&self) -> &str {
        "mock-inference"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Inference
    }

    async fn health_check(&self) -> Result<HealthStatus, PennyError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), PennyError> {
        *self.closed.lock().await = true;
        Ok(())
    }
}

#[async_trait]
impl InferenceAdapter for MockInference {
    fn model(&self) -> &str {
        &self.model
    }

    async fn chat(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolSchema],
    ) -> Result<ChatResponse, PennyError> {
        self.requests.lock().await.push(RecordedRequest {
            messages: messages.to_vec(),
            tools: tools.to_vec(),
        });
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = self.script.lock().await.pop_front();
        match next {
            Some(Scripted::Reply(response)) => Ok(response),
            Some(Scripted::Fail(message)) => Err(PennyError::Inference {
                message,
                source: None,
            }),
            None => Ok(self.fallback.lock().await.clone()),
        }
    }
}
