// SPDX-FileCopyrightText: 2026 Penny Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ollama inference adapter for the Penny agent.
//!
//! Implements [`InferenceAdapter`] on top of the non-streaming `/api/chat`
//! endpoint. One [`OllamaProvider`] is bound to one model; the agent keeps
//! separate instances for foreground and background work.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use penny_config::model::OllamaConfig;
use penny_core::traits::adapter::PluginAdapter;
use penny_core::traits::inference::InferenceAdapter;
use penny_core::types::{AdapterType, ChatMessage, ChatResponse, HealthStatus, ToolSchema};
use penny_core::PennyError;
use tracing::{debug, info};

use crate::client::OllamaClient;
use crate::types::{ApiMessage, ApiTool, ChatRequest};

/// Ollama-backed model provider.
pub struct OllamaProvider {
    client: OllamaClient,
    model: String,
}

impl OllamaProvider {
    /// Creates a provider for `model` using the connection settings in `config`.
    pub fn new(config: &OllamaConfig, model: impl Into<String>) -> Result<Self, PennyError> {
        let client = OllamaClient::new(
            &config.api_url,
            config.max_retries,
            Duration::from_millis(config.retry_delay_ms),
            Duration::from_secs(config.request_timeout_secs),
        )?;
        let model = model.into();
        info!(model = %model, url = %config.api_url, "ollama provider initialized");
        Ok(Self { client, model })
    }

    /// Provider for user-facing replies.
    pub fn foreground(config: &OllamaConfig) -> Result<Self, PennyError> {
        Self::new(config, config.foreground_model.clone())
    }

    /// Provider for idle-time work; falls back to the foreground model.
    pub fn background(config: &OllamaConfig) -> Result<Self, PennyError> {
        Self::new(config, config.background_model())
    }

    fn build_request(&self, messages: &[ChatMessage], tools: &[ToolSchema]) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: messages.iter().map(ApiMessage::from).collect(),
            tools: tools.iter().map(ApiTool::from).collect(),
            stream: false,
        }
    }
}

#[async_trait]
impl PluginAdapter for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
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
        debug!(model = %self.model, "ollama provider closed");
        Ok(())
    }
}

#[async_trait]
impl InferenceAdapter for OllamaProvider {
    fn model(&self) -> &str {
        &self.model
    }

    async fn chat(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolSchema],
    ) -> Result<ChatResponse, PennyError> {
        let request = self.build_request(messages, tools);
        let body = self.client.chat(&request).await?;
        Ok(ChatResponse::from(body))
    }
}
