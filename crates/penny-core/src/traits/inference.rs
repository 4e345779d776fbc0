// SPDX-FileCopyrightText: 2026 Penny Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inference adapter trait for LLM backends.

use async_trait::async_trait;

use crate::error::PennyError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ChatMessage, ChatResponse, ToolSchema};

/// Adapter for a chat-completion backend with tool calling.
#[async_trait]
pub trait InferenceAdapter: PluginAdapter {
    /// Name of the model requests are sent to.
    fn model(&self) -> &str;

    /// Sends the conversation and available tools, returning one reply.
    ///
    /// Errors are transient from the caller's point of view: the agent loop
    /// converts them into an apology instead of propagating them.
    async fn chat(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolSchema],
    ) -> Result<ChatResponse, PennyError>;
}
