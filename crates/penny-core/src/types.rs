// SPDX-FileCopyrightText: 2026 Penny Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Penny agent.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Channel,
    Inference,
    Storage,
}

// --- Message log ---

/// Which way a logged message travelled.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Sent by a person to the agent.
    Incoming,
    /// Sent by the agent.
    Outgoing,
}

/// A persisted entry in the message log.
///
/// `parent_id`, when present, always points at a record with a strictly
/// lower id. `chunk_index` is only set on the parts of a reply that was
/// split before sending; the parts of one reply are numbered 0, 1, 2, ...
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: i64,
    pub direction: Direction,
    pub sender: String,
    pub recipient: String,
    pub content: String,
    pub parent_id: Option<i64>,
    pub chunk_index: Option<u32>,
    /// Filled in later by the summarize agent; an empty string means
    /// "processed, nothing worth summarizing".
    pub summary: Option<String>,
    /// RFC 3339 UTC timestamp with millisecond precision.
    pub timestamp: String,
}

/// A message about to be appended to the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub direction: Direction,
    pub sender: String,
    pub recipient: String,
    pub content: String,
    pub parent_id: Option<i64>,
    pub chunk_index: Option<u32>,
}

impl NewMessage {
    pub fn incoming(
        sender: impl Into<String>,
        recipient: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            direction: Direction::Incoming,
            sender: sender.into(),
            recipient: recipient.into(),
            content: content.into(),
            parent_id: None,
            chunk_index: None,
        }
    }

    pub fn outgoing(
        sender: impl Into<String>,
        recipient: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            direction: Direction::Outgoing,
            ..Self::incoming(sender, recipient, content)
        }
    }

    pub fn with_parent(mut self, parent_id: Option<i64>) -> Self {
        self.parent_id = parent_id;
        self
    }

    pub fn with_chunk_index(mut self, chunk_index: Option<u32>) -> Self {
        self.chunk_index = chunk_index;
        self
    }
}

/// One logical conversational turn: a single record, or a stitched run of
/// reply chunks joined with newlines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub direction: Direction,
    pub content: String,
}

impl Turn {
    pub fn role(&self) -> Role {
        match self.direction {
            Direction::Incoming => Role::User,
            Direction::Outgoing => Role::Assistant,
        }
    }
}

// --- Chat model ---

/// Author of a chat message sent to the inference backend.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub tool: String,
    #[serde(default)]
    pub arguments: serde_json::Value,
}

/// A single message in the prompt sent to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
}

impl ChatMessage {
    fn plain(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(Role::Assistant, content)
    }

    pub fn tool(content: impl Into<String>) -> Self {
        Self::plain(Role::Tool, content)
    }

    /// The assistant message that records which tools the model asked for.
    pub fn assistant_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_calls,
        }
    }
}

/// Tool definition advertised to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// A single model reply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub content: String,
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default)]
    pub thinking: Option<String>,
}

// --- Tool results ---

/// Output of a search-style tool: answer text, the sources it came from,
/// and optionally one base64-encoded image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub text: String,
    pub urls: Vec<String>,
    pub image_base64: Option<String>,
}

/// Successful output of a tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToolOutput {
    Text(String),
    Search(SearchResult),
}

impl From<String> for ToolOutput {
    fn from(value: String) -> Self {
        ToolOutput::Text(value)
    }
}

impl From<&str> for ToolOutput {
    fn from(value: &str) -> Self {
        ToolOutput::Text(value.to_string())
    }
}

/// The normalized result of one tool call. Exactly one of output or error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    pub tool: String,
    pub outcome: Result<ToolOutput, String>,
}

impl ToolResult {
    pub fn ok(tool: impl Into<String>, output: ToolOutput) -> Self {
        Self {
            tool: tool.into(),
            outcome: Ok(output),
        }
    }

    pub fn error(tool: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            outcome: Err(error.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.outcome.is_err()
    }
}

// --- Channel ---

/// A message extracted from a raw channel payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub sender: String,
    pub content: String,
    /// Text of the message being replied to, when the person used quote-reply.
    pub quoted_text: Option<String>,
}

// --- Audit logs ---

/// One inference exchange, recorded for later inspection.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptLogEntry {
    pub model: String,
    /// JSON-serialized chat messages.
    pub messages: String,
    /// JSON-serialized tool schemas, if any were offered.
    pub tools: Option<String>,
    /// JSON-serialized response.
    pub response: String,
    pub thinking: Option<String>,
    pub duration_ms: i64,
}

/// One search call, recorded for later inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchLogEntry {
    pub query: String,
    pub response: String,
    pub duration_ms: i64,
}
