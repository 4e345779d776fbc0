// SPDX-FileCopyrightText: 2026 Penny Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire types for the Ollama `/api/chat` endpoint.

use penny_core::types::{ChatMessage, ChatResponse, ToolCall, ToolSchema};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ApiTool>,
    pub stream: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiMessage {
    pub role: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ApiToolCall>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiToolCall {
    pub function: ApiFunctionCall,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiFunctionCall {
    pub name: String,
    #[serde(default)]
    pub arguments: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiTool {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub function: ApiFunction,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiFunction {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponseBody {
    #[serde(default)]
    pub message: ApiMessage,
    /// Some models report their reasoning here instead of on the message.
    #[serde(default)]
    pub thinking: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub error: String,
}

impl From<&ChatMessage> for ApiMessage {
    fn from(msg: &ChatMessage) -> Self {
        Self {
            role: msg.role.to_string(),
            content: msg.content.clone(),
            thinking: None,
            tool_calls: msg
                .tool_calls
                .iter()
                .map(|call| ApiToolCall {
                    function: ApiFunctionCall {
                        name: call.tool.clone(),
                        arguments: call.arguments.clone(),
                    },
                })
                .collect(),
        }
    }
}

impl From<&ToolSchema> for ApiTool {
    fn from(schema: &ToolSchema) -> Self {
        Self {
            kind: "function",
            function: ApiFunction {
                name: schema.name.clone(),
                description: schema.description.clone(),
                parameters: schema.parameters.clone(),
            },
        }
    }
}

impl From<ChatResponseBody> for ChatResponse {
    fn from(body: ChatResponseBody) -> Self {
        let thinking = body
            .thinking
            .or(body.message.thinking)
            .filter(|t| !t.trim().is_empty());
        Self {
            content: body.message.content,
            tool_calls: body
                .message
                .tool_calls
                .into_iter()
                .map(|call| ToolCall {
                    tool: call.function.name,
                    arguments: normalize_arguments(call.function.arguments),
                })
                .collect(),
            thinking,
        }
    }
}

/// Some models send arguments as a JSON-encoded string.
fn normalize_arguments(arguments: serde_json::Value) -> serde_json::Value {
    match arguments {
        serde_json::Value::String(raw) => serde_json::from_str(&raw)
            .unwrap_or_else(|_| serde_json::Value::String(raw)),
        serde_json::Value::Null => serde_json::json!({}),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_call_message_serializes_in_ollama_shape() {
        let msg = ChatMessage::assistant_tool_calls(
            "",
            vec![ToolCall {
                tool: "search".into(),
                arguments: serde_json::json!({"query": "rust"}),
            }],
        );
        let json = serde_json::to_value(ApiMessage::from(&msg)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "role": "assistant",
                "content": "",
                "tool_calls": [{"function": {"name": "search", "arguments": {"query": "rust"}}}]
            })
        );
    }

    #[test]
    fn thinking_prefers_top_level_then_message() {
        let body: ChatResponseBody = serde_json::from_value(serde_json::json!({
            "message": {"role": "assistant", "content": "hi", "thinking": "inner"}
        }))
        .unwrap();
        assert_eq!(ChatResponse::from(body).thinking.as_deref(), Some("inner"));

        let body: ChatResponseBody = serde_json::from_value(serde_json::json!({
            "message": {"role": "assistant", "content": "hi", "thinking": "inner"},
            "thinking": "outer"
        }))
        .unwrap();
        assert_eq!(ChatResponse::from(body).thinking.as_deref(), Some("outer"));
    }

    #[test]
    fn string_arguments_are_decoded() {
        let body: ChatResponseBody = serde_json::from_value(serde_json::json!({
            "message": {
                "role": "assistant",
                "content": "",
                "tool_calls": [{"function": {"name": "search", "arguments": "{\"query\":\"x\"}"}}]
            }
        }))
        .unwrap();
        let response = ChatResponse::from(body);
        assert_eq!(response.tool_calls[0].arguments["query"], "x");
    }
}
