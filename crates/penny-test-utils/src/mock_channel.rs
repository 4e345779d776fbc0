// SPDX-FileCopyrightText: 2026 Penny Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock channel adapter for deterministic testing.
//!
//! `MockChannel` implements `ChannelAdapter` and captures every outbound
//! message and typing toggle for assertion in tests. Raw payloads are
//! plain JSON objects: `{"sender", "content", "quoted_text"?}`.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use penny_core::traits::adapter::PluginAdapter;
use penny_core::traits::channel::{ChannelAdapter, DEFAULT_MAX_MESSAGE_LENGTH};
use penny_core::types::{AdapterType, HealthStatus, InboundMessage};
use penny_core::PennyError;

/// One captured `send_message` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub recipient: String,
    pub text: String,
    pub attachments: Vec<String>,
}

/// A mock messaging channel for testing.
pub struct MockChannel {
    sent: Arc<Mutex<Vec<SentMessage>>>,
    typing: Arc<Mutex<Vec<(String, bool)>>>,
    max_message_length: usize,
    connection_url: String,
    fail_sends: bool,
    closed: Arc<Mutex<bool>>,
}

impl MockChannel {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            typing: Arc::new(Mutex::new(Vec::new())),
            max_message_length: DEFAULT_MAX_MESSAGE_LENGTH,
            connection_url: "ws://mock.invalid/receive".to_string(),
            fail_sends: false,
            closed: Arc::new(Mutex::new(false)),
        }
    }

    pub fn with_max_message_length(mut self, max: usize) -> Self {
        self.max_message_length = max;
        self
    }

    /// Point the listener at a local test server.
    pub fn with_connection_url(mut self, url: impl Into<String>) -> Self {
        self.connection_url = url.into();
        self
    }

    /// Make every `send_message` call fail.
    pub fn failing(mut self) -> Self {
        self.fail_sends = true;
        self
    }

    /// Build a raw payload that `extract_message` understands.
    pub fn payload(sender: &str, content: &str, quoted_text: Option<&str>) -> serde_json::Value {
        serde_json::json!({
            "sender": sender,
            "content": content,
            "quoted_text": quoted_text,
        })
    }

    pub async fn sent_messages(&self) -> Vec<SentMessage> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// Typing toggles in call order.
    pub async fn typing_events(&self) -> Vec<(String, bool)> {
        self.typing.lock().await.clone()
    }

    pub async fn is_closed(&self) -> bool {
        *self.closed.lock().await
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockChannel {
    fn name(&self) -> &str {
        "mock-channel"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, PennyError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), PennyError> {
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for MockChannel {
    fn extract_message(&self, raw: &serde_json::Value) -> Option<InboundMessage> {
        let sender = raw.get("sender")?.as_str()?.to_string();
        let content = raw.get("content")?.as_str()?.to_string();
        if content.trim().is_empty() {
            return None;
        }
        let quoted_text = raw
            .get("quoted_text")
            .and_then(|q| q.as_str())
            .map(str::to_string);
        Some(InboundMessage {
            sender,
            content,
            quoted_text,
        })
    }

    async fn send_message(
        &self,
        recipient: &str,
        text: &str,
        attachments: &[String],
    ) -> Result<(), PennyError> {
        if self.fail_sends {
            return Err(PennyError::Channel {
                message: "mock send failure".into(),
                source: None,
            });
        }
        self.sent.lock().await.push(SentMessage {
            recipient: recipient.to_string(),
            text: text.to_string(),
            attachments: attachments.to_vec(),
        });
        Ok(())
    }

    async fn send_typing(&self, recipient: &str, typing: bool) -> Result<(), PennyError> {
        self.typing.lock().await.push((recipient.to_string(), typing));
        Ok(())
    }

    fn connection_url(&self) -> String {
        self.connection_url.clone()
    }

    fn max_message_length(&self) -> usize {
        self.max_message_length
    }

    async fn close(&self) -> Result<(), PennyError> {
        *self.closed.lock().await = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_sends() {
        let channel = MockChannel::new();
        channel.send_message("+1", "hello", &[]).await.unwrap();
        channel.send_typing("+1", true).await.unwrap();

        assert_eq!(channel.sent_count().await, 1);
        assert_eq!(channel.sent_messages().await[0].text, "hello");
        assert_eq!(channel.typing_events().await, vec![("+1".to_string(), true)]);
    }

    #[test]
    fn extracts_payload() {
        let channel = MockChannel::new();
        let msg = channel
            .extract_message(&MockChannel::payload("+1", "hi", Some("earlier")))
            .unwrap();
        assert_eq!(msg.sender, "+1");
        assert_eq!(msg.quoted_text.as_deref(), Some("earlier"));
        assert!(channel
            .extract_message(&MockChannel::payload("+1", "  ", None))
            .is_none());
    }
}
