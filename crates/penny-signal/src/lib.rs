// SPDX-FileCopyrightText: 2026 Penny Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Signal channel adapter for the Penny agent.
//!
//! Implements [`ChannelAdapter`] against a signal-cli-rest-api server:
//! replies go out through `/v2/send`, typing indicators through
//! `/v1/typing-indicator/{number}`, and inbound events arrive on the
//! `/v1/receive/{number}` websocket that the listener connects to.

pub mod envelope;

use async_trait::async_trait;
use penny_config::model::SignalConfig;
use penny_core::error::PennyError;
use penny_core::traits::{ChannelAdapter, PluginAdapter};
use penny_core::types::{AdapterType, HealthStatus, InboundMessage};
use serde::Serialize;
use tracing::{debug, info};

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    message: &'a str,
    number: &'a str,
    recipients: [&'a str; 1],
    #[serde(skip_serializing_if = "no_attachments")]
    base64_attachments: &'a [String],
}

fn no_attachments(attachments: &&[String]) -> bool {
    attachments.is_empty()
}

#[derive(Debug, Serialize)]
struct TypingRequest<'a> {
    recipient: &'a str,
}

/// Signal channel adapter implementing [`ChannelAdapter`].
pub struct SignalChannel {
    client: reqwest::Client,
    api_url: String,
    number: String,
    max_message_length: usize,
}

impl SignalChannel {
    /// Creates a new Signal channel adapter.
    ///
    /// Requires `config.number` to be set.
    pub fn new(config: &SignalConfig) -> Result<Self, PennyError> {
        let number = config
            .number
            .clone()
            .filter(|n| !n.is_empty())
            .ok_or_else(|| {
                PennyError::Config("signal.number is required for the Signal adapter".into())
            })?;

        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| PennyError::channel("failed to build HTTP client", e))?;

        info!(number = %number, api_url = %config.api_url, "signal channel initialized");

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            number,
            max_message_length: config.max_message_length,
        })
    }

    /// The account number this adapter sends from.
    pub fn number(&self) -> &str {
        &self.number
    }

    async fn check(response: reqwest::Response, what: &str) -> Result<(), PennyError> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(PennyError::Channel {
            message: format!("{what} returned {status}: {body}"),
            source: None,
        })
    }
}

#[async_trait]
impl PluginAdapter for SignalChannel {
    fn name(&self) -> &str {
        "signal"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, PennyError> {
        let url = format!("{}/v1/about", self.api_url);
        match self.client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => Ok(HealthStatus::Healthy),
            Ok(resp) => Ok(HealthStatus::Degraded(format!(
                "signal api returned {}",
                resp.status()
            ))),
            Err(e) => Ok(HealthStatus::Unhealthy(format!("signal api unreachable: {e}"))),
        }
    }

    async fn shutdown(&self) -> Result<(), PennyError> {
        debug!("signal channel shutting down");
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for SignalChannel {
    fn extract_message(&self, raw: &serde_json::Value) -> Option<InboundMessage> {
        envelope::extract(raw)
    }

    async fn send_message(
        &self,
        recipient: &str,
        text: &str,
        attachments: &[String],
    ) -> Result<(), PennyError> {
        let url = format!("{}/v2/send", self.api_url);
        let body = SendRequest {
            message: text,
            number: &self.number,
            recipients: [recipient],
            base64_attachments: attachments,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| PennyError::channel(format!("send to {recipient} failed"), e))?;
        Self::check(response, "send").await?;

        debug!(recipient, len = text.len(), attachments = attachments.len(), "message sent");
        Ok(())
    }

    async fn send_typing(&self, recipient: &str, typing: bool) -> Result<(), PennyError> {
        let url = format!("{}/v1/typing-indicator/{}", self.api_url, self.number);
        let request = if typing {
            self.client.put(&url)
        } else {
            self.client.delete(&url)
        };

        let response = request
            .json(&TypingRequest { recipient })
            .send()
            .await
            .map_err(|e| PennyError::channel("typing indicator failed", e))?;
        Self::check(response, "typing indicator").await
    }

    fn connection_url(&self) -> String {
        let host = self
            .api_url
            .strip_prefix("https://")
            .map(|rest| ("wss", rest))
            .or_else(|| self.api_url.strip_prefix("http://").map(|rest| ("ws", rest)));
        match host {
            Some((scheme, rest)) => format!("{scheme}://{rest}/v1/receive/{}", self.number),
            None => format!("ws://{}/v1/receive/{}", self.api_url, self.number),
        }
    }

    fn max_message_length(&self) -> usize {
        self.max_message_length
    }

    async fn close(&self) -> Result<(), PennyError> {
        debug!("signal channel closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn channel(api_url: &str) -> SignalChannel {
        SignalChannel::new(&SignalConfig {
            number: Some("+15559999".into()),
            api_url: api_url.to_string(),
            max_message_length: 2000,
        })
        .unwrap()
    }

    #[test]
    fn requires_number() {
        let err = SignalChannel::new(&SignalConfig {
            number: None,
            ..Default::default()
        })
        .err()
        .unwrap();
        assert!(matches!(err, PennyError::Config(_)));
    }

    #[test]
    fn connection_url_swaps_scheme() {
        assert_eq!(
            channel("http://localhost:8080").connection_url(),
            "ws://localhost:8080/v1/receive/+15559999"
        );
        assert_eq!(
            channel("https://signal.example.com/").connection_url(),
            "wss://signal.example.com/v1/receive/+15559999"
        );
    }

    #[tokio::test]
    async fn send_message_posts_v2_send() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v2/send"))
            .and(body_json(serde_json::json!({
                "message": "hello",
                "number": "+15559999",
                "recipients": ["+15550001"]
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({"timestamp": "1"})))
            .expect(1)
            .mount(&server)
            .await;

        channel(&server.uri())
            .send_message("+15550001", "hello", &[])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn send_message_includes_attachments() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v2/send"))
            .and(body_json(serde_json::json!({
                "message": "look",
                "number": "+15559999",
                "recipients": ["+15550001"],
                "base64_attachments": ["aGVsbG8="]
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        channel(&server.uri())
            .send_message("+15550001", "look", &["aGVsbG8=".to_string()])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn send_message_surfaces_http_errors() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v2/send"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad recipient"))
            .mount(&server)
            .await;

        let err = channel(&server.uri())
            .send_message("nobody", "hello", &[])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("channel error"));
    }

    #[tokio::test]
    async fn typing_uses_put_and_delete() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/v1/typing-indicator/+15559999"))
            .and(body_json(serde_json::json!({"recipient": "+15550001"})))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/v1/typing-indicator/+15559999"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let channel = channel(&server.uri());
        channel.send_typing("+15550001", true).await.unwrap();
        channel.send_typing("+15550001", false).await.unwrap();
    }
}
