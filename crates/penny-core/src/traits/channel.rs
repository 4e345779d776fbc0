// SPDX-FileCopyrightText: 2026 Penny Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel adapter trait for the messaging transport.

use async_trait::async_trait;

use crate::error::PennyError;
use crate::traits::adapter::PluginAdapter;
use crate::types::InboundMessage;

/// Default maximum length of a single outgoing message, in characters.
pub const DEFAULT_MAX_MESSAGE_LENGTH: usize = 2000;

/// Adapter for a bidirectional text messaging transport.
///
/// Receiving happens over a streaming connection owned by the listener;
/// the adapter only tells it where to connect and how to read what arrives.
#[async_trait]
pub trait ChannelAdapter: PluginAdapter {
    /// Pulls a message out of a raw transport payload.
    ///
    /// Returns `None` for payloads that carry no text (receipts, typing
    /// notifications, empty bodies).
    fn extract_message(&self, raw: &serde_json::Value) -> Option<InboundMessage>;

    /// Sends text, plus optional base64-encoded attachments, to a recipient.
    async fn send_message(
        &self,
        recipient: &str,
        text: &str,
        attachments: &[String],
    ) -> Result<(), PennyError>;

    /// Turns the typing indicator on or off for a recipient.
    async fn send_typing(&self, recipient: &str, typing: bool) -> Result<(), PennyError>;

    /// URL of the streaming endpoint that delivers inbound payloads.
    fn connection_url(&self) -> String;

    /// Longest text accepted by a single `send_message` call.
    fn max_message_length(&self) -> usize {
        DEFAULT_MAX_MESSAGE_LENGTH
    }

    /// Releases the transport.
    async fn close(&self) -> Result<(), PennyError>;
}
