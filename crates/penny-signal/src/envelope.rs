// SPDX-FileCopyrightText: 2026 Penny Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Envelope decoding for payloads pushed over the receive websocket.
//!
//! signal-cli-rest-api wraps every event in an `envelope`. Only data
//! messages with a non-empty body become an [`InboundMessage`]; receipts,
//! typing notifications and sync messages are dropped.

use penny_core::types::InboundMessage;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Payload {
    envelope: Envelope,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    source_number: Option<String>,
    #[serde(default)]
    data_message: Option<DataMessage>,
}

#[derive(Debug, Deserialize)]
struct DataMessage {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    quote: Option<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    text: Option<String>,
}

/// Decodes a raw websocket payload into an inbound message.
pub fn extract(raw: &serde_json::Value) -> Option<InboundMessage> {
    let payload = Payload::deserialize(raw).ok()?;
    let envelope = payload.envelope;

    let sender = envelope
        .source
        .or(envelope.source_number)
        .filter(|s| !s.is_empty())?;
    let data = envelope.data_message?;
    let content = data.message.filter(|m| !m.trim().is_empty())?;
    let quoted_text = data
        .quote
        .and_then(|q| q.text)
        .filter(|t| !t.is_empty());

    Some(InboundMessage {
        sender,
        content,
        quoted_text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_plain_data_message() {
        let raw = json!({
            "envelope": {
                "source": "+15550001",
                "sourceNumber": "+15550001",
                "timestamp": 1700000000000u64,
                "dataMessage": {"timestamp": 1700000000000u64, "message": "hello"}
            },
            "account": "+15559999"
        });
        let msg = extract(&raw).unwrap();
        assert_eq!(msg.sender, "+15550001");
        assert_eq!(msg.content, "hello");
        assert_eq!(msg.quoted_text, None);
    }

    #[test]
    fn extracts_quoted_text() {
        let raw = json!({
            "envelope": {
                "source": "+15550001",
                "dataMessage": {
                    "message": "tell me more",
                    "quote": {"id": 1, "author": "+15559999", "text": "Rust is great."}
                }
            }
        });
        let msg = extract(&raw).unwrap();
        assert_eq!(msg.quoted_text.as_deref(), Some("Rust is great."));
    }

    #[test]
    fn ignores_receipts_and_typing() {
        let receipt = json!({
            "envelope": {"source": "+15550001", "receiptMessage": {"isDelivery": true}}
        });
        let typing = json!({
            "envelope": {"source": "+15550001", "typingMessage": {"action": "STARTED"}}
        });
        assert!(extract(&receipt).is_none());
        assert!(extract(&typing).is_none());
    }

    #[test]
    fn ignores_empty_bodies_and_garbage() {
        let empty = json!({
            "envelope": {"source": "+15550001", "dataMessage": {"message": "   "}}
        });
        assert!(extract(&empty).is_none());
        assert!(extract(&json!({"unexpected": true})).is_none());
        assert!(extract(&json!("text frame")).is_none());
    }

    #[test]
    fn falls_back_to_source_number() {
        let raw = json!({
            "envelope": {"sourceNumber": "+15550002", "dataMessage": {"message": "hi"}}
        });
        assert_eq!(extract(&raw).unwrap().sender, "+15550002");
    }
}
