// SPDX-FileCopyrightText: 2026 Penny Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Penny agent.

use thiserror::Error;

/// The primary error type used across all Penny adapter traits and core operations.
///
/// None of these messages are ever shown to the person on the other end of
/// the channel; the agent layer maps failures to fixed apology strings.
#[derive(Debug, Error)]
pub enum PennyError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Message store errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Channel adapter errors (connection failure, malformed envelope, send failure).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Inference backend errors (transport failure, bad status, undecodable body).
    #[error("inference error: {message}")]
    Inference {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A tool failed while executing.
    #[error("tool {tool} failed: {message}")]
    Tool { tool: String, message: String },

    /// Requested adapter was not found.
    #[error("adapter not found: {adapter_type}/{name}")]
    AdapterNotFound { adapter_type: String, name: String },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PennyError {
    /// Shorthand for a storage error carrying only a message.
    pub fn storage(message: impl Into<String>) -> Self {
        PennyError::Storage {
            source: message.into().into(),
        }
    }

    /// Shorthand for an inference error wrapping a source error.
    pub fn inference<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        PennyError::Inference {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Shorthand for a channel error wrapping a source error.
    pub fn channel<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        PennyError::Channel {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_context() {
        let err = PennyError::Tool {
            tool: "search".into(),
            message: "rate limited".into(),
        };
        assert_eq!(err.to_string(), "tool search failed: rate limited");

        let err = PennyError::storage("disk full");
        assert_eq!(err.to_string(), "storage error: disk full");
    }

    #[test]
    fn inference_helper_keeps_source() {
        let err = PennyError::inference("ollama unreachable", std::io::Error::other("refused"));
        match err {
            PennyError::Inference { message, source } => {
                assert_eq!(message, "ollama unreachable");
                assert!(source.is_some());
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }
}
