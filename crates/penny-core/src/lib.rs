// SPDX-FileCopyrightText: 2026 Penny Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Penny agent.
//!
//! This crate provides the shared error type, the conversation and chat data
//! model, and the adapter traits that the channel, inference and storage
//! crates implement. The agent loop and scheduler only ever talk to these
//! traits.

pub mod error;
pub mod traits;
pub mod types;

pub use error::PennyError;
pub use types::{AdapterType, Direction, HealthStatus, MessageRecord, Turn};

pub use traits::{ChannelAdapter, InferenceAdapter, PluginAdapter, StorageAdapter};
