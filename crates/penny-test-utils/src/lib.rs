// SPDX-FileCopyrightText: 2026 Penny Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Penny integration tests.
//!
//! Provides mock adapters and a throwaway SQLite store for fast,
//! deterministic tests without Ollama, signal-cli or the network.
//!
//! # Components
//!
//! - [`MockInference`] - scripted model replies, records every request
//! - [`MockChannel`] - captures sends and typing toggles
//! - [`MockTool`] - counts invocations and returns a fixed output
//! - [`TempStore`] - initialized [`SqliteStorage`](penny_storage::SqliteStorage) in a temp dir
//! - [`FlakyStore`] - store wrapper that rejects chosen appends

pub mod mock_channel;
pub mod mock_inference;
pub mod mock_tool;
pub mod store;

pub use mock_channel::{MockChannel, SentMessage};
pub use mock_inference::{reply, tool_call, MockInference};
pub use mock_tool::MockTool;
pub use store::{FlakyStore, TempStore};
