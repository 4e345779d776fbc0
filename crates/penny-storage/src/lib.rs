// SPDX-FileCopyrightText: 2026 Penny Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for the Penny agent.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single-writer
//! concurrency model via `tokio-rusqlite`, typed queries over the message
//! log and audit logs, and [`ThreadResolver`] for rebuilding conversation
//! history from the flat log.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod queries;
pub mod thread;

pub use adapter::SqliteStorage;
pub use database::Database;
pub use thread::{fold_turns, ThreadResolver, MESSAGE_FETCH_MULTIPLIER};
