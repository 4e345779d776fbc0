// SPDX-FileCopyrightText: 2026 Penny Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for the message log.

use async_trait::async_trait;

use crate::error::PennyError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{MessageRecord, NewMessage, PromptLogEntry, SearchLogEntry};

/// Append-only message log plus the inference and search audit logs.
///
/// Records are never deleted. The only mutation after insert is
/// [`set_summary`](StorageAdapter::set_summary).
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Opens the backend and applies migrations.
    async fn initialize(&self) -> Result<(), PennyError>;

    /// Flushes pending writes and releases connections.
    async fn close(&self) -> Result<(), PennyError>;

    /// Appends a record and returns its store-assigned id.
    async fn append_message(&self, message: &NewMessage) -> Result<i64, PennyError>;

    async fn get_message(&self, id: i64) -> Result<Option<MessageRecord>, PennyError>;

    /// Most recent outgoing record whose content is exactly `content`.
    ///
    /// The lookup is not scoped to a conversation.
    async fn find_latest_outgoing_by_content(
        &self,
        content: &str,
    ) -> Result<Option<MessageRecord>, PennyError>;

    /// Up to `limit` records exchanged between two parties in either
    /// direction, newest first.
    async fn recent_between(
        &self,
        party_a: &str,
        party_b: &str,
        limit: usize,
    ) -> Result<Vec<MessageRecord>, PennyError>;

    /// Oldest outgoing reply that has a parent, has no children and has not
    /// been summarized yet.
    async fn next_unsummarized_leaf(&self) -> Result<Option<MessageRecord>, PennyError>;

    /// Sets the late-bound summary of a record.
    async fn set_summary(&self, id: i64, summary: &str) -> Result<(), PennyError>;

    /// Up to `limit` outgoing replies (records with a parent) that have no
    /// children, newest first.
    async fn recent_leaves(&self, limit: usize) -> Result<Vec<MessageRecord>, PennyError>;

    /// Sender of the most recent incoming record, if any.
    async fn latest_incoming_sender(&self) -> Result<Option<String>, PennyError>;

    /// Records one inference exchange.
    async fn log_prompt(&self, entry: &PromptLogEntry) -> Result<(), PennyError>;

    /// Records one search call.
    async fn log_search(&self, entry: &SearchLogEntry) -> Result<(), PennyError>;
}
