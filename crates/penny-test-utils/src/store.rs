// SPDX-FileCopyrightText: 2026 Penny Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Throwaway SQLite store for tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use penny_config::model::StorageConfig;
use penny_core::types::{
    AdapterType, HealthStatus, MessageRecord, NewMessage, PromptLogEntry, SearchLogEntry,
};
use penny_core::{PennyError, PluginAdapter, StorageAdapter};
use penny_storage::SqliteStorage;
use tempfile::TempDir;

/// An initialized store backed by a file in a temp directory.
///
/// The directory is removed when this value is dropped, so keep it alive for
/// the duration of the test.
pub struct TempStore {
    _dir: TempDir,
    storage: Arc<SqliteStorage>,
}

impl TempStore {
    pub async fn new() -> Result<Self, PennyError> {
        let dir = TempDir::new().map_err(|e| PennyError::Storage { source: e.into() })?;
        let config = StorageConfig {
            database_path: dir.path().join("penny.db").to_string_lossy().to_string(),
            wal_mode: true,
        };
        let storage = SqliteStorage::new(config);
        storage.initialize().await?;
        Ok(Self {
            _dir: dir,
            storage: Arc::new(storage),
        })
    }

    pub fn storage(&self) -> Arc<SqliteStorage> {
        Arc::clone(&self.storage)
    }

    /// The store as the trait object the agent consumes.
    pub fn adapter(&self) -> Arc<dyn StorageAdapter> {
        self.storage.clone()
    }
}

/// Wraps a store and fails chosen `append_message` calls.
///
/// Calls are counted from 1; every other operation is passed through.
pub struct FlakyStore {
    inner: Arc<dyn StorageAdapter>,
    fail_appends: Vec<usize>,
    appends: AtomicUsize,
}

impl FlakyStore {
    pub fn new(inner: Arc<dyn StorageAdapter>, fail_appends: Vec<usize>) -> Self {
        Self {
            inner,
            fail_appends,
            appends: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl PluginAdapter for FlakyStore {
    fn name(&self) -> &str {
        "flaky"
    }

    fn version(&self) -> semver::Version {
        self.inner.version()
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, PennyError> {
        self.inner.health_check().await
    }

    async fn shutdown(&self) -> Result<(), PennyError> {
        self.inner.shutdown().await
    }
}

#[async_trait]
impl StorageAdapter for FlakyStore {
    async fn initialize(&self) -> Result<(), PennyError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), PennyError> {
        self.inner.close().await
    }

    async fn append_message(&self, message: &NewMessage) -> Result<i64, PennyError> {
        let call = self.appends.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_appends.contains(&call) {
            return Err(PennyError::storage(format!("append {call} rejected")));
        }
        self.inner.append_message(message).await
    }

    async fn get_message(&self, id: i64) -> Result<Option<MessageRecord>, PennyError> {
        self.inner.get_message(id).await
    }

    async fn find_latest_outgoing_by_content(
        &self,
        content: &str,
    ) -> Result<Option<MessageRecord>, PennyError> {
        self.inner.find_latest_outgoing_by_content(content).await
    }

    async fn recent_between(
        &self,
        party_a: &str,
        party_b: &str,
        limit: usize,
    ) -> Result<Vec<MessageRecord>, PennyError> {
        self.inner.recent_between(party_a, party_b, limit).await
    }

    async fn next_unsummarized_leaf(&self) -> Result<Option<MessageRecord>, PennyError> {
        self.inner.next_unsummarized_leaf().await
    }

    async fn set_summary(&self, id: i64, summary: &str) -> Result<(), PennyError> {
        self.inner.set_summary(id, summary).await
    }

    async fn recent_leaves(&self, limit: usize) -> Result<Vec<MessageRecord>, PennyError> {
        self.inner.recent_leaves(limit).await
    }

    async fn latest_incoming_sender(&self) -> Result<Option<String>, PennyError> {
        self.inner.latest_incoming_sender().await
    }

    async fn log_prompt(&self, entry: &PromptLogEntry) -> Result<(), PennyError> {
        self.inner.log_prompt(entry).await
    }

    async fn log_search(&self, entry: &SearchLogEntry) -> Result<(), PennyError> {
        self.inner.log_search(entry).await
    }
}
