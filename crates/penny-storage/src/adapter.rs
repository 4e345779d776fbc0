// SPDX-FileCopyrightText: 2026 Penny Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use penny_config::model::StorageConfig;
use penny_core::types::{MessageRecord, NewMessage, PromptLogEntry, SearchLogEntry};
use penny_core::{AdapterType, HealthStatus, PennyError, PluginAdapter, StorageAdapter};

use crate::database::{map_tr_err, Database};
use crate::queries;

/// SQLite-backed message store.
///
/// The database is opened on the first call to
/// [`StorageAdapter::initialize`]; every other operation fails until then.
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// The open database, or an error if not initialized.
    pub fn database(&self) -> Result<&Database, PennyError> {
        self.db
            .get()
            .ok_or_else(|| PennyError::storage("storage not initialized, call initialize() first"))
    }

    async fn checkpoint(&self) -> Result<(), PennyError> {
        if let Some(db) = self.db.get() {
            db.connection()
                .call(|conn| {
                    conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                    Ok(())
                })
                .await
                .map_err(map_tr_err)?;
            debug!("WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, PennyError> {
        self.database()?
            .connection()
            .call(|conn| {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), PennyError> {
        self.checkpoint().await
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), PennyError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        self.db
            .set(db)
            .map_err(|_| PennyError::storage("storage already initialized"))?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), PennyError> {
        self.database()?;
        self.checkpoint().await
    }

    async fn append_message(&self, message: &NewMessage) -> Result<i64, PennyError> {
        queries::messages::insert_message(self.database()?, message).await
    }

    async fn get_message(&self, id: i64) -> Result<Option<MessageRecord>, PennyError> {
        queries::messages::get_message(self.database()?, id).await
    }

    async fn find_latest_outgoing_by_content(
        &self,
        content: &str,
    ) -> Result<Option<MessageRecord>, PennyError> {
        queries::messages::find_latest_outgoing_by_content(self.database()?, content).await
    }

    async fn recent_between(
        &self,
        party_a: &str,
        party_b: &str,
        limit: usize,
    ) -> Result<Vec<MessageRecord>, PennyError> {
        queries::messages::recent_between(self.database()?, party_a, party_b, limit).await
    }

    async fn next_unsummarized_leaf(&self) -> Result<Option<MessageRecord>, PennyError> {
        queries::messages::next_unsummarized_leaf(self.database()?).await
    }

    async fn set_summary(&self, id: i64, summary: &str) -> Result<(), PennyError> {
        queries::messages::set_summary(self.database()?, id, summary).await
    }

    async fn recent_leaves(&self, limit: usize) -> Result<Vec<MessageRecord>, PennyError> {
        queries::messages::recent_leaves(self.database()?, limit).await
    }

    async fn latest_incoming_sender(&self) -> Result<Option<String>, PennyError> {
        queries::messages::latest_incoming_sender(self.database()?).await
    }

    async fn log_prompt(&self, entry: &PromptLogEntry) -> Result<(), PennyError> {
        queries::logs::insert_prompt_log(self.database()?, entry).await
    }

    async fn log_search(&self, entry: &SearchLogEntry) -> Result<(), PennyError> {
        queries::logs::insert_search_log(self.database()?, entry).await
    }
}
