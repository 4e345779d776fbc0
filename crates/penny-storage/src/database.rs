// SPDX-FileCopyrightText: 2026 Penny Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup and migrations.
//!
//! All statements run on tokio-rusqlite's single background thread, so
//! writes are serialized without extra locking. Do not open additional
//! connections for writes.

use std::path::Path;

use penny_core::PennyError;
use tracing::debug;

use crate::migrations::run_migrations;

/// Handle to the open SQLite database.
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (creating if needed) the database at `path` in WAL mode.
    pub async fn open(path: &str) -> Result<Self, PennyError> {
        Self::open_with(path, true).await
    }

    /// Open the database, choosing the journal mode, and apply migrations.
    pub async fn open_with(path: &str, wal_mode: bool) -> Result<Self, PennyError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| PennyError::Storage {
                source: Box::new(e),
            })?;
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| PennyError::Storage {
                source: Box::new(e),
            })?;

        let journal = if wal_mode { "WAL" } else { "DELETE" };
        let migrated = conn
            .call(move |conn| {
                conn.execute_batch(&format!(
                    "PRAGMA journal_mode = {journal};
                     PRAGMA synchronous = NORMAL;
                     PRAGMA foreign_keys = ON;
                     PRAGMA busy_timeout = 5000;"
                ))?;
                Ok(run_migrations(conn))
            })
            .await
            .map_err(map_tr_err)?;
        migrated?;

        debug!(path, wal_mode, "database opened");
        Ok(Self { conn })
    }

    /// The underlying async connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(self) -> Result<(), PennyError> {
        self.conn
            .call(|conn| {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        self.conn.close().await.map_err(map_tr_err)
    }
}

/// Convert a tokio-rusqlite error into the storage variant.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> PennyError {
    PennyError::Storage {
        source: Box::new(e),
    }
}
