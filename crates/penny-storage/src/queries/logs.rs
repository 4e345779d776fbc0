// SPDX-FileCopyrightText: 2026 Penny Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt and search audit log queries.

use penny_core::types::{PromptLogEntry, SearchLogEntry};
use penny_core::PennyError;
use rusqlite::params;

use crate::database::{map_tr_err, Database};

/// Record one inference exchange.
pub async fn insert_prompt_log(db: &Database, entry: &PromptLogEntry) -> Result<(), PennyError> {
    let entry = entry.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO prompt_log (model, messages, tools, response, thinking, duration_ms)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    entry.model,
                    entry.messages,
                    entry.tools,
                    entry.response,
                    entry.thinking,
                    entry.duration_ms,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Record one search call.
pub async fn insert_search_log(db: &Database, entry: &SearchLogEntry) -> Result<(), PennyError> {
    let entry = entry.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO search_log (query, response, duration_ms) VALUES (?1, ?2, ?3)",
                params![entry.query, entry.response, entry.duration_ms],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Most recent prompt log entries, newest first.
pub async fn recent_prompt_logs(
    db: &Database,
    limit: usize,
) -> Result<Vec<PromptLogEntry>, PennyError> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT model, messages, tools, response, thinking, COALESCE(duration_ms, 0)
                 FROM prompt_log ORDER BY id DESC LIMIT ?1",
            )?;
            let rows = stmt.query_map(params![limit], |row| {
                Ok(PromptLogEntry {
                    model: row.get(0)?,
                    messages: row.get(1)?,
                    tools: row.get(2)?,
                    response: row.get(3)?,
                    thinking: row.get(4)?,
                    duration_ms: row.get(5)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Most recent search log entries, newest first.
pub async fn recent_search_logs(
    db: &Database,
    limit: usize,
) -> Result<Vec<SearchLogEntry>, PennyError> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT query, response, COALESCE(duration_ms, 0)
                 FROM search_log ORDER BY id DESC LIMIT ?1",
            )?;
            let rows = stmt.query_map(params![limit], |row| {
                Ok(SearchLogEntry {
                    query: row.get(0)?,
                    response: row.get(1)?,
                    duration_ms: row.get(2)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
