// SPDX-FileCopyrightText: 2026 Penny Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message log queries.

use std::str::FromStr;

use penny_core::types::{Direction, MessageRecord, NewMessage};
use penny_core::PennyError;
use rusqlite::{params, OptionalExtension, Row};

use crate::database::{map_tr_err, Database};

const COLUMNS: &str =
    "id, direction, sender, recipient, content, parent_id, chunk_index, summary, timestamp";

fn from_row(row: &Row<'_>) -> rusqlite::Result<MessageRecord> {
    let direction: String = row.get(1)?;
    let direction = Direction::from_str(&direction).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(MessageRecord {
        id: row.get(0)?,
        direction,
        sender: row.get(2)?,
        recipient: row.get(3)?,
        content: row.get(4)?,
        parent_id: row.get(5)?,
        chunk_index: row.get(6)?,
        summary: row.get(7)?,
        timestamp: row.get(8)?,
    })
}

/// Insert a message and return its id.
pub async fn insert_message(db: &Database, msg: &NewMessage) -> Result<i64, PennyError> {
    let msg = msg.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO messages (direction, sender, recipient, content, parent_id, chunk_index)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    msg.direction.to_string(),
                    msg.sender,
                    msg.recipient,
                    msg.content,
                    msg.parent_id,
                    msg.chunk_index,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch one message by id.
pub async fn get_message(db: &Database, id: i64) -> Result<Option<MessageRecord>, PennyError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM messages WHERE id = ?1"),
                params![id],
                from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Most recent outgoing message with exactly this content.
pub async fn find_latest_outgoing_by_content(
    db: &Database,
    content: &str,
) -> Result<Option<MessageRecord>, PennyError> {
    let content = content.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "SELECT {COLUMNS} FROM messages
                     WHERE direction = 'outgoing' AND content = ?1
                     ORDER BY timestamp DESC, id DESC LIMIT 1"
                ),
                params![content],
                from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Messages between two parties in either direction, newest first.
pub async fn recent_between(
    db: &Database,
    party_a: &str,
    party_b: &str,
    limit: usize,
) -> Result<Vec<MessageRecord>, PennyError> {
    let party_a = party_a.to_string();
    let party_b = party_b.to_string();
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM messages
                 WHERE (sender = ?1 AND recipient = ?2) OR (sender = ?2 AND recipient = ?1)
                 ORDER BY timestamp DESC, id DESC LIMIT ?3"
            ))?;
            let rows = stmt.query_map(params![party_a, party_b, limit], from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Oldest childless outgoing reply with a parent and no summary.
pub async fn next_unsummarized_leaf(db: &Database) -> Result<Option<MessageRecord>, PennyError> {
    db.connection()
        .call(|conn| {
            conn.query_row(
                &format!(
                    "SELECT {COLUMNS} FROM messages m
                     WHERE m.direction = 'outgoing'
                       AND m.parent_id IS NOT NULL
                       AND m.summary IS NULL
                       AND NOT EXISTS (SELECT 1 FROM messages c WHERE c.parent_id = m.id)
                     ORDER BY m.id ASC LIMIT 1"
                ),
                [],
                from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Set the summary of a message. Fails if no such message exists.
pub async fn set_summary(db: &Database, id: i64, summary: &str) -> Result<(), PennyError> {
    let summary = summary.to_string();
    let updated = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE messages SET summary = ?1 WHERE id = ?2",
                params![summary, id],
            )
        })
        .await
        .map_err(map_tr_err)?;
    if updated == 0 {
        return Err(PennyError::storage(format!("no message with id {id}")));
    }
    Ok(())
}

/// Childless outgoing replies, newest first. Parentless outgoing messages
/// (unprompted roots) are not threads and are left out.
pub async fn recent_leaves(db: &Database, limit: usize) -> Result<Vec<MessageRecord>, PennyError> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM messages m
                 WHERE m.direction = 'outgoing'
                   AND m.parent_id IS NOT NULL
                   AND NOT EXISTS (SELECT 1 FROM messages c WHERE c.parent_id = m.id)
                 ORDER BY m.timestamp DESC, m.id DESC LIMIT ?1"
            ))?;
            let rows = stmt.query_map(params![limit], from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Sender of the newest incoming message.
pub async fn latest_incoming_sender(db: &Database) -> Result<Option<String>, PennyError> {
    db.connection()
        .call(|conn| {
            conn.query_row(
                "SELECT sender FROM messages WHERE direction = 'incoming'
                 ORDER BY timestamp DESC, id DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}
