// SPDX-FileCopyrightText: 2026 Penny Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation reconstruction over the flat message log.
//!
//! Two views are derived here: the ancestor chain of a record (a quote-reply
//! thread) and the recent turns exchanged between two parties. Both stitch
//! split replies back together with [`fold_turns`].

use std::sync::Arc;

use penny_core::types::{MessageRecord, Turn};
use penny_core::{PennyError, StorageAdapter};
use tracing::warn;

/// Raw records fetched per requested turn before folding chunks.
pub const MESSAGE_FETCH_MULTIPLIER: usize = 10;

/// Fold chronologically ordered records into turns.
///
/// A record joins the previous turn when it has the same direction and its
/// `chunk_index` is exactly one more than the previous record's. Joined
/// contents are separated by a newline.
pub fn fold_turns(records: &[MessageRecord]) -> Vec<Turn> {
    let mut turns: Vec<Turn> = Vec::new();
    let mut prev: Option<&MessageRecord> = None;

    for record in records {
        let continues_run = prev.is_some_and(|p| {
            p.direction == record.direction
                && matches!(
                    (p.chunk_index, record.chunk_index),
                    (Some(a), Some(b)) if a.checked_add(1) == Some(b)
                )
        });

        match turns.last_mut() {
            Some(turn) if continues_run => {
                turn.content.push('\n');
                turn.content.push_str(&record.content);
            }
            _ => turns.push(Turn {
                direction: record.direction,
                content: record.content.clone(),
            }),
        }
        prev = Some(record);
    }

    turns
}

/// Read-side view of the message store.
#[derive(Clone)]
pub struct ThreadResolver {
    store: Arc<dyn StorageAdapter>,
}

impl ThreadResolver {
    pub fn new(store: Arc<dyn StorageAdapter>) -> Self {
        Self { store }
    }

    /// Walk `parent_id` links up from `id`, returning at most `limit`
    /// records, oldest first.
    ///
    /// The walk stops at a root, at a missing record, or at a link that does
    /// not point to a strictly lower id, so corrupted data cannot loop.
    pub async fn ancestor_chain(
        &self,
        id: i64,
        limit: usize,
    ) -> Result<Vec<MessageRecord>, PennyError> {
        let mut chain = Vec::new();
        let mut current = Some(id);

        while let Some(current_id) = current {
            if chain.len() >= limit {
                break;
            }
            let Some(record) = self.store.get_message(current_id).await? else {
                break;
            };
            current = match record.parent_id {
                Some(parent) if parent < record.id => Some(parent),
                Some(parent) => {
                    warn!(id = record.id, parent, "parent link does not decrease, stopping walk");
                    None
                }
                None => None,
            };
            chain.push(record);
        }

        chain.reverse();
        Ok(chain)
    }

    /// Turns of the thread ending at `id`.
    pub async fn thread_turns(&self, id: i64, limit: usize) -> Result<Vec<Turn>, PennyError> {
        let chain = self.ancestor_chain(id, limit).await?;
        Ok(fold_turns(&chain))
    }

    /// The last `limit` turns exchanged between two parties, oldest first.
    pub async fn conversation_turns(
        &self,
        party_a: &str,
        party_b: &str,
        limit: usize,
    ) -> Result<Vec<Turn>, PennyError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let mut records = self
            .store
            .recent_between(
                party_a,
                party_b,
                limit.saturating_mul(MESSAGE_FETCH_MULTIPLIER),
            )
            .await?;
        records.reverse();

        let mut turns = fold_turns(&records);
        let excess = turns.len().saturating_sub(limit);
        turns.drain(..excess);
        Ok(turns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use penny_core::types::{Direction, NewMessage};
    use penny_config::model::StorageConfig;
    use proptest::prelude::*;
    use tempfile::tempdir;

    use crate::adapter::SqliteStorage;

    fn record(id: i64, direction: Direction, content: &str, chunk: Option<u32>) -> MessageRecord {
        MessageRecord {
            id,
            direction,
            sender: "s".into(),
            recipient: "r".into(),
            content: content.into(),
            parent_id: None,
            chunk_index: chunk,
            summary: None,
            timestamp: format!("2026-01-01T00:00:{:02}.000Z", id % 60),
        }
    }

    async fn store() -> (Arc<SqliteStorage>, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let storage = SqliteStorage::new(StorageConfig {
            database_path: dir.path().join("thread.db").to_string_lossy().into_owned(),
            wal_mode: true,
        });
        storage.initialize().await.unwrap();
        (Arc::new(storage), dir)
    }

    #[test]
    fn chunk_run_folds_into_one_turn() {
        let records = vec![
            record(1, Direction::Incoming, "question", None),
            record(2, Direction::Outgoing, "a", Some(0)),
            record(3, Direction::Outgoing, "b", Some(1)),
            record(4, Direction::Outgoing, "c", Some(2)),
        ];
        let turns = fold_turns(&records);
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1].content, "a\nb\nc");
        assert_eq!(turns[1].direction, Direction::Outgoing);
    }

    #[test]
    fn gaps_and_restarts_break_runs() {
        let records = vec![
            record(1, Direction::Outgoing, "a", Some(0)),
            record(2, Direction::Outgoing, "b", Some(2)),
            record(3, Direction::Outgoing, "c", Some(0)),
            record(4, Direction::Outgoing, "d", None),
            record(5, Direction::Outgoing, "e", None),
        ];
        let contents: Vec<_> = fold_turns(&records)
            .into_iter()
            .map(|t| t.content)
            .collect();
        assert_eq!(contents, vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn direction_change_breaks_runs() {
        let records = vec![
            record(1, Direction::Outgoing, "a", Some(0)),
            record(2, Direction::Incoming, "b", Some(1)),
        ];
        assert_eq!(fold_turns(&records).len(), 2);
    }

    proptest! {
        #[test]
        fn folding_preserves_content_and_never_grows(
            specs in proptest::collection::vec((any::<bool>(), proptest::option::of(0u32..4)), 0..40)
        ) {
            let records: Vec<_> = specs
                .iter()
                .enumerate()
                .map(|(i, (out, chunk))| {
                    let dir = if *out { Direction::Outgoing } else { Direction::Incoming };
                    record(i as i64 + 1, dir, &format!("m{i}"), *chunk)
                })
                .collect();
            let turns = fold_turns(&records);

            prop_assert!(turns.len() <= records.len());
            let rebuilt: Vec<String> = turns
                .iter()
                .flat_map(|t| t.content.split('\n').map(str::to_string).collect::<Vec<_>>())
                .collect();
            let original: Vec<String> = records.iter().map(|r| r.content.clone()).collect();
            prop_assert_eq!(rebuilt, original);
        }
    }

    #[tokio::test]
    async fn ancestor_chain_is_oldest_first_and_bounded() {
        let (storage, _dir) = store().await;
        let mut parent = None;
        let mut ids = Vec::new();
        for i in 0..6 {
            let msg = if i % 2 == 0 {
                NewMessage::incoming("alice", "penny", format!("m{i}"))
            } else {
                NewMessage::outgoing("penny", "alice", format!("m{i}"))
            };
            let id = storage.append_message(&msg.with_parent(parent)).await.unwrap();
            ids.push(id);
            parent = Some(id);
        }
        let resolver = ThreadResolver::new(storage.clone());

        let full = resolver.ancestor_chain(ids[5], 20).await.unwrap();
        assert_eq!(full.iter().map(|r| r.id).collect::<Vec<_>>(), ids);

        let bounded = resolver.ancestor_chain(ids[5], 3).await.unwrap();
        assert_eq!(
            bounded.iter().map(|r| r.id).collect::<Vec<_>>(),
            ids[3..].to_vec()
        );

        assert!(resolver.ancestor_chain(ids[5], 0).await.unwrap().is_empty());
        assert!(resolver.ancestor_chain(9999, 5).await.unwrap().is_empty());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn ancestor_chain_walks_any_forest_within_limit(
            links in proptest::collection::vec(
                proptest::option::of(any::<proptest::sample::Index>()),
                1..12,
            )
        ) {
            let runtime = tokio::runtime::Runtime::new().unwrap();
            runtime.block_on(async {
                let (storage, _dir) = store().await;

                // Node i links to an earlier node or is a root.
                let mut ids: Vec<i64> = Vec::new();
                let mut parents: Vec<Option<usize>> = Vec::new();
                for (i, link) in links.iter().enumerate() {
                    let parent = match link {
                        Some(index) if i > 0 => Some(index.index(i)),
                        _ => None,
                    };
                    let msg = NewMessage::incoming("alice", "penny", format!("n{i}"))
                        .with_parent(parent.map(|p| ids[p]));
                    ids.push(storage.append_message(&msg).await.unwrap());
                    parents.push(parent);
                }
                let resolver = ThreadResolver::new(storage.clone());

                for node in 0..ids.len() {
                    let mut depth = 1;
                    let mut cursor = parents[node];
                    while let Some(p) = cursor {
                        depth += 1;
                        cursor = parents[p];
                    }

                    for limit in 0..=ids.len() + 1 {
                        let chain = resolver.ancestor_chain(ids[node], limit).await.unwrap();
                        assert_eq!(chain.len(), depth.min(limit));
                        if limit == 0 {
                            continue;
                        }
                        assert_eq!(chain.last().unwrap().id, ids[node]);
                        for pair in chain.windows(2) {
                            assert!(pair[0].id < pair[1].id);
                            assert_eq!(pair[1].parent_id, Some(pair[0].id));
                        }
                        if limit >= depth {
                            assert_eq!(chain[0].parent_id, None);
                        }
                    }
                }
            });
        }
    }

    #[tokio::test]
    async fn ancestor_chain_stops_on_self_reference() {
        let (storage, _dir) = store().await;
        let root = storage
            .append_message(&NewMessage::incoming("alice", "penny", "root"))
            .await
            .unwrap();
        storage
            .database()
            .unwrap()
            .connection()
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO messages (id, direction, sender, recipient, content, parent_id)
                     VALUES (?1, 'outgoing', 'penny', 'alice', 'loop', ?1)",
                    rusqlite::params![root + 1],
                )?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)
            .unwrap();

        let resolver = ThreadResolver::new(storage.clone());
        let chain = resolver.ancestor_chain(root + 1, 10).await.unwrap();
        assert_eq!(chain.len(), 1);
        assert_eq!(chain[0].content, "loop");
    }

    #[tokio::test]
    async fn conversation_turns_stitch_chunks_and_keep_last_turns() {
        let (storage, _dir) = store().await;
        let q = storage
            .append_message(&NewMessage::incoming("alice", "penny", "tell me a story"))
            .await
            .unwrap();
        let mut parent = Some(q);
        for (i, part) in ["once", "upon", "a time"].iter().enumerate() {
            let id = storage
                .append_message(
                    &NewMessage::outgoing("penny", "alice", *part)
                        .with_parent(parent)
                        .with_chunk_index(Some(i as u32)),
                )
                .await
                .unwrap();
            parent = Some(id);
        }
        storage
            .append_message(&NewMessage::incoming("alice", "penny", "nice"))
            .await
            .unwrap();
        storage
            .append_message(&NewMessage::incoming("bob", "penny", "unrelated"))
            .await
            .unwrap();

        let resolver = ThreadResolver::new(storage.clone());
        let turns = resolver
            .conversation_turns("alice", "penny", 10)
            .await
            .unwrap();
        let contents: Vec<_> = turns.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["tell me a story", "once\nupon\na time", "nice"]);

        let last_two = resolver
            .conversation_turns("alice", "penny", 2)
            .await
            .unwrap();
        assert_eq!(last_two.len(), 2);
        assert_eq!(last_two[0].content, "once\nupon\na time");

        let thread = resolver.thread_turns(parent.unwrap(), 10).await.unwrap();
        assert_eq!(thread.len(), 2);
        assert_eq!(thread[1].content, "once\nupon\na time");
    }
}
