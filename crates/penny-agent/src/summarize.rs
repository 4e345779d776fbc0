// SPDX-FileCopyrightText: 2026 Penny Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Idle-time summarization of finished threads.

use std::sync::Arc;

use async_trait::async_trait;
use penny_core::types::Turn;
use penny_core::StorageAdapter;
use penny_scheduler::ScheduledAgent;
use penny_storage::{fold_turns, ThreadResolver};
use tracing::{debug, info, warn};

use crate::controller::AgentController;

/// Summarizes the oldest thread whose final reply has no summary yet.
///
/// One thread per run. Threads of fewer than two records get an empty
/// summary so they are not picked again. A failed run stores nothing.
pub struct SummarizeAgent {
    controller: Arc<AgentController>,
    store: Arc<dyn StorageAdapter>,
    threads: ThreadResolver,
    thread_limit: usize,
}

impl SummarizeAgent {
    pub fn new(
        controller: Arc<AgentController>,
        store: Arc<dyn StorageAdapter>,
        thread_limit: usize,
    ) -> Self {
        Self {
            controller,
            threads: ThreadResolver::new(Arc::clone(&store)),
            store,
            thread_limit,
        }
    }
}

/// Renders turns as `role: content` lines.
pub fn format_thread(turns: &[Turn]) -> String {
    turns
        .iter()
        .map(|turn| format!("{}: {}", turn.role(), turn.content))
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl ScheduledAgent for SummarizeAgent {
    fn name(&self) -> &str {
        "summarize"
    }

    async fn execute(&self) -> bool {
        let leaf = match self.store.next_unsummarized_leaf().await {
            Ok(Some(leaf)) => leaf,
            Ok(None) => return false,
            Err(e) => {
                warn!(error = %e, "failed to find a thread to summarize");
                return false;
            }
        };

        let chain = match self.threads.ancestor_chain(leaf.id, self.thread_limit).await {
            Ok(chain) => chain,
            Err(e) => {
                warn!(id = leaf.id, error = %e, "failed to load thread");
                return false;
            }
        };

        let summary = if chain.len() < 2 {
            debug!(id = leaf.id, "thread too short, storing empty summary");
            String::new()
        } else {
            let response = self
                .controller
                .run(&format_thread(&fold_turns(&chain)), &[])
                .await;
            if let Some(failure) = response.failure {
                warn!(id = leaf.id, ?failure, "summarization failed");
                return false;
            }
            response.answer.trim().to_string()
        };

        match self.store.set_summary(leaf.id, &summary).await {
            Ok(()) => {
                info!(id = leaf.id, len = summary.len(), "thread summarized");
                true
            }
            Err(e) => {
                warn!(id = leaf.id, error = %e, "failed to store summary");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use penny_core::types::NewMessage;
    use penny_test_utils::{reply, MockInference, TempStore};

    async fn setup(
        responses: Vec<penny_core::types::ChatResponse>,
    ) -> (TempStore, Arc<MockInference>, SummarizeAgent) {
        let temp = TempStore::new().await.unwrap();
        let inference = Arc::new(MockInference::with_responses(responses));
        let controller = Arc::new(AgentController::new(
            "summarize",
            "Summarize.",
            inference.clone(),
        ));
        let agent = SummarizeAgent::new(controller, temp.adapter(), 20);
        (temp, inference, agent)
    }

    #[test]
    fn formats_roles() {
        let turns = vec![
            Turn {
                direction: penny_core::Direction::Incoming,
                content: "hi".into(),
            },
            Turn {
                direction: penny_core::Direction::Outgoing,
                content: "hello".into(),
            },
        ];
        assert_eq!(format_thread(&turns), "user: hi\nassistant: hello");
    }

    #[tokio::test]
    async fn summarizes_thread_once() {
        let (temp, inference, agent) = setup(vec![reply("  Talked about rust.  ")]).await;
        let store = temp.adapter();
        let q = store
            .append_message(&NewMessage::incoming("+1", "penny", "what is rust?"))
            .await
            .unwrap();
        let a = store
            .append_message(&NewMessage::outgoing("penny", "+1", "A language.").with_parent(Some(q)))
            .await
            .unwrap();

        assert!(agent.execute().await);
        let record = store.get_message(a).await.unwrap().unwrap();
        assert_eq!(record.summary.as_deref(), Some("Talked about rust."));
        assert_eq!(
            inference.requests().await[0].messages[1].content,
            "user: what is rust?\nassistant: A language."
        );

        assert!(!agent.execute().await);
        assert_eq!(inference.call_count().await, 1);
    }

    #[tokio::test]
    async fn failed_run_stores_nothing() {
        let (temp, inference, agent) = setup(vec![]).await;
        inference.push_error("down").await;
        let store = temp.adapter();
        let q = store
            .append_message(&NewMessage::incoming("+1", "penny", "q"))
            .await
            .unwrap();
        let a = store
            .append_message(&NewMessage::outgoing("penny", "+1", "a").with_parent(Some(q)))
            .await
            .unwrap();

        assert!(!agent.execute().await);
        assert_eq!(store.get_message(a).await.unwrap().unwrap().summary, None);
    }

    #[tokio::test]
    async fn nothing_to_do_on_empty_store() {
        let (_temp, inference, agent) = setup(vec![]).await;
        assert!(!agent.execute().await);
        assert_eq!(inference.call_count().await, 0);
    }
}
