// SPDX-FileCopyrightText: 2026 Penny Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Spontaneous continuation of an idle thread.

use std::sync::Arc;

use async_trait::async_trait;
use penny_core::types::{Direction, MessageRecord};
use penny_core::{ChannelAdapter, StorageAdapter};
use penny_scheduler::ScheduledAgent;
use penny_storage::{fold_turns, ThreadResolver};
use rand::seq::SliceRandom;
use tracing::{debug, info, warn};

use crate::controller::AgentController;
use crate::prompts::CONTINUE_PROMPT;
use crate::reply::{deliver, Delivery};

/// How many recent leaves a follow-up is picked from.
const CANDIDATE_LEAVES: usize = 10;

/// Picks a random recent thread and adds to it unprompted.
pub struct FollowupAgent {
    agent_name: String,
    controller: Arc<AgentController>,
    store: Arc<dyn StorageAdapter>,
    threads: ThreadResolver,
    channel: Arc<dyn ChannelAdapter>,
    thread_limit: usize,
}

impl FollowupAgent {
    pub fn new(
        agent_name: impl Into<String>,
        controller: Arc<AgentController>,
        store: Arc<dyn StorageAdapter>,
        channel: Arc<dyn ChannelAdapter>,
        thread_limit: usize,
    ) -> Self {
        Self {
            agent_name: agent_name.into(),
            controller,
            threads: ThreadResolver::new(Arc::clone(&store)),
            store,
            channel,
            thread_limit,
        }
    }

    async fn pick_leaf(&self) -> Option<MessageRecord> {
        let leaves = match self.store.recent_leaves(CANDIDATE_LEAVES).await {
            Ok(leaves) => leaves,
            Err(e) => {
                warn!(error = %e, "failed to list recent threads");
                return None;
            }
        };
        let mut rng = rand::thread_rng();
        leaves.choose(&mut rng).cloned()
    }
}

#[async_trait]
impl ScheduledAgent for FollowupAgent {
    fn name(&self) -> &str {
        "followup"
    }

    async fn execute(&self) -> bool {
        let Some(leaf) = self.pick_leaf().await else {
            debug!("no thread to follow up on");
            return false;
        };

        let chain = match self.threads.ancestor_chain(leaf.id, self.thread_limit).await {
            Ok(chain) => chain,
            Err(e) => {
                warn!(id = leaf.id, error = %e, "failed to load thread");
                return false;
            }
        };
        let Some(recipient) = chain
            .iter()
            .find(|r| r.direction == Direction::Incoming)
            .map(|r| r.sender.clone())
        else {
            debug!(id = leaf.id, "thread has no user message");
            return false;
        };

        let response = self.controller.run(CONTINUE_PROMPT, &fold_turns(&chain)).await;
        if let Some(failure) = response.failure {
            warn!(id = leaf.id, ?failure, "follow-up run failed");
            return false;
        }

        deliver(
            &self.store,
            &self.channel,
            Delivery {
                sender: &self.agent_name,
                recipient: &recipient,
                parent_id: Some(leaf.id),
                attachments: &response.attachments,
            },
            &response.answer,
        )
        .await;
        info!(recipient = %recipient, parent_id = leaf.id, "follow-up sent");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use penny_core::types::NewMessage;
    use penny_test_utils::{reply, MockChannel, MockInference, TempStore};

    #[tokio::test]
    async fn continues_thread_as_child_of_leaf() {
        let temp = TempStore::new().await.unwrap();
        let store = temp.adapter();
        let channel = Arc::new(MockChannel::new());
        let inference = Arc::new(MockInference::with_responses(vec![reply(
            "By the way, Rust 2024 just shipped.",
        )]));
        let controller = Arc::new(AgentController::new("followup", "persona", inference.clone()));
        let agent = FollowupAgent::new("penny", controller, Arc::clone(&store), channel.clone(), 20);

        let q = store
            .append_message(&NewMessage::incoming("+1", "penny", "what is rust?"))
            .await
            .unwrap();
        let leaf = store
            .append_message(&NewMessage::outgoing("penny", "+1", "A language.").with_parent(Some(q)))
            .await
            .unwrap();

        assert!(agent.execute().await);

        let sent = channel.sent_messages().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipient, "+1");

        let child = store
            .find_latest_outgoing_by_content("By the way, Rust 2024 just shipped.")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(child.parent_id, Some(leaf));

        let messages = &inference.requests().await[0].messages;
        assert_eq!(messages[1].content, "what is rust?");
        assert_eq!(messages[2].content, "A language.");
        assert_eq!(messages.last().unwrap().content, CONTINUE_PROMPT);
    }

    #[tokio::test]
    async fn skips_unprompted_messages() {
        let temp = TempStore::new().await.unwrap();
        let store = temp.adapter();
        let channel = Arc::new(MockChannel::new());
        let inference = Arc::new(MockInference::with_responses(vec![reply("Any luck with it?")]));
        let controller = Arc::new(AgentController::new("followup", "persona", inference.clone()));
        let agent = FollowupAgent::new("penny", controller, Arc::clone(&store), channel.clone(), 20);

        let q = store
            .append_message(&NewMessage::incoming("+1", "penny", "fix my bike?"))
            .await
            .unwrap();
        let leaf = store
            .append_message(&NewMessage::outgoing("penny", "+1", "Check the chain.").with_parent(Some(q)))
            .await
            .unwrap();
        for i in 0..5 {
            store
                .append_message(&NewMessage::outgoing("penny", "+1", format!("fact {i}")))
                .await
                .unwrap();
        }

        assert!(agent.execute().await);
        let child = store
            .find_latest_outgoing_by_content("Any luck with it?")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(child.parent_id, Some(leaf));
    }

    #[tokio::test]
    async fn does_nothing_without_threads() {
        let temp = TempStore::new().await.unwrap();
        let channel = Arc::new(MockChannel::new());
        let inference = Arc::new(MockInference::new());
        let controller = Arc::new(AgentController::new("followup", "persona", inference.clone()));
        let agent = FollowupAgent::new("penny", controller, temp.adapter(), channel.clone(), 20);

        assert!(!agent.execute().await);
        assert_eq!(inference.call_count().await, 0);
        assert_eq!(channel.sent_count().await, 0);
    }

    #[tokio::test]
    async fn failed_run_sends_nothing() {
        let temp = TempStore::new().await.unwrap();
        let store = temp.adapter();
        let channel = Arc::new(MockChannel::new());
        let inference = Arc::new(MockInference::new());
        inference.push_error("down").await;
        let controller = Arc::new(AgentController::new("followup", "persona", inference.clone()));
        let agent = FollowupAgent::new("penny", controller, Arc::clone(&store), channel.clone(), 20);

        let q = store
            .append_message(&NewMessage::incoming("+1", "penny", "hi"))
            .await
            .unwrap();
        store
            .append_message(&NewMessage::outgoing("penny", "+1", "hello").with_parent(Some(q)))
            .await
            .unwrap();

        assert!(!agent.execute().await);
        assert_eq!(channel.sent_count().await, 0);
    }
}
