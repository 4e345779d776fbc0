// SPDX-FileCopyrightText: 2026 Penny Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Idle-time discovery: a new topic for the most recent user.

use std::sync::Arc;

use async_trait::async_trait;
use penny_core::{ChannelAdapter, StorageAdapter};
use penny_scheduler::ScheduledAgent;
use penny_storage::ThreadResolver;
use tracing::{debug, info, warn};

use crate::controller::AgentController;
use crate::prompts::DISCOVERY_PROMPT;
use crate::reply::{deliver, Delivery};

/// Shares something new with whoever wrote last, as a new root message.
pub struct DiscoveryAgent {
    agent_name: String,
    controller: Arc<AgentController>,
    store: Arc<dyn StorageAdapter>,
    threads: ThreadResolver,
    channel: Arc<dyn ChannelAdapter>,
    history_limit: usize,
}

impl DiscoveryAgent {
    pub fn new(
        agent_name: impl Into<String>,
        controller: Arc<AgentController>,
        store: Arc<dyn StorageAdapter>,
        channel: Arc<dyn ChannelAdapter>,
        history_limit: usize,
    ) -> Self {
        Self {
            agent_name: agent_name.into(),
            controller,
            threads: ThreadResolver::new(Arc::clone(&store)),
            store,
            channel,
            history_limit,
        }
    }
}

#[async_trait]
impl ScheduledAgent for DiscoveryAgent {
    fn name(&self) -> &str {
        "discovery"
    }

    async fn execute(&self) -> bool {
        let recipient = match self.store.latest_incoming_sender().await {
            Ok(Some(sender)) => sender,
            Ok(None) => {
                debug!("nobody to share a discovery with");
                return false;
            }
            Err(e) => {
                warn!(error = %e, "failed to find the latest user");
                return false;
            }
        };

        let history = self
            .threads
            .conversation_turns(&recipient, &self.agent_name, self.history_limit)
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "failed to load history, continuing without it");
                Vec::new()
            });

        let response = self.controller.run(DISCOVERY_PROMPT, &history).await;
        if let Some(failure) = response.failure {
            warn!(?failure, "discovery run failed");
            return false;
        }

        deliver(
            &self.store,
            &self.channel,
            Delivery {
                sender: &self.agent_name,
                recipient: &recipient,
                parent_id: None,
                attachments: &response.attachments,
            },
            &response.answer,
        )
        .await;
        info!(recipient = %recipient, "discovery sent");
        true
    }
}
