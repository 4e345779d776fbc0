// SPDX-FileCopyrightText: 2026 Penny Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Handling of one inbound message, from log entry to delivered reply.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use penny_core::types::{InboundMessage, NewMessage, Turn};
use penny_core::{ChannelAdapter, StorageAdapter};
use penny_scheduler::ActivityTracker;
use penny_storage::ThreadResolver;
use tracing::{debug, error, info, warn};

use crate::controller::AgentController;
use crate::reply::{deliver, Delivery};

/// Reply when the run produced no text at all.
pub const NO_RESPONSE: &str = "Sorry, I couldn't generate a response.";
/// Reply when handling the message failed unexpectedly.
pub const PROCESSING_ERROR: &str = "Sorry, I encountered an error processing your message.";

/// Answers inbound messages with the foreground controller.
pub struct MessageAgent {
    agent_name: String,
    controller: Arc<AgentController>,
    store: Arc<dyn StorageAdapter>,
    threads: ThreadResolver,
    channel: Arc<dyn ChannelAdapter>,
    activity: Arc<ActivityTracker>,
    history_limit: usize,
    thread_limit: usize,
}

impl MessageAgent {
    pub fn new(
        agent_name: impl Into<String>,
        controller: Arc<AgentController>,
        store: Arc<dyn StorageAdapter>,
        channel: Arc<dyn ChannelAdapter>,
        activity: Arc<ActivityTracker>,
    ) -> Self {
        Self {
            agent_name: agent_name.into(),
            controller,
            threads: ThreadResolver::new(Arc::clone(&store)),
            store,
            channel,
            activity,
            history_limit: 20,
            thread_limit: 20,
        }
    }

    pub fn with_limits(mut self, history_limit: usize, thread_limit: usize) -> Self {
        self.history_limit = history_limit;
        self.thread_limit = thread_limit;
        self
    }

    /// Handles one message end to end. Never fails; problems are logged and
    /// the sender gets an apology at worst.
    pub async fn handle(&self, inbound: InboundMessage) {
        self.activity.notify();
        info!(sender = %inbound.sender, len = inbound.content.len(), "inbound message");

        let parent_id = match &inbound.quoted_text {
            Some(quoted) => self.resolve_quote(quoted).await,
            None => None,
        };
        let history = self.history(&inbound.sender, parent_id).await;

        let incoming = NewMessage::incoming(&inbound.sender, &self.agent_name, &inbound.content)
            .with_parent(parent_id);
        let incoming_id = match self.store.append_message(&incoming).await {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(error = %e, "failed to record incoming message");
                None
            }
        };

        if let Err(e) = self.channel.send_typing(&inbound.sender, true).await {
            debug!(error = %e, "failed to start typing indicator");
        }

        let run = AssertUnwindSafe(self.controller.run(&inbound.content, &history)).catch_unwind();
        let (answer, attachments) = match run.await {
            Ok(response) if response.answer.trim().is_empty() => (NO_RESPONSE.to_string(), Vec::new()),
            Ok(response) => (response.answer, response.attachments),
            Err(_) => {
                error!(sender = %inbound.sender, "agent run panicked");
                (PROCESSING_ERROR.to_string(), Vec::new())
            }
        };

        if let Err(e) = self.channel.send_typing(&inbound.sender, false).await {
            debug!(error = %e, "failed to stop typing indicator");
        }

        deliver(
            &self.store,
            &self.channel,
            Delivery {
                sender: &self.agent_name,
                recipient: &inbound.sender,
                parent_id: incoming_id,
                attachments: &attachments,
            },
            &answer,
        )
        .await;
    }

    /// The outgoing record the person quote-replied to, if it can be found.
    async fn resolve_quote(&self, quoted: &str) -> Option<i64> {
        match self.store.find_latest_outgoing_by_content(quoted).await {
            Ok(Some(record)) => {
                debug!(parent_id = record.id, "quote resolved");
                Some(record.id)
            }
            Ok(None) => {
                debug!("quoted text matches no outgoing message");
                None
            }
            Err(e) => {
                warn!(error = %e, "quote lookup failed");
                None
            }
        }
    }

    /// The quoted thread when there is one, otherwise recent conversation.
    async fn history(&self, sender: &str, parent_id: Option<i64>) -> Vec<Turn> {
        let turns = match parent_id {
            Some(id) => self.threads.thread_turns(id, self.thread_limit).await,
            None => {
                self.threads
                    .conversation_turns(sender, &self.agent_name, self.history_limit)
                    .await
            }
        };
        turns.unwrap_or_else(|e| {
            warn!(error = %e, "failed to load history, continuing without it");
            Vec::new()
        })
    }
}
