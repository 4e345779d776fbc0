// SPDX-FileCopyrightText: 2026 Penny Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Agent loop, message handling and background agents for Penny.
//!
//! [`Penny`] wires a channel, a message store, two inference adapters and a
//! tool registry into:
//! - a [`Listener`] that hands each inbound message to the [`MessageAgent`]
//!   on its own task
//! - a [`BackgroundScheduler`] that runs the summarize, follow-up and
//!   discovery agents when the conversation goes idle
//!
//! Both stop on a [`CancellationToken`]; afterwards the channel, the
//! inference adapters and the store are closed whatever happened.

pub mod controller;
pub mod discovery;
pub mod followup;
pub mod listener;
pub mod message;
pub mod prompts;
pub mod reply;
pub mod shutdown;
pub mod summarize;

use std::sync::Arc;
use std::time::Duration;

use penny_config::model::{AgentConfig, PennyConfig};
use penny_core::{ChannelAdapter, InferenceAdapter, PennyError, StorageAdapter};
use penny_scheduler::{ActivityTracker, BackgroundScheduler, IdleSchedule, TwoPhaseSchedule};
use penny_skill::{ToolExecutor, ToolRegistry};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{info, warn};

pub use controller::{AgentController, ControllerSet, Response, RunFailure};
pub use discovery::DiscoveryAgent;
pub use followup::FollowupAgent;
pub use listener::Listener;
pub use message::MessageAgent;
pub use summarize::SummarizeAgent;

/// The persona text: `agent.system_prompt`, else the contents of
/// `agent.system_prompt_file`, else the built-in persona.
pub fn resolve_persona(agent: &AgentConfig) -> Result<String, PennyError> {
    if let Some(prompt) = &agent.system_prompt {
        return Ok(prompt.clone());
    }
    if let Some(path) = &agent.system_prompt_file {
        return std::fs::read_to_string(path)
            .map(|text| text.trim().to_string())
            .map_err(|e| PennyError::Config(format!("failed to read system prompt file {path}: {e}")));
    }
    Ok(prompts::DEFAULT_PERSONA.to_string())
}

/// The running system.
pub struct Penny {
    config: PennyConfig,
    channel: Arc<dyn ChannelAdapter>,
    store: Arc<dyn StorageAdapter>,
    controllers: ControllerSet,
    activity: Arc<ActivityTracker>,
    message_agent: Arc<MessageAgent>,
}

impl Penny {
    /// Assembles the system. `store` must already be initialized.
    pub fn new(
        config: PennyConfig,
        persona: &str,
        channel: Arc<dyn ChannelAdapter>,
        store: Arc<dyn StorageAdapter>,
        foreground: Arc<dyn InferenceAdapter>,
        background: Arc<dyn InferenceAdapter>,
        registry: ToolRegistry,
    ) -> Self {
        let tool_timeout = (config.agent.tool_timeout_secs > 0)
            .then(|| Duration::from_secs(config.agent.tool_timeout_secs));
        let executor = ToolExecutor::new(Arc::new(registry)).with_timeout(tool_timeout);
        let controllers = ControllerSet::new(
            &config.agent,
            persona,
            foreground,
            background,
            executor,
            Arc::clone(&store),
        );
        let activity = Arc::new(ActivityTracker::new());
        let message_agent = Arc::new(
            MessageAgent::new(
                &config.agent.name,
                Arc::clone(&controllers.foreground),
                Arc::clone(&store),
                Arc::clone(&channel),
                Arc::clone(&activity),
            )
            .with_limits(config.agent.history_limit, config.agent.thread_limit),
        );

        Self {
            config,
            channel,
            store,
            controllers,
            activity,
            message_agent,
        }
    }

    pub fn message_agent(&self) -> Arc<MessageAgent> {
        Arc::clone(&self.message_agent)
    }

    pub fn activity(&self) -> Arc<ActivityTracker> {
        Arc::clone(&self.activity)
    }

    /// A scheduler with the summarize, follow-up and discovery agents registered.
    pub fn scheduler(&self) -> BackgroundScheduler {
        let agent = &self.config.agent;
        let sched = &self.config.scheduler;
        let mut scheduler = BackgroundScheduler::new(
            Arc::clone(&self.activity),
            Duration::from_millis(sched.tick_interval_ms),
        );

        scheduler.register(
            Box::new(IdleSchedule::new(sched.summarize_idle_secs)),
            Arc::new(SummarizeAgent::new(
                Arc::clone(&self.controllers.summarize),
                Arc::clone(&self.store),
                agent.thread_limit,
            )),
        );
        scheduler.register(
            Box::new(TwoPhaseSchedule::new(sched.followup_min_secs, sched.followup_max_secs)),
            Arc::new(FollowupAgent::new(
                &agent.name,
                Arc::clone(&self.controllers.followup),
                Arc::clone(&self.store),
                Arc::clone(&self.channel),
                agent.thread_limit,
            )),
        );
        scheduler.register(
            Box::new(TwoPhaseSchedule::new(sched.discovery_min_secs, sched.discovery_max_secs)),
            Arc::new(DiscoveryAgent::new(
                &agent.name,
                Arc::clone(&self.controllers.discovery),
                Arc::clone(&self.store),
                Arc::clone(&self.channel),
                agent.history_limit,
            )),
        );
        scheduler
    }

    /// Runs the listener and scheduler until `cancel` fires. In-flight
    /// handlers and background agents are cancelled and awaited, then every
    /// adapter is closed.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), PennyError> {
        info!(name = %self.config.agent.name, "penny running");
        let tracker = TaskTracker::new();

        if self.config.scheduler.enabled {
            tracker.spawn(self.scheduler().run(cancel.clone()));
        } else {
            info!("scheduler disabled");
        }

        let listener = Listener::new(
            Arc::clone(&self.channel),
            Arc::clone(&self.message_agent),
            &self.config.listener,
        );
        listener.run(cancel.clone(), &tracker).await;

        cancel.cancel();
        tracker.close();
        info!(tasks = tracker.len(), "cancelling background tasks");
        tracker.wait().await;

        self.close().await
    }

    /// Closes the channel, the inference adapters and the store, in that
    /// order, attempting each even if an earlier one fails.
    pub async fn close(&self) -> Result<(), PennyError> {
        let mut first_error = None;

        if let Err(e) = self.channel.close().await {
            warn!(error = %e, "failed to close channel");
            first_error.get_or_insert(e);
        }
        if let Err(e) = self.controllers.close_all().await {
            first_error.get_or_insert(e);
        }
        if let Err(e) = self.store.close().await {
            warn!(error = %e, "failed to close store");
            first_error.get_or_insert(e);
        }

        info!("penny stopped");
        first_error.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use penny_test_utils::{MockChannel, MockInference, TempStore};

    fn penny(
        channel: Arc<MockChannel>,
        fg: Arc<MockInference>,
        bg: Arc<MockInference>,
        temp: &TempStore,
    ) -> Penny {
        Penny::new(
            PennyConfig::default(),
            "persona",
            channel,
            temp.adapter(),
            fg,
            bg,
            ToolRegistry::new(),
        )
    }

    #[test]
    fn persona_prefers_inline_then_file_then_default() {
        let mut agent = AgentConfig::default();
        assert_eq!(resolve_persona(&agent).unwrap(), prompts::DEFAULT_PERSONA);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("persona.txt");
        std::fs::write(&path, "  from a file \n").unwrap();
        agent.system_prompt_file = Some(path.to_string_lossy().to_string());
        assert_eq!(resolve_persona(&agent).unwrap(), "from a file");

        agent.system_prompt = Some("inline".into());
        assert_eq!(resolve_persona(&agent).unwrap(), "inline");

        agent.system_prompt = None;
        agent.system_prompt_file = Some(dir.path().join("missing.txt").to_string_lossy().to_string());
        assert!(matches!(resolve_persona(&agent), Err(PennyError::Config(_))));
    }

    #[tokio::test]
    async fn scheduler_has_three_agents() {
        let temp = TempStore::new().await.unwrap();
        let penny = penny(
            Arc::new(MockChannel::new()),
            Arc::new(MockInference::new()),
            Arc::new(MockInference::new()),
            &temp,
        );
        assert_eq!(penny.scheduler().len(), 3);
    }

    #[tokio::test]
    async fn run_closes_everything_after_cancel() {
        let temp = TempStore::new().await.unwrap();
        let channel = Arc::new(MockChannel::new().with_connection_url("ws://127.0.0.1:9/receive"));
        let fg = Arc::new(MockInference::new());
        let bg = Arc::new(MockInference::new());
        let penny = penny(channel.clone(), fg.clone(), bg.clone(), &temp);

        let cancel = CancellationToken::new();
        cancel.cancel();
        penny.run(cancel).await.unwrap();

        assert!(channel.is_closed().await);
        assert!(fg.is_closed().await);
        assert!(bg.is_closed().await);
    }
}
