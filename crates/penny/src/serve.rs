// SPDX-FileCopyrightText: 2026 Penny Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `penny serve` command implementation.
//!
//! Opens the message store, builds the Signal channel, the foreground and
//! background Ollama providers and the built-in tools, then runs the agent
//! until SIGINT or SIGTERM.

use std::sync::Arc;

use penny_agent::{resolve_persona, shutdown, Penny};
use penny_config::model::PennyConfig;
use penny_core::types::HealthStatus;
use penny_core::{ChannelAdapter, InferenceAdapter, PennyError, PluginAdapter, StorageAdapter};
use penny_ollama::OllamaProvider;
use penny_signal::SignalChannel;
use penny_skill::builtin::register_builtins;
use penny_skill::ToolRegistry;
use penny_storage::SqliteStorage;
use tracing::{info, warn};

/// Runs the `penny serve` command.
pub async fn run_serve(config: PennyConfig) -> Result<(), PennyError> {
    init_tracing(&config.agent.log_level);
    info!(name = %config.agent.name, "starting penny serve");

    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    let store: Arc<dyn StorageAdapter> = Arc::new(storage);

    let channel = Arc::new(SignalChannel::new(&config.signal)?);
    let foreground = Arc::new(OllamaProvider::foreground(&config.ollama)?);
    let background = Arc::new(OllamaProvider::background(&config.ollama)?);

    report_health(&*channel).await;
    report_health(&*foreground).await;

    let mut registry = ToolRegistry::new();
    register_builtins(&mut registry, &config.search, Some(Arc::clone(&store)));
    info!(
        tools = registry.len(),
        foreground = foreground.model(),
        background = background.model(),
        "adapters ready"
    );

    let persona = resolve_persona(&config.agent)?;
    let channel: Arc<dyn ChannelAdapter> = channel;
    let foreground: Arc<dyn InferenceAdapter> = foreground;
    let background: Arc<dyn InferenceAdapter> = background;
    let penny = Penny::new(config, &persona, channel, store, foreground, background, registry);

    let cancel = shutdown::install_signal_handler();
    penny.run(cancel).await
}

/// Logs an adapter's startup health. Serving continues either way; the
/// listener keeps reconnecting until the backend comes up.
async fn report_health(adapter: &dyn PluginAdapter) {
    match adapter.health_check().await {
        Ok(HealthStatus::Healthy) => info!(adapter = adapter.name(), "healthy"),
        Ok(HealthStatus::Degraded(reason)) => {
            warn!(adapter = adapter.name(), reason = %reason, "degraded")
        }
        Ok(HealthStatus::Unhealthy(reason)) => {
            warn!(adapter = adapter.name(), reason = %reason, "unhealthy")
        }
        Err(e) => warn!(adapter = adapter.name(), error = %e, "health check failed"),
    }
}

/// Crates whose events follow `agent.log_level`; everything else logs at warn.
const PENNY_TARGETS: &[&str] = &[
    "penny",
    "penny_agent",
    "penny_ollama",
    "penny_scheduler",
    "penny_signal",
    "penny_skill",
    "penny_storage",
];

/// `RUST_LOG` takes precedence over `agent.log_level`.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let directives: Vec<String> = PENNY_TARGETS
            .iter()
            .map(|target| format!("{target}={log_level}"))
            .collect();
        EnvFilter::new(format!("{},warn", directives.join(",")))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
