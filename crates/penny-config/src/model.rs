// SPDX-FileCopyrightText: 2026 Penny Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Penny agent.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Penny configuration.
///
/// Every section is optional and falls back to its defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PennyConfig {
    /// Agent identity and loop behavior.
    #[serde(default)]
    pub agent: AgentConfig,

    /// signal-cli REST bridge settings.
    #[serde(default)]
    pub signal: SignalConfig,

    /// Ollama inference backend settings.
    #[serde(default)]
    pub ollama: OllamaConfig,

    /// Web search tool settings.
    #[serde(default)]
    pub search: SearchConfig,

    /// Message store settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Channel listener settings.
    #[serde(default)]
    pub listener: ListenerConfig,

    /// Background agent scheduling.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

/// Agent identity and behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the agent.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Inline persona prompt. Overridden by `system_prompt_file` if both set.
    #[serde(default)]
    pub system_prompt: Option<String>,

    /// Path to a file containing the persona prompt.
    #[serde(default)]
    pub system_prompt_file: Option<String>,

    /// Upper bound on model calls per run.
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,

    /// Number of conversation turns loaded as history.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Number of records loaded when walking a quote-reply thread.
    #[serde(default = "default_thread_limit")]
    pub thread_limit: usize,

    /// Per-call tool timeout in seconds. `0` disables the timeout.
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,

    /// Record every inference exchange in the prompt log.
    #[serde(default = "default_true")]
    pub log_prompts: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
            system_prompt: None,
            system_prompt_file: None,
            max_steps: default_max_steps(),
            history_limit: default_history_limit(),
            thread_limit: default_thread_limit(),
            tool_timeout_secs: default_tool_timeout_secs(),
            log_prompts: true,
        }
    }
}

fn default_agent_name() -> String {
    "penny".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_steps() -> usize {
    5
}

fn default_history_limit() -> usize {
    20
}

fn default_thread_limit() -> usize {
    20
}

fn default_tool_timeout_secs() -> u64 {
    60
}

fn default_true() -> bool {
    true
}

/// signal-cli REST bridge configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SignalConfig {
    /// The agent's own registered number. Required to serve.
    #[serde(default)]
    pub number: Option<String>,

    /// Base URL of the REST bridge.
    #[serde(default = "default_signal_api_url")]
    pub api_url: String,

    /// Longest text sent in one message before the reply is split.
    #[serde(default = "default_max_message_length")]
    pub max_message_length: usize,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            number: None,
            api_url: default_signal_api_url(),
            max_message_length: default_max_message_length(),
        }
    }
}

fn default_signal_api_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_max_message_length() -> usize {
    2000
}

/// Ollama inference configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OllamaConfig {
    /// Base URL of the Ollama API.
    #[serde(default = "default_ollama_api_url")]
    pub api_url: String,

    /// Model used to answer incoming messages.
    #[serde(default = "default_foreground_model")]
    pub foreground_model: String,

    /// Model used by background agents. Defaults to the foreground model.
    #[serde(default)]
    pub background_model: Option<String>,

    /// Retries after a transient failure.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay between retries, in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            api_url: default_ollama_api_url(),
            foreground_model: default_foreground_model(),
            background_model: None,
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl OllamaConfig {
    /// The model background agents use.
    pub fn background_model(&self) -> &str {
        self.background_model
            .as_deref()
            .unwrap_or(&self.foreground_model)
    }
}

fn default_ollama_api_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_foreground_model() -> String {
    "llama3.2".to_string()
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    500
}

fn default_request_timeout_secs() -> u64 {
    120
}

/// Perplexity search configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SearchConfig {
    /// API key. `None` disables the search tool.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL of the Perplexity API.
    #[serde(default = "default_search_api_url")]
    pub api_url: String,

    /// Search model name.
    #[serde(default = "default_search_model")]
    pub model: String,

    /// Ask for an image alongside the answer and attach the first one.
    #[serde(default = "default_true")]
    pub include_images: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_search_api_url(),
            model: default_search_model(),
            include_images: true,
        }
    }
}

fn default_search_api_url() -> String {
    "https://api.perplexity.ai".to_string()
}

fn default_search_model() -> String {
    "sonar".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_true")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: true,
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("penny").join("penny.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("penny.db"))
        .to_string_lossy()
        .into_owned()
}

/// Channel listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ListenerConfig {
    /// Longest wait for one inbound frame before re-checking for shutdown.
    #[serde(default = "default_receive_timeout_secs")]
    pub receive_timeout_secs: u64,

    /// Pause before reconnecting after a transport failure.
    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,

    /// Upper bound on messages handled at the same time.
    #[serde(default = "default_max_concurrent_handlers")]
    pub max_concurrent_handlers: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            receive_timeout_secs: default_receive_timeout_secs(),
            reconnect_delay_secs: default_reconnect_delay_secs(),
            max_concurrent_handlers: default_max_concurrent_handlers(),
        }
    }
}

fn default_receive_timeout_secs() -> u64 {
    30
}

fn default_reconnect_delay_secs() -> u64 {
    5
}

fn default_max_concurrent_handlers() -> usize {
    16
}

/// Background agent scheduling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Run background agents at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Interval between scheduler ticks, in milliseconds.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Idle seconds before thread summarization runs.
    #[serde(default = "default_summarize_idle_secs")]
    pub summarize_idle_secs: f64,

    /// Lower bound of the idle window for a follow-up.
    #[serde(default = "default_followup_min_secs")]
    pub followup_min_secs: f64,

    /// Upper bound of the idle window for a follow-up.
    #[serde(default = "default_followup_max_secs")]
    pub followup_max_secs: f64,

    /// Lower bound of the idle window for discovery.
    #[serde(default = "default_discovery_min_secs")]
    pub discovery_min_secs: f64,

    /// Upper bound of the idle window for discovery.
    #[serde(default = "default_discovery_max_secs")]
    pub discovery_max_secs: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tick_interval_ms: default_tick_interval_ms(),
            summarize_idle_secs: default_summarize_idle_secs(),
            followup_min_secs: default_followup_min_secs(),
            followup_max_secs: default_followup_max_secs(),
            discovery_min_secs: default_discovery_min_secs(),
            discovery_max_secs: default_discovery_max_secs(),
        }
    }
}

fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_summarize_idle_secs() -> f64 {
    300.0
}

fn default_followup_min_secs() -> f64 {
    3600.0
}

fn default_followup_max_secs() -> f64 {
    7200.0
}

fn default_discovery_min_secs() -> f64 {
    7200.0
}

fn default_discovery_max_secs() -> f64 {
    14400.0
}
