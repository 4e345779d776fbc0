// SPDX-FileCopyrightText: 2026 Penny Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks constraints serde cannot express. All problems are collected
//! rather than stopping at the first.

use crate::diagnostic::ConfigError;
use crate::model::PennyConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration.
pub fn validate_config(config: &PennyConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.agent.name.trim().is_empty() {
        errors.push(ConfigError::validation("agent.name must not be empty"));
    }
    if !LOG_LEVELS.contains(&config.agent.log_level.to_lowercase().as_str()) {
        errors.push(ConfigError::validation(format!(
            "agent.log_level `{}` must be one of {}",
            config.agent.log_level,
            LOG_LEVELS.join(", ")
        )));
    }
    if config.agent.max_steps == 0 {
        errors.push(ConfigError::validation("agent.max_steps must be at least 1"));
    }
    if config.agent.history_limit == 0 {
        errors.push(ConfigError::validation(
            "agent.history_limit must be at least 1",
        ));
    }
    if config.agent.thread_limit == 0 {
        errors.push(ConfigError::validation("agent.thread_limit must be at least 1"));
    }

    if let Some(number) = &config.signal.number
        && number.trim().is_empty()
    {
        errors.push(ConfigError::validation(
            "signal.number must not be empty when set",
        ));
    }
    check_http_url(&mut errors, "signal.api_url", &config.signal.api_url);
    if config.signal.max_message_length < 16 {
        errors.push(ConfigError::validation(format!(
            "signal.max_message_length must be at least 16, got {}",
            config.signal.max_message_length
        )));
    }

    check_http_url(&mut errors, "ollama.api_url", &config.ollama.api_url);
    if config.ollama.foreground_model.trim().is_empty() {
        errors.push(ConfigError::validation(
            "ollama.foreground_model must not be empty",
        ));
    }
    if config.ollama.request_timeout_secs == 0 {
        errors.push(ConfigError::validation(
            "ollama.request_timeout_secs must be at least 1",
        ));
    }

    check_http_url(&mut errors, "search.api_url", &config.search.api_url);

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::validation(
            "storage.database_path must not be empty",
        ));
    }

    if config.listener.receive_timeout_secs == 0 {
        errors.push(ConfigError::validation(
            "listener.receive_timeout_secs must be at least 1",
        ));
    }
    if config.listener.max_concurrent_handlers == 0 {
        errors.push(ConfigError::validation(
            "listener.max_concurrent_handlers must be at least 1",
        ));
    }

    let sched = &config.scheduler;
    if sched.tick_interval_ms == 0 {
        errors.push(ConfigError::validation(
            "scheduler.tick_interval_ms must be at least 1",
        ));
    }
    for (key, value) in [
        ("scheduler.summarize_idle_secs", sched.summarize_idle_secs),
        ("scheduler.followup_min_secs", sched.followup_min_secs),
        ("scheduler.followup_max_secs", sched.followup_max_secs),
        ("scheduler.discovery_min_secs", sched.discovery_min_secs),
        ("scheduler.discovery_max_secs", sched.discovery_max_secs),
    ] {
        if !value.is_finite() || value < 0.0 {
            errors.push(ConfigError::validation(format!(
                "{key} must be a non-negative number, got {value}"
            )));
        }
    }
    check_window(
        &mut errors,
        "followup",
        sched.followup_min_secs,
        sched.followup_max_secs,
    );
    check_window(
        &mut errors,
        "discovery",
        sched.discovery_min_secs,
        sched.discovery_max_secs,
    );

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_http_url(errors: &mut Vec<ConfigError>, key: &str, value: &str) {
    let value = value.trim();
    if !(value.starts_with("http://") || value.starts_with("https://")) {
        errors.push(ConfigError::validation(format!(
            "{key} `{value}` must start with http:// or https://"
        )));
    }
}

fn check_window(errors: &mut Vec<ConfigError>, name: &str, min: f64, max: f64) {
    if min > max {
        errors.push(ConfigError::validation(format!(
            "scheduler.{name}_min_secs ({min}) must not exceed scheduler.{name}_max_secs ({max})"
        )));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&PennyConfig::default()).is_ok());
    }

    #[test]
    fn collects_every_problem() {
        let mut config = PennyConfig::default();
        config.agent.max_steps = 0;
        config.ollama.api_url = "localhost:11434".into();
        config.scheduler.followup_min_secs = 100.0;
        config.scheduler.followup_max_secs = 10.0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3, "got: {errors:?}");
    }

    #[test]
    fn rejects_unknown_log_level() {
        let mut config = PennyConfig::default();
        config.agent.log_level = "verbose".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].to_string().contains("agent.log_level"));
    }

    #[test]
    fn rejects_blank_signal_number() {
        let mut config = PennyConfig::default();
        config.signal.number = Some("  ".into());
        assert!(validate_config(&config).is_err());
    }
}
