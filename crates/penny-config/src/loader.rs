// SPDX-FileCopyrightText: 2026 Penny Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./penny.toml` > `~/.config/penny/penny.toml` > `/etc/penny/penny.toml`
//! with environment variable overrides via the `PENNY_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::PennyConfig;

/// Config sections that environment variables may target.
const SECTIONS: &[&str] = &[
    "agent",
    "signal",
    "ollama",
    "search",
    "storage",
    "listener",
    "scheduler",
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/penny/penny.toml`
/// 3. `~/.config/penny/penny.toml`
/// 4. `./penny.toml`
/// 5. `PENNY_*` environment variables
pub fn load_config() -> Result<PennyConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<PennyConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PennyConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<PennyConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PennyConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The Figment used for the standard hierarchy, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(PennyConfig::default()))
        .merge(Toml::file("/etc/penny/penny.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("penny/penny.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("penny.toml"))
        .merge(env_provider())
}

/// Environment provider that maps `PENNY_<SECTION>_<KEY>` to `<section>.<key>`.
///
/// Only the first underscore after a known section name becomes a dot, so
/// `PENNY_OLLAMA_FOREGROUND_MODEL` maps to `ollama.foreground_model`.
pub(crate) fn env_provider() -> Env {
    Env::prefixed("PENNY_").map(|key| map_env_key(key.as_str()).into())
}

fn map_env_key(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
