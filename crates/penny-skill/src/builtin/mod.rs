// SPDX-FileCopyrightText: 2026 Penny Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in tools.

pub mod search;
pub mod time;

pub use search::SearchTool;
pub use time::GetCurrentTimeTool;

use std::sync::Arc;

use penny_config::model::SearchConfig;
use penny_core::StorageAdapter;
use tracing::info;

use crate::ToolRegistry;

/// Registers the built-in tools. The search tool is only added when an API
/// key is configured.
pub fn register_builtins(
    registry: &mut ToolRegistry,
    search: &SearchConfig,
    store: Option<Arc<dyn StorageAdapter>>,
) {
    registry.register(Arc::new(GetCurrentTimeTool));
    match &search.api_key {
        Some(api_key) => registry.register(Arc::new(SearchTool::new(search, api_key, store))),
        None => info!("search.api_key not set, search tool disabled"),
    }
}
