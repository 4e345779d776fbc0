// SPDX-FileCopyrightText: 2026 Penny Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock tool that counts invocations.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use penny_core::types::{SearchResult, ToolOutput};
use penny_core::PennyError;
use penny_skill::Tool;

/// A tool returning a fixed output (or a fixed error) on every call.
pub struct MockTool {
    name: String,
    outcome: Result<ToolOutput, String>,
    calls: Arc<AtomicUsize>,
}

impl MockTool {
    pub fn new(name: impl Into<String>, output: impl Into<ToolOutput>) -> Self {
        Self {
            name: name.into(),
            outcome: Ok(output.into()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A `search`-style tool returning `text` and source `urls`.
    pub fn search(text: &str, urls: &[&str]) -> Self {
        Self::new(
            "search",
            ToolOutput::Search(SearchResult {
                text: text.to_string(),
                urls: urls.iter().map(|u| u.to_string()).collect(),
                image_base64: None,
            }),
        )
    }

    /// A tool that always fails with `message`.
    pub fn failing(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            outcome: Err(message.into()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared counter, still readable after the tool moves into a registry.
    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Tool for MockTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "mock tool"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({"type": "object", "properties": {}})
    }

    async fn invoke(&self, _arguments: serde_json::Value) -> Result<ToolOutput, PennyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone().map_err(|message| PennyError::Tool {
            tool: self.name.clone(),
            message,
        })
    }
}
