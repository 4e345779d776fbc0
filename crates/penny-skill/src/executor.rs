// SPDX-FileCopyrightText: 2026 Penny Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Executes model-requested tool calls.
//!
//! The executor never fails: an unknown tool, an error returned by the tool,
//! a panic inside it, or a timeout all become the error side of the
//! [`ToolResult`] so the model can see what went wrong.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use penny_core::types::{ToolCall, ToolResult, ToolSchema};
use tracing::{debug, warn};

use crate::tool::ToolRegistry;

/// Error text for a call to a tool that is not registered.
pub const UNKNOWN_TOOL: &str = "unknown tool";

/// Dispatches [`ToolCall`]s to the registry.
#[derive(Clone)]
pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
    timeout: Option<Duration>,
}

impl ToolExecutor {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            timeout: None,
        }
    }

    /// Bounds each call. Without a timeout a call may run indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Schemas of all registered tools.
    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.registry.schemas()
    }

    /// Runs one call and normalizes the outcome.
    pub async fn execute(&self, call: &ToolCall) -> ToolResult {
        let Some(tool) = self.registry.get(&call.tool) else {
            warn!(tool = %call.tool, "model requested an unknown tool");
            return ToolResult::error(&call.tool, UNKNOWN_TOOL);
        };

        debug!(tool = %call.tool, arguments = %call.arguments, "executing tool");
        let invocation = AssertUnwindSafe(tool.invoke(call.arguments.clone())).catch_unwind();

        let outcome = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, invocation).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    warn!(tool = %call.tool, timeout = ?limit, "tool timed out");
                    return ToolResult::error(
                        &call.tool,
                        format!("timed out after {}s", limit.as_secs_f64()),
                    );
                }
            },
            None => invocation.await,
        };

        match outcome {
            Ok(Ok(output)) => ToolResult::ok(&call.tool, output),
            Ok(Err(e)) => {
                warn!(tool = %call.tool, error = %e, "tool failed");
                ToolResult::error(&call.tool, e.to_string())
            }
            Err(_) => {
                warn!(tool = %call.tool, "tool panicked");
                ToolResult::error(&call.tool, "tool crashed")
            }
        }
    }
}
