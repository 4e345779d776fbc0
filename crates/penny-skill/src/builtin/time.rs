// SPDX-FileCopyrightText: 2026 Penny Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in clock tool.

use async_trait::async_trait;
use penny_core::types::ToolOutput;
use penny_core::PennyError;

use crate::tool::Tool;

/// Reports the current UTC date and time in RFC 3339 form.
pub struct GetCurrentTimeTool;

#[async_trait]
impl Tool for GetCurrentTimeTool {
    fn name(&self) -> &str {
        "get_current_time"
    }

    fn description(&self) -> &str {
        "Get the current date and time in ISO format. Use this when the user asks about the current time or date."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn invoke(&self, _arguments: serde_json::Value) -> Result<ToolOutput, PennyError> {
        Ok(ToolOutput::Text(chrono::Utc::now().to_rfc3339()))
    }
}
