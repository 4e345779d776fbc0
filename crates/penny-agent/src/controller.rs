// SPDX-FileCopyrightText: 2026 Penny Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The agentic loop.
//!
//! An [`AgentController`] drives one model through up to `max_steps`
//! request/tool rounds until it produces a final answer. It never returns
//! an error: inference failures, empty replies and an exhausted step budget
//! all become a [`Response`] carrying a fixed apology and a [`RunFailure`].

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use penny_config::model::AgentConfig;
use penny_core::types::{
    ChatMessage, ChatResponse, PromptLogEntry, ToolOutput, ToolResult, ToolSchema, Turn,
};
use penny_core::{InferenceAdapter, PennyError, StorageAdapter};
use penny_skill::executor::UNKNOWN_TOOL;
use penny_skill::ToolExecutor;
use tracing::{debug, error, info, warn};

use crate::prompts::{REPEAT_TOOL_DIRECTIVE, SEARCH_RESULT_DIRECTIVE};

/// Reply when the inference backend could not be reached or failed.
pub const INFERENCE_APOLOGY: &str = "Sorry, I encountered an error communicating with the model.";
/// Reply when the model answered with nothing.
pub const EMPTY_RESPONSE_APOLOGY: &str = "Sorry, the model generated an empty response.";
/// Reply when the model kept calling tools until the step budget ran out.
pub const STEP_BUDGET_APOLOGY: &str =
    "Sorry, I couldn't complete that request within the allowed steps.";

/// Why a run ended without a real answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunFailure {
    Inference,
    EmptyResponse,
    StepBudgetExceeded,
}

impl RunFailure {
    /// The fixed text sent to the user in place of an answer.
    pub fn apology(self) -> &'static str {
        match self {
            RunFailure::Inference => INFERENCE_APOLOGY,
            RunFailure::EmptyResponse => EMPTY_RESPONSE_APOLOGY,
            RunFailure::StepBudgetExceeded => STEP_BUDGET_APOLOGY,
        }
    }
}

/// Outcome of one [`AgentController::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Final answer, or the apology when `failure` is set.
    pub answer: String,
    pub thinking: Option<String>,
    /// Base64-encoded images collected from tool results.
    pub attachments: Vec<String>,
    pub failure: Option<RunFailure>,
}

impl Response {
    fn failed(failure: RunFailure) -> Self {
        Self {
            answer: failure.apology().to_string(),
            thinking: None,
            attachments: Vec::new(),
            failure: Some(failure),
        }
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

/// One persona bound to one model and an optional tool set.
pub struct AgentController {
    name: String,
    system_prompt: String,
    inference: Arc<dyn InferenceAdapter>,
    executor: Option<ToolExecutor>,
    max_steps: usize,
    prompt_log: Option<Arc<dyn StorageAdapter>>,
}

impl AgentController {
    pub fn new(
        name: impl Into<String>,
        system_prompt: impl Into<String>,
        inference: Arc<dyn InferenceAdapter>,
    ) -> Self {
        Self {
            name: name.into(),
            system_prompt: system_prompt.into(),
            inference,
            executor: None,
            max_steps: 5,
            prompt_log: None,
        }
    }

    /// Offers the executor's tools to the model.
    pub fn with_tools(mut self, executor: ToolExecutor) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Records every successful inference call in `store`.
    pub fn with_prompt_log(mut self, store: Option<Arc<dyn StorageAdapter>>) -> Self {
        self.prompt_log = store;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model(&self) -> &str {
        self.inference.model()
    }

    fn build_messages(&self, prompt: &str, history: &[Turn]) -> Vec<ChatMessage> {
        let now = Utc::now().format("%A, %B %d, %Y at %I:%M %p UTC");
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(format!(
            "Current date and time: {now}\n\n{}",
            self.system_prompt
        )));
        messages.extend(history.iter().map(|turn| ChatMessage {
            role: turn.role(),
            content: turn.content.clone(),
            tool_calls: Vec::new(),
        }));
        messages.push(ChatMessage::user(prompt));
        messages
    }

    /// Runs the loop for `prompt` with `history` as prior turns, oldest first.
    pub async fn run(&self, prompt: &str, history: &[Turn]) -> Response {
        let mut messages = self.build_messages(prompt, history);
        let tools = self
            .executor
            .as_ref()
            .map(ToolExecutor::schemas)
            .unwrap_or_default();
        debug!(agent = %self.name, tools = tools.len(), history = history.len(), "starting run");

        let mut attachments = Vec::new();
        let mut source_urls: Vec<String> = Vec::new();
        let mut called_tools: HashSet<String> = HashSet::new();

        for step in 1..=self.max_steps {
            info!(agent = %self.name, step, max_steps = self.max_steps, "agent step");

            let started = Instant::now();
            let response = match self.inference.chat(&messages, &tools).await {
                Ok(response) => response,
                Err(e) => {
                    error!(agent = %self.name, error = %e, "inference failed");
                    return Response::failed(RunFailure::Inference);
                }
            };
            self.log_prompt(&messages, &tools, &response, started).await;

            if !response.tool_calls.is_empty() {
                info!(agent = %self.name, count = response.tool_calls.len(), "model requested tool calls");
                messages.push(ChatMessage::assistant_tool_calls(
                    response.content.clone(),
                    response.tool_calls.clone(),
                ));

                for call in &response.tool_calls {
                    if !called_tools.insert(call.tool.clone()) {
                        info!(tool = %call.tool, "skipping repeat tool call");
                        messages.push(ChatMessage::tool(REPEAT_TOOL_DIRECTIVE));
                        continue;
                    }

                    let result = match &self.executor {
                        Some(executor) => executor.execute(call).await,
                        None => ToolResult::error(&call.tool, UNKNOWN_TOOL),
                    };
                    let text = format_tool_result(result, &mut source_urls, &mut attachments);
                    debug!(tool = %call.tool, result = %preview(&text), "tool result");
                    messages.push(ChatMessage::tool(text));
                }
                continue;
            }

            let content = response.content.trim();
            if content.is_empty() {
                error!(agent = %self.name, "model returned empty content");
                return Response::failed(RunFailure::EmptyResponse);
            }

            let mut answer = content.to_string();
            if let Some(first) = source_urls.first()
                && !answer.contains("http")
            {
                answer.push_str("\n\n");
                answer.push_str(first);
            }

            if let Some(thinking) = &response.thinking {
                debug!(len = thinking.len(), "model returned thinking");
            }
            info!(agent = %self.name, len = answer.len(), step, "final answer");
            return Response {
                answer,
                thinking: response.thinking,
                attachments,
                failure: None,
            };
        }

        warn!(agent = %self.name, max_steps = self.max_steps, "step budget exhausted");
        Response::failed(RunFailure::StepBudgetExceeded)
    }

    async fn log_prompt(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolSchema],
        response: &ChatResponse,
        started: Instant,
    ) {
        let Some(store) = &self.prompt_log else {
            return;
        };
        let entry = PromptLogEntry {
            model: self.inference.model().to_string(),
            messages: to_json(messages),
            tools: (!tools.is_empty()).then(|| to_json(tools)),
            response: to_json(response),
            thinking: response.thinking.clone(),
            duration_ms: i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX),
        };
        if let Err(e) = store.log_prompt(&entry).await {
            warn!(error = %e, "failed to record prompt log");
        }
    }

    async fn close(&self) -> Result<(), PennyError> {
        self.inference.shutdown().await
    }
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

fn preview(text: &str) -> &str {
    match text.char_indices().nth(200) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Renders a tool result as the tool-role message content.
///
/// Search results list their sources and push their image into
/// `attachments`; source urls are also collected into `source_urls`.
fn format_tool_result(
    result: ToolResult,
    source_urls: &mut Vec<String>,
    attachments: &mut Vec<String>,
) -> String {
    match result.outcome {
        Err(error) => format!("Error: {error}"),
        Ok(ToolOutput::Text(text)) => text,
        Ok(ToolOutput::Search(search)) => {
            let mut text = search.text;
            if !search.urls.is_empty() {
                text.push_str("\n\nSources:\n");
                text.push_str(&search.urls.join("\n"));
                source_urls.extend(search.urls);
            }
            if let Some(image) = search.image_base64 {
                attachments.push(image);
            }
            text.push_str("\n\n");
            text.push_str(SEARCH_RESULT_DIRECTIVE);
            text
        }
    }
}

/// The controllers one process uses, built and disposed together.
pub struct ControllerSet {
    /// Answers inbound messages; foreground model with tools.
    pub foreground: Arc<AgentController>,
    /// Summarizes idle threads; background model, no tools.
    pub summarize: Arc<AgentController>,
    /// Continues idle threads; background model with tools.
    pub followup: Arc<AgentController>,
    /// Starts new topics; background model with tools.
    pub discovery: Arc<AgentController>,
}

impl ControllerSet {
    pub fn new(
        agent: &AgentConfig,
        persona: &str,
        foreground: Arc<dyn InferenceAdapter>,
        background: Arc<dyn InferenceAdapter>,
        executor: ToolExecutor,
        store: Arc<dyn StorageAdapter>,
    ) -> Self {
        let prompt_log = agent.log_prompts.then_some(store);
        let build = |name: &str, prompt: &str, inference: &Arc<dyn InferenceAdapter>| {
            AgentController::new(name, prompt, Arc::clone(inference))
                .with_max_steps(agent.max_steps)
                .with_prompt_log(prompt_log.clone())
        };

        let set = Self {
            foreground: Arc::new(build("message", persona, &foreground).with_tools(executor.clone())),
            summarize: Arc::new(build(
                "summarize",
                crate::prompts::SUMMARIZE_PERSONA,
                &background,
            )),
            followup: Arc::new(build("followup", persona, &background).with_tools(executor.clone())),
            discovery: Arc::new(build("discovery", persona, &background).with_tools(executor)),
        };
        info!(
            foreground = %set.foreground.model(),
            background = %set.summarize.model(),
            max_steps = agent.max_steps,
            "controllers initialized"
        );
        set
    }

    /// Shuts down every distinct inference adapter once.
    pub async fn close_all(&self) -> Result<(), PennyError> {
        let mut closed: Vec<&Arc<dyn InferenceAdapter>> = Vec::new();
        let mut first_error = None;
        for controller in [&self.foreground, &self.summarize, &self.followup, &self.discovery] {
            if closed.iter().any(|c| Arc::ptr_eq(*c, &controller.inference)) {
                continue;
            }
            closed.push(&controller.inference);
            if let Err(e) = controller.close().await {
                warn!(controller = %controller.name, error = %e, "failed to close inference adapter");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
