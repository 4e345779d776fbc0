// SPDX-FileCopyrightText: 2026 Penny Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Web search through the Perplexity chat completions API.
//!
//! Returns the answer text, the cited source URLs and, when requested, the
//! first returned image downloaded and base64-encoded so the channel can
//! attach it.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::Engine;
use penny_config::model::SearchConfig;
use penny_core::types::{SearchLogEntry, SearchResult, ToolOutput};
use penny_core::{PennyError, StorageAdapter};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::tool::Tool;

const TOOL_NAME: &str = "search";

/// Images larger than this are not attached.
const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

#[derive(Serialize)]
struct SearchRequest<'a> {
    model: &'a str,
    messages: [RequestMessage<'a>; 1],
    return_images: bool,
}

#[derive(Serialize)]
struct RequestMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct SearchResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    citations: Vec<String>,
    #[serde(default)]
    images: Vec<ImageRef>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// Perplexity has returned images both as bare URLs and as objects.
#[derive(Deserialize)]
#[serde(untagged)]
enum ImageRef {
    Url(String),
    Object { image_url: String },
}

impl ImageRef {
    fn url(&self) -> &str {
        match self {
            ImageRef::Url(url) => url,
            ImageRef::Object { image_url } => image_url,
        }
    }
}

/// Searches the web and answers with sources.
pub struct SearchTool {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    include_images: bool,
    store: Option<Arc<dyn StorageAdapter>>,
}

impl SearchTool {
    pub fn new(config: &SearchConfig, api_key: &str, store: Option<Arc<dyn StorageAdapter>>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_default();
        Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: config.model.clone(),
            include_images: config.include_images,
            store,
        }
    }

    fn error(message: impl Into<String>) -> PennyError {
        PennyError::Tool {
            tool: TOOL_NAME.to_string(),
            message: message.into(),
        }
    }

    async fn query(&self, query: &str) -> Result<SearchResponse, PennyError> {
        let body = SearchRequest {
            model: &self.model,
            messages: [RequestMessage {
                role: "user",
                content: query,
            }],
            return_images: self.include_images,
        };
        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Self::error(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Self::error(format!("search API returned {status}: {text}")));
        }
        response
            .json::<SearchResponse>()
            .await
            .map_err(|e| Self::error(format!("undecodable search response: {e}")))
    }

    /// Downloads an image, returning it base64-encoded. Failures are logged
    /// and yield `None`; a missing image never fails the search.
    async fn fetch_image(&self, url: &str) -> Option<String> {
        let response = match self.client.get(url).send().await {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                warn!(url, status = %r.status(), "image download rejected");
                return None;
            }
            Err(e) => {
                warn!(url, error = %e, "image download failed");
                return None;
            }
        };
        let bytes = response.bytes().await.ok()?;
        if bytes.is_empty() || bytes.len() > MAX_IMAGE_BYTES {
            debug!(url, size = bytes.len(), "skipping image");
            return None;
        }
        Some(base64::engine::general_purpose::STANDARD.encode(&bytes))
    }

    async fn record(&self, query: &str, response: &str, started: Instant) {
        let Some(store) = &self.store else {
            return;
        };
        let entry = SearchLogEntry {
            query: query.to_string(),
            response: response.to_string(),
            duration_ms: i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX),
        };
        if let Err(e) = store.log_search(&entry).await {
            warn!(error = %e, "failed to record search");
        }
    }
}

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        "Search the web for current information. Use this for news, weather, prices, recent events, or any fact that may have changed."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "What to search for"
                }
            },
            "required": ["query"]
        })
    }

    async fn invoke(&self, arguments: serde_json::Value) -> Result<ToolOutput, PennyError> {
        let query = arguments["query"]
            .as_str()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| Self::error("missing required 'query' parameter"))?;

        let started = Instant::now();
        let response = self.query(query).await?;
        let text = response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Self::error("search response had no choices"))?;
        self.record(query, &text, started).await;

        let image_base64 = match response.images.first() {
            Some(image) if self.include_images => self.fetch_image(image.url()).await,
            _ => None,
        };

        debug!(query, sources = response.citations.len(), "search complete");
        Ok(ToolOutput::Search(SearchResult {
            text,
            urls: response.citations,
            image_base64,
        }))
    }
}
