//! OpenAI chat-completions backend.
//!
//! One request per prompt; every failure (transport, non-2xx, empty reply) is
//! surfaced as an opaque [`PipelineError::Model`].

use super::LanguageModel;
use crate::config::OPENAI_API_URL;
use crate::error::{PipelineError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use tracing::{debug, instrument, warn};

const SYSTEM_PROMPT: &str = "You are an expert of politics and journalism.";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// OpenAI chat-completions backend.
///
/// Sends one system message and the prompt as a user message, and returns
/// the first choice verbatim. Any failure is a [`PipelineError::Model`].
pub struct OpenAiModel {
    http: Client,
    model: String,
    api_key: String,
    base_url: String,
}

impl OpenAiModel {
    /// Create a backend against the public OpenAI endpoint.
    ///
    /// # Arguments
    ///
    /// * `http` - shared client carrying the configured timeout
    /// * `model` - provider model identifier, e.g. `gpt-4`
    /// * `api_key` - bearer token
    pub fn new(http: Client, model: &str, api_key: &str) -> Self {
        Self {
            http,
            model: model.to_string(),
            api_key: api_key.to_string(),
            base_url: OPENAI_API_URL.to_string(),
        }
    }

    /// Point the backend at another API root (proxies, tests).
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }
}

impl fmt::Debug for OpenAiModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiModel")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl LanguageModel for OpenAiModel {
    fn name(&self) -> &str {
        &self.model
    }

    #[instrument(level = "info", skip_all, fields(model = %self.model))]
    async fn query(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                WireMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                WireMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        let t0 = Instant::now();
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| PipelineError::model(&self.model, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            warn!(%status, elapsed_ms = t0.elapsed().as_millis() as u64, "OpenAI API call failed");
            return Err(PipelineError::model(
                &self.model,
                format!("OpenAI API error ({status}): {error_text}"),
            ));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::model(&self.model, e))?;
        debug!(elapsed_ms = t0.elapsed().as_millis() as u64, "OpenAI reply received");

        chat.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| PipelineError::model(&self.model, "no response from OpenAI"))
    }
}
