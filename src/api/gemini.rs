//! Gemini `generateContent` backend.
//!
//! This backend is rate limited on the provider side, so every call sleeps a
//! fixed delay first. A 5xx reply becomes a [`PipelineError::Model`] without
//! retrying, and a reply that is not a list of integers becomes a
//! [`PipelineError::Parse`] instead of being returned.

use super::LanguageModel;
use crate::config::GEMINI_API_URL;
use crate::error::{PipelineError, Result};
use crate::utils::truncate_for_log;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, instrument, warn};

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// Gemini `generateContent` backend with a fixed pre-call delay and reply
/// validation.
pub struct GeminiModel {
    http: Client,
    model: String,
    api_key: String,
    base_url: String,
    delay: Duration,
}

impl GeminiModel {
    /// Create a backend against the public Gemini endpoint with a 3 s delay.
    ///
    /// # Arguments
    ///
    /// * `http` - shared client carrying the configured timeout
    /// * `model` - provider model identifier, e.g. `gemini-pro`
    /// * `api_key` - sent as the `x-goog-api-key` header
    pub fn new(http: Client, model: &str, api_key: &str) -> Self {
        Self {
            http,
            model: model.to_string(),
            api_key: api_key.to_string(),
            base_url: GEMINI_API_URL.to_string(),
            delay: Duration::from_secs(3),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Sleep `delay` before every call instead of the default.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl fmt::Debug for GeminiModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiModel")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("delay", &self.delay)
            .finish()
    }
}

/// True when `output` is a list of integers such as `[3, -7]`.
pub fn is_well_formed(output: &str) -> bool {
    serde_json::from_str::<Vec<i64>>(output.trim()).is_ok()
}

impl LanguageModel for GeminiModel {
    fn name(&self) -> &str {
        &self.model
    }

    #[instrument(level = "info", skip_all, fields(model = %self.model))]
    async fn query(&self, prompt: &str) -> Result<String> {
        sleep(self.delay).await;

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| PipelineError::model(&self.model, e))?;

        let status = response.status();
        if status.is_server_error() {
            warn!(%status, "Gemini internal server error");
            return Err(PipelineError::model(
                &self.model,
                format!("internal server error ({status}) while querying the model"),
            ));
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(PipelineError::model(
                &self.model,
                format!("Gemini API error ({status}): {error_text}"),
            ));
        }

        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::model(&self.model, e))?;
        let output: String = generated
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect::<String>())
            .ok_or_else(|| PipelineError::model(&self.model, "no candidates in Gemini reply"))?;

        if !is_well_formed(&output) {
            debug!(reply = %truncate_for_log(&output, 200), "Rejected malformed reply");
            return Err(PipelineError::parse(
                "the output from the model is not well-formed",
            ));
        }
        Ok(output)
    }
}
