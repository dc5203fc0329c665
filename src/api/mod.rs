//! Language-model backends.
//!
//! The scoring engine only needs two capabilities from a provider, captured
//! by [`LanguageModel`]: a name (used to tag output files) and a single
//! prompt → reply round trip.
//!
//! # Variants
//!
//! | Variant | Type | Pre-call delay | Reply validation |
//! |---------|------|----------------|------------------|
//! | OpenAI chat completions | [`OpenAiModel`] | none | none |
//! | Gemini `generateContent` | [`GeminiModel`] | fixed (3 s default) | must be a list of integers |
//!
//! Neither variant retries. The provider is picked once, from the model name
//! given on the command line, and wrapped in a [`Backend`].

mod gemini;
mod openai;

pub use gemini::GeminiModel;
pub use openai::OpenAiModel;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use reqwest::Client;
use tracing::info;

/// A prompt → reply language model.
pub trait LanguageModel {
    /// Provider model identifier, e.g. `gpt-4`.
    fn name(&self) -> &str;

    /// Send `prompt` and return the raw reply text.
    async fn query(&self, prompt: &str) -> Result<String>;
}

/// Model names accepted on the command line.
pub const MODEL_NAMES: &[&str] = &["gpt3", "gpt4", "gemini", "gemini1.5"];

/// The backend selected for a run.
#[derive(Debug)]
pub enum Backend {
    OpenAi(OpenAiModel),
    Gemini(GeminiModel),
}

impl Backend {
    /// Build the backend for a command-line model name.
    ///
    /// Unknown names and missing API keys are configuration errors.
    pub fn from_name(name: &str, config: &PipelineConfig, client: Client) -> Result<Self> {
        let backend = match name {
            "gpt3" | "gpt4" => {
                let model = if name == "gpt3" { "gpt-3.5-turbo" } else { "gpt-4" };
                let key = require_key(config.openai_api_key.as_deref(), "OPENAI_API_KEY")?;
                Self::OpenAi(OpenAiModel::new(client, model, key).with_base_url(&config.openai_base_url))
            }
            "gemini" | "gemini1.5" => {
                let model = if name == "gemini" {
                    "gemini-pro"
                } else {
                    "gemini-1.5-flash-latest"
                };
                let key = require_key(config.gemini_api_key.as_deref(), "GEMINI_API_KEY")?;
                Self::Gemini(
                    GeminiModel::new(client, model, key)
                        .with_base_url(&config.gemini_base_url)
                        .with_delay(config.model_delay()),
                )
            }
            other => {
                return Err(PipelineError::config(format!(
                    "unknown model '{other}', expected one of: {}",
                    MODEL_NAMES.join(", ")
                )));
            }
        };
        info!(requested = name, model = backend.name(), "Selected model backend");
        Ok(backend)
    }
}

impl LanguageModel for Backend {
    fn name(&self) -> &str {
        match self {
            Self::OpenAi(model) => model.name(),
            Self::Gemini(model) => model.name(),
        }
    }

    async fn query(&self, prompt: &str) -> Result<String> {
        match self {
            Self::OpenAi(model) => model.query(prompt).await,
            Self::Gemini(model) => model.query(prompt).await,
        }
    }
}

fn require_key<'a>(key: Option<&'a str>, env: &str) -> Result<&'a str> {
    key.filter(|k| !k.is_empty())
        .ok_or_else(|| PipelineError::config(format!("missing API key: set {env} or add it to the config file")))
}
