//! Pipeline configuration.
//!
//! All directories, thresholds and provider settings live in one
//! [`PipelineConfig`] that is handed to each stage. Every field has a default,
//! so a YAML file only needs to name what it overrides:
//!
//! ```yaml
//! output_root: /data/news
//! min_article_length: 800
//! model_delay_ms: 5000
//! ```

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, instrument};

pub const OPENAI_API_URL: &str = "https://api.openai.com/v1";
pub const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Where the evaluation stage reads its articles from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ArticleSource {
    /// Output of `clean-articles`.
    #[default]
    Cleaned,
    /// Hand-curated files in the selected-articles directory.
    Selected,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub input_dir: PathBuf,
    pub manifest_file: String,
    pub output_root: PathBuf,

    pub urls_dir: String,
    pub cleaned_urls_dir: String,
    pub articles_dir: String,
    pub cleaned_articles_dir: String,
    pub selected_articles_dir: String,
    pub evaluations_dir: String,
    pub errors_dir: String,
    pub faulty_urls_file: String,

    /// Upper bound on links kept from one homepage fetch.
    pub max_links_per_homepage: usize,
    /// Homepages with fewer harvested links than this are dropped when ranking.
    pub min_links_per_newspaper: usize,
    /// Links kept per homepage after ranking.
    pub top_links_per_newspaper: usize,

    pub min_article_length: usize,
    pub max_article_length: usize,
    pub min_articles_per_newspaper: usize,
    /// Keep growing the extracted-article list across units within one run.
    pub accumulate_articles_across_units: bool,

    /// Successful evaluations per newspaper per run.
    pub max_evaluations_per_newspaper: usize,
    pub article_source: ArticleSource,

    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,
    /// Fixed pause before every call to a rate-limited backend.
    pub model_delay_ms: u64,
    pub request_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("input"),
            manifest_file: "selected_newspapers.csv".to_string(),
            output_root: PathBuf::from("output"),
            urls_dir: "urls".to_string(),
            cleaned_urls_dir: "cleaned_urls".to_string(),
            articles_dir: "articles".to_string(),
            cleaned_articles_dir: "cleaned_articles".to_string(),
            selected_articles_dir: "selected_articles".to_string(),
            evaluations_dir: "evaluations".to_string(),
            errors_dir: "errors".to_string(),
            faulty_urls_file: "faulty_urls.csv".to_string(),
            max_links_per_homepage: 200,
            min_links_per_newspaper: 30,
            top_links_per_newspaper: 20,
            min_article_length: 1000,
            max_article_length: 5000,
            min_articles_per_newspaper: 5,
            accumulate_articles_across_units: false,
            max_evaluations_per_newspaper: 5,
            article_source: ArticleSource::Cleaned,
            openai_api_key: None,
            openai_base_url: OPENAI_API_URL.to_string(),
            gemini_api_key: None,
            gemini_base_url: GEMINI_API_URL.to_string(),
            model_delay_ms: 3000,
            request_timeout_secs: 30,
        }
    }
}

impl PipelineConfig {
    /// Load from a YAML file, falling back to defaults for missing keys.
    #[instrument(level = "info")]
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
        let config: Self = serde_yaml::from_str(&raw)
            .map_err(|e| PipelineError::config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        info!(path = %path.display(), "Loaded pipeline configuration");
        Ok(config)
    }

    /// Reject threshold combinations that can never produce output.
    pub fn validate(&self) -> Result<()> {
        if self.min_article_length > self.max_article_length {
            return Err(PipelineError::config(format!(
                "min_article_length ({}) exceeds max_article_length ({})",
                self.min_article_length, self.max_article_length
            )));
        }
        if self.max_links_per_homepage == 0 || self.top_links_per_newspaper == 0 {
            return Err(PipelineError::config(
                "link limits must be greater than zero",
            ));
        }
        Ok(())
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.input_dir.join(&self.manifest_file)
    }

    pub fn urls_path(&self) -> PathBuf {
        self.output_root.join(&self.urls_dir)
    }

    pub fn cleaned_urls_path(&self) -> PathBuf {
        self.output_root.join(&self.cleaned_urls_dir)
    }

    pub fn articles_path(&self) -> PathBuf {
        self.output_root.join(&self.articles_dir)
    }

    pub fn cleaned_articles_path(&self) -> PathBuf {
        self.output_root.join(&self.cleaned_articles_dir)
    }

    pub fn selected_articles_path(&self) -> PathBuf {
        self.output_root.join(&self.selected_articles_dir)
    }

    pub fn evaluations_path(&self) -> PathBuf {
        self.output_root.join(&self.evaluations_dir)
    }

    pub fn faulty_urls_path(&self) -> PathBuf {
        self.output_root
            .join(&self.errors_dir)
            .join(&self.faulty_urls_file)
    }

    /// Input directory of the evaluation stage.
    pub fn evaluation_input_path(&self) -> PathBuf {
        match self.article_source {
            ArticleSource::Cleaned => self.cleaned_articles_path(),
            ArticleSource::Selected => self.selected_articles_path(),
        }
    }

    pub fn model_delay(&self) -> Duration {
        Duration::from_millis(self.model_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Shared HTTP client for homepage, article and model requests.
    pub fn http_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .user_agent(concat!("news_lean/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(self.request_timeout())
            .build()
            .map_err(|e| PipelineError::config(format!("failed to build HTTP client: {e}")))
    }
}
