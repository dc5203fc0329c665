//! Command-line interface definitions.
//!
//! One subcommand per pipeline action. Global options can also come from
//! environment variables.

use crate::config::{ArticleSource, PipelineConfig};
use crate::error::Result;
use crate::utils;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments.
///
/// # Examples
///
/// ```sh
/// # Harvest today's links and rank them
/// news_lean harvest-links
///
/// # Clean with custom length bounds
/// news_lean clean-articles 800 4000
///
/// # Score hand-picked articles with Gemini 1.5
/// GEMINI_API_KEY=... news_lean evaluate gemini1.5 selected
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML configuration file
    #[arg(short, long, global = true, env = "NEWS_LEAN_CONFIG")]
    pub config: Option<PathBuf>,

    /// OpenAI API key (overrides the config file)
    #[arg(long, global = true, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Gemini API key (overrides the config file)
    #[arg(long, global = true, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    #[command(subcommand)]
    pub action: Action,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Action {
    /// Harvest links from every manifest homepage, then rank pending link sets
    HarvestLinks {
        /// Processing date to file the links under, YYYY-MM-DD (defaults to today)
        #[arg(long, value_parser = utils::parse_date)]
        date: Option<String>,
    },
    /// Rank pending link sets without harvesting
    RankLinks,
    /// Extract article text for pending cleaned-link tables
    ExtractArticles,
    /// Filter pending article tables by body length and newspaper volume
    CleanArticles {
        /// Minimum body length in characters
        #[arg(requires = "max")]
        min: Option<usize>,
        /// Maximum body length in characters
        max: Option<usize>,
    },
    /// Score pending article tables with a language model
    Evaluate {
        /// One of: gpt3, gpt4, gemini, gemini1.5
        model: String,
        /// Which article tables to score
        #[arg(value_enum)]
        source: Option<ArticleSource>,
    },
}

impl Cli {
    /// Load the configuration file (or defaults) and apply CLI overrides.
    pub fn pipeline_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::load(path)?,
            None => PipelineConfig::default(),
        };
        if let Some(key) = &self.openai_api_key {
            config.openai_api_key = Some(key.clone());
        }
        if let Some(key) = &self.gemini_api_key {
            config.gemini_api_key = Some(key.clone());
        }
        if let Action::Evaluate {
            source: Some(source),
            ..
        } = &self.action
        {
            config.article_source = *source;
        }
        config.validate()?;
        Ok(config)
    }
}
