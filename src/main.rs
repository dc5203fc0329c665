//! # News Lean
//!
//! A batch pipeline that crawls newspaper homepages for article links,
//! extracts the articles, cleans the corpus and scores each article's
//! political leaning with a large language model.
//!
//! ## Usage
//!
//! ```sh
//! news_lean harvest-links
//! news_lean extract-articles
//! news_lean clean-articles [MIN MAX]
//! news_lean evaluate <gpt3|gpt4|gemini|gemini1.5> [cleaned|selected]
//! ```
//!
//! ## Architecture
//!
//! Every stage persists one flat file per processing date and only works on
//! dates that are missing from its output directory, so re-running an action
//! is cheap and never redoes finished days:
//! 1. **Harvesting**: collect up to 200 links per homepage into a daily link set
//! 2. **Ranking**: keep the 20 longest links of each well-stocked homepage
//! 3. **Extraction**: download article bodies, skipping failing links
//! 4. **Cleaning**: keep articles of reasonable length from well-stocked newspapers
//! 5. **Evaluation**: score up to 5 articles per newspaper with the chosen model

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod aggregate;
mod api;
mod cleaner;
mod cli;
mod config;
mod error;
mod models;
mod outputs;
mod pipeline;
mod scoring;
mod scrapers;
mod selector;
mod utils;

use api::Backend;
use cleaner::CleanLimits;
use cli::{Action, Cli};
use error::PipelineError;
use pipeline::Pipeline;
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("news_lean starting up");

    let args = Cli::parse();
    debug!(action = ?args.action, config = ?args.config, "Parsed CLI arguments");

    let config = match args.pipeline_config() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };

    // Early check: ensure the output root is writable
    if let Err(e) = ensure_writable_dir(&config.output_root).await {
        error!(
            path = %config.output_root.display(),
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e.into());
    }

    let pipeline = Pipeline::new(config)?;

    match args.action {
        Action::HarvestLinks { date } => {
            let date = date.unwrap_or_else(utils::today);
            pipeline.harvest_links(&date).await?;
            pipeline.rank_links().await?;
        }
        Action::RankLinks => {
            pipeline.rank_links().await?;
        }
        Action::ExtractArticles => {
            pipeline.extract_articles().await?;
        }
        Action::CleanArticles { min, max } => {
            let config = pipeline.config();
            let limits = CleanLimits {
                min_length: min.unwrap_or(config.min_article_length),
                max_length: max.unwrap_or(config.max_article_length),
                min_group_size: config.min_articles_per_newspaper,
            };
            if limits.min_length > limits.max_length {
                let e = PipelineError::config(format!(
                    "minimum length {} exceeds maximum length {}",
                    limits.min_length, limits.max_length
                ));
                error!(error = %e, "Invalid clean-articles bounds");
                return Err(e.into());
            }
            pipeline.clean_articles(limits)?;
        }
        Action::Evaluate { model, .. } => {
            let backend = Backend::from_name(&model, pipeline.config(), pipeline.client().clone())?;
            pipeline.evaluate(&backend).await?;
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}
