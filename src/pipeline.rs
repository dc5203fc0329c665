//! Stage orchestration.
//!
//! Each public method of [`Pipeline`] is one command-line action. A stage
//! asks [`selector`] which units are still missing downstream, processes them
//! one at a time and writes one output file per unit. Per-item failures are
//! logged and recorded; store failures abort the stage.
//!
//! ```text
//! manifest ──harvest_links──▶ urls/ ──rank_links──▶ cleaned_urls/
//!   ──extract_articles──▶ articles/ ──clean_articles──▶ cleaned_articles/
//!   ──evaluate──▶ evaluations/
//! ```

use crate::aggregate::{self, RankLimits};
use crate::api::LanguageModel;
use crate::cleaner::{self, CleanLimits};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::models::{
    ArticleRecord, BatchReport, CleanedLink, ProcessingUnit, RawArticleRow,
};
use crate::outputs::{json, tables};
use crate::scoring::ScoringEngine;
use crate::scrapers::{articles, links};
use crate::selector;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

/// What a stage did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StageSummary {
    /// Units (days) written.
    pub units: usize,
    /// Items that made it into an output file.
    pub succeeded: usize,
    /// Items skipped after a per-item failure.
    pub skipped: usize,
}

impl StageSummary {
    fn add<T>(&mut self, report: &BatchReport<T>) {
        self.succeeded += report.succeeded.len();
        self.skipped += report.skipped.len();
        for skipped in &report.skipped {
            debug!(key = %skipped.key, error = %skipped.error, "Skipped item");
        }
    }
}

/// Runs the pipeline actions against one configuration.
///
/// Holds the shared HTTP client so every stage reuses its connection pool and
/// timeout settings.
pub struct Pipeline {
    config: PipelineConfig,
    client: Client,
}

impl Pipeline {
    /// Build a pipeline and its HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`](crate::error::PipelineError::Config)
    /// when the client cannot be built from `config`.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let client = config.http_client()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Harvest every manifest homepage into the link-set document for `date`.
    ///
    /// Unreachable homepages are appended to the faulty-URL log and skipped.
    ///
    /// # Arguments
    ///
    /// * `date` - processing date in `YYYY-MM-DD` form, used as the unit key
    ///
    /// # Returns
    ///
    /// A [`StageSummary`] counting harvested and skipped homepages. Manifest
    /// and document I/O failures abort the stage.
    #[instrument(level = "info", skip(self))]
    pub async fn harvest_links(&self, date: &str) -> Result<StageSummary> {
        let t0 = Instant::now();
        let homepages = tables::read_manifest(&self.config.manifest_path())?;
        let unit = ProcessingUnit::new(date);
        let document_path = self.config.urls_path().join(unit.filename("urls", "json"));
        let faulty_path = self.config.faulty_urls_path();

        let mut report: BatchReport<String> = BatchReport::default();
        for homepage in homepages {
            match links::harvest(&self.client, &homepage, self.config.max_links_per_homepage).await {
                Ok(found) => {
                    json::merge_link_set(&document_path, &homepage, found).await?;
                    report.push_ok(homepage);
                }
                Err(e) => {
                    warn!(%homepage, error = %e, "Error processing homepage; logging as faulty");
                    tables::append_faulty_url(&faulty_path, &homepage)?;
                    report.push_skip(homepage, e);
                }
            }
        }

        let mut summary = StageSummary {
            units: 1,
            ..StageSummary::default()
        };
        summary.add(&report);
        log_summary("harvest_links", &summary, t0);
        Ok(summary)
    }

    /// Turn every pending link-set document into a cleaned-link table.
    #[instrument(level = "info", skip(self))]
    pub async fn rank_links(&self) -> Result<StageSummary> {
        let t0 = Instant::now();
        let output_dir = self.config.cleaned_urls_path();
        let limits = RankLimits {
            min_links: self.config.min_links_per_newspaper,
            top: self.config.top_links_per_newspaper,
        };

        let mut summary = StageSummary::default();
        for (unit, input) in selector::pending(&self.config.urls_path(), &output_dir)? {
            let document = json::read_link_sets(&input).await?;
            let rows = aggregate::filter_and_rank(&document, limits);
            tables::write_rows(&output_dir.join(unit.filename("cleanedUrls", "csv")), &rows)?;
            info!(%unit, rows = rows.len(), "Ranked unit");
            summary.units += 1;
            summary.succeeded += rows.len();
        }
        log_summary("rank_links", &summary, t0);
        Ok(summary)
    }

    /// Extract article bodies for every pending cleaned-link table.
    ///
    /// Each unit's file holds that unit's articles only, unless
    /// `accumulate_articles_across_units` is set, in which case every file
    /// holds everything extracted so far in this run.
    #[instrument(level = "info", skip(self))]
    pub async fn extract_articles(&self) -> Result<StageSummary> {
        let t0 = Instant::now();
        let output_dir = self.config.articles_path();
        let mut accumulated: Vec<ArticleRecord> = Vec::new();

        let mut summary = StageSummary::default();
        for (unit, input) in selector::pending(&self.config.cleaned_urls_path(), &output_dir)? {
            let rows: Vec<CleanedLink> = tables::read_rows(&input)?;
            info!(%unit, links = rows.len(), "Extracting articles");

            let report = self.extract_links(rows).await;
            summary.add(&report);

            let records = if self.config.accumulate_articles_across_units {
                accumulated.extend(report.succeeded);
                accumulated.clone()
            } else {
                report.succeeded
            };
            tables::write_rows(&output_dir.join(unit.filename("articles", "csv")), &records)?;
            summary.units += 1;
        }
        log_summary("extract_articles", &summary, t0);
        Ok(summary)
    }

    async fn extract_links(&self, rows: Vec<CleanedLink>) -> BatchReport<ArticleRecord> {
        let results: Vec<(String, Result<ArticleRecord>)> = stream::iter(rows)
            .then(|row| async move {
                let result = articles::extract(&self.client, &row.articles)
                    .await
                    .map(|content| ArticleRecord {
                        newspaper: row.newspaper.clone(),
                        article_url: row.articles.clone(),
                        article_content: content,
                    });
                if let Err(e) = &result {
                    error!(url = %row.articles, error = %e, "Article extraction failed; skipping");
                }
                (row.articles, result)
            })
            .collect()
            .await;

        let mut report = BatchReport::default();
        for (url, result) in results {
            report.record(url, result);
        }
        report
    }

    /// Length/volume-filter every pending article table.
    ///
    /// # Arguments
    ///
    /// * `limits` - inclusive body length bounds and minimum newspaper volume
    ///
    /// # Returns
    ///
    /// A [`StageSummary`] where `skipped` counts rows dropped by the filter.
    #[instrument(level = "info", skip(self))]
    pub fn clean_articles(&self, limits: CleanLimits) -> Result<StageSummary> {
        let t0 = Instant::now();
        let output_dir = self.config.cleaned_articles_path();

        let mut summary = StageSummary::default();
        for (unit, input) in selector::pending(&self.config.articles_path(), &output_dir)? {
            let rows: Vec<RawArticleRow> = tables::read_rows(&input)?;
            let total = rows.len();
            let cleaned = cleaner::clean(rows, limits);
            tables::write_rows(&output_dir.join(unit.filename("cleanedArticles", "csv")), &cleaned)?;
            info!(%unit, kept = cleaned.len(), dropped = total - cleaned.len(), "Cleaned unit");
            summary.units += 1;
            summary.succeeded += cleaned.len();
            summary.skipped += total - cleaned.len();
        }
        log_summary("clean_articles", &summary, t0);
        Ok(summary)
    }

    /// Score every pending article table with `model`.
    ///
    /// Output files are tagged with the model name, so each model keeps its
    /// own notion of which days are done.
    ///
    /// # Arguments
    ///
    /// * `model` - backend used for every article of the run
    ///
    /// # Returns
    ///
    /// A [`StageSummary`] with one unit per evaluation file written. Rows
    /// without a body and failed scorings are counted as skipped.
    #[instrument(level = "info", skip_all, fields(model = %model.name()))]
    pub async fn evaluate<M: LanguageModel>(&self, model: &M) -> Result<StageSummary> {
        let t0 = Instant::now();
        let input_dir = self.config.evaluation_input_path();
        let output_dir = self.config.evaluations_path();
        let engine = ScoringEngine::new(model, self.config.max_evaluations_per_newspaper);

        let mut summary = StageSummary::default();
        for (unit, input) in selector::pending_tagged(&input_dir, &output_dir, model.name())? {
            let rows: Vec<RawArticleRow> = tables::read_rows(&input)?;
            let mut articles = Vec::with_capacity(rows.len());
            for row in rows {
                match row.article_content {
                    Some(content) if !content.is_empty() => articles.push(ArticleRecord {
                        newspaper: row.newspaper,
                        article_url: row.article_url,
                        article_content: content,
                    }),
                    _ => {
                        warn!(url = %row.article_url, "Article has no body; skipping");
                        summary.skipped += 1;
                    }
                }
            }

            let report = engine.score_unit(&articles).await;
            summary.add(&report);
            tables::write_rows(
                &output_dir.join(unit.filename(model.name(), "csv")),
                &report.succeeded,
            )?;
            info!(%unit, evaluations = report.succeeded.len(), "Evaluated unit");
            summary.units += 1;
        }
        log_summary("evaluate", &summary, t0);
        Ok(summary)
    }
}

fn log_summary(stage: &str, summary: &StageSummary, t0: Instant) {
    let elapsed = t0.elapsed();
    info!(
        stage,
        units = summary.units,
        succeeded = summary.succeeded,
        skipped = summary.skipped,
        elapsed_ms = elapsed.as_millis() as u64,
        "Stage complete"
    );
}
