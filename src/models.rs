//! Data models shared by every pipeline stage.
//!
//! This module defines the records that flow between stages:
//! - [`ProcessingUnit`]: the date token joining one stage's output to the next
//! - [`LinkSetDocument`]: the per-day homepage → URL list document
//! - [`CleanedLink`], [`ArticleRecord`], [`Evaluation`]: the tabular rows
//! - [`BatchReport`]: per-item outcome aggregation for skip-and-continue loops
//!
//! Row field names match the CSV column headers of the stores, which is why
//! they use `newspaper` rather than `homepage`.

use crate::error::PipelineError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Per-day identifier embedded in every artifact filename (`YYYY-MM-DD`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProcessingUnit(String);

impl ProcessingUnit {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derive the unit from a filename: stem up to the first `_`.
    ///
    /// `2024-05-01_urls.json` → `2024-05-01`.
    pub fn from_filename(filename: &str) -> Self {
        let stem = match filename.rsplit_once('.') {
            Some((stem, _ext)) if !stem.is_empty() => stem,
            _ => filename,
        };
        let id = stem.split('_').next().unwrap_or(stem);
        Self(id.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Build `{unit}_{suffix}.{extension}`.
    pub fn filename(&self, suffix: &str, extension: &str) -> String {
        format!("{}_{}.{}", self.as_str(), suffix, extension)
    }
}

impl fmt::Display for ProcessingUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One day's harvested links, keyed by homepage.
///
/// A `BTreeMap` keeps the serialized document stable across runs.
pub type LinkSetDocument = BTreeMap<String, Vec<String>>;

/// A row of the input manifest.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ManifestRow {
    pub homepage: String,
}

/// A candidate link together with its ranking key.
///
/// `length` is the character length of the URL string, used as a cheap proxy
/// for how "article-like" a link is. It never reaches the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedLink {
    pub homepage: String,
    pub url: String,
    pub length: usize,
}

impl RankedLink {
    pub fn new(homepage: &str, url: &str) -> Self {
        Self {
            homepage: homepage.to_string(),
            url: url.to_string(),
            length: url.chars().count(),
        }
    }
}

/// A row of the cleaned-link store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CleanedLink {
    pub newspaper: String,
    pub articles: String,
}

impl From<RankedLink> for CleanedLink {
    fn from(link: RankedLink) -> Self {
        Self {
            newspaper: link.homepage,
            articles: link.url,
        }
    }
}

/// An extracted article, as written to the article stores.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ArticleRecord {
    pub newspaper: String,
    pub article_url: String,
    pub article_content: String,
}

/// An article row as read back from disk.
///
/// The body is optional: an empty cell means the body is not textual content.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RawArticleRow {
    pub newspaper: String,
    pub article_url: String,
    pub article_content: Option<String>,
}

/// A scored article.
///
/// Marks are trusted as returned by the model; nothing clamps them to
/// `-10..=10`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Evaluation {
    pub newspaper: String,
    pub article_url: String,
    pub article_content: String,
    pub mark_socioeconomic: i64,
    pub mark_democracy: i64,
}

impl Evaluation {
    pub fn new(article: &ArticleRecord, marks: (i64, i64)) -> Self {
        Self {
            newspaper: article.newspaper.clone(),
            article_url: article.article_url.clone(),
            article_content: article.article_content.clone(),
            mark_socioeconomic: marks.0,
            mark_democracy: marks.1,
        }
    }
}

/// An item that was skipped, and why.
#[derive(Debug)]
pub struct Skipped {
    pub key: String,
    pub error: PipelineError,
}

/// Outcome of a per-item loop: what succeeded and what was skipped.
#[derive(Debug)]
pub struct BatchReport<T> {
    pub succeeded: Vec<T>,
    pub skipped: Vec<Skipped>,
}

impl<T> Default for BatchReport<T> {
    fn default() -> Self {
        Self {
            succeeded: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

impl<T> BatchReport<T> {
    pub fn push_ok(&mut self, item: T) {
        self.succeeded.push(item);
    }

    pub fn push_skip(&mut self, key: impl Into<String>, error: PipelineError) {
        self.skipped.push(Skipped {
            key: key.into(),
            error,
        });
    }

    /// Record a per-item result under `key`.
    pub fn record(&mut self, key: impl Into<String>, result: Result<T, PipelineError>) {
        match result {
            Ok(item) => self.push_ok(item),
            Err(error) => self.push_skip(key, error),
        }
    }

    pub fn extend(&mut self, other: BatchReport<T>) {
        self.succeeded.extend(other.succeeded);
        self.skipped.extend(other.skipped);
    }
}
