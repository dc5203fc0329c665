//! Error types for the pipeline.
//!
//! Per-item failures ([`PipelineError::Fetch`], [`PipelineError::Extraction`],
//! [`PipelineError::Parse`], [`PipelineError::Model`]) are caught at the item
//! boundary and recorded in a [`crate::models::BatchReport`]. Everything else
//! aborts the current stage.

use std::path::PathBuf;

/// Top-level error type for all pipeline operations.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A homepage could not be fetched (network failure or non-2xx status).
    #[error("fetch error for {url}: {message}")]
    Fetch { url: String, message: String },

    /// An article URL resolved but no body text could be extracted.
    #[error("extraction error for {url}: {message}")]
    Extraction { url: String, message: String },

    /// A model reply did not have the expected `[int, int]` shape.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// The model backend reported a failure.
    #[error("model error from {model}: {message}")]
    Model { model: String, message: String },

    /// Invalid or missing configuration (unknown model, missing API key, ...).
    #[error("config error: {message}")]
    Config { message: String },

    /// Two input files map to the same processing unit.
    #[error("processing unit {unit} appears in both {first:?} and {second:?}")]
    DuplicateUnit {
        unit: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Tabular store read/write error.
    #[error("CSV error at {path:?}: {source}")]
    Csv { path: PathBuf, source: csv::Error },

    /// Link-set document read/write error.
    #[error("JSON error at {path:?}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PipelineError>;

impl PipelineError {
    pub fn fetch(url: impl Into<String>, msg: impl ToString) -> Self {
        Self::Fetch {
            url: url.into(),
            message: msg.to_string(),
        }
    }

    pub fn extraction(url: impl Into<String>, msg: impl ToString) -> Self {
        Self::Extraction {
            url: url.into(),
            message: msg.to_string(),
        }
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    pub fn model(model: impl Into<String>, msg: impl ToString) -> Self {
        Self::Model {
            model: model.into(),
            message: msg.to_string(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }

    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }
}
