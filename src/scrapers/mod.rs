//! Fetching and parsing of newspaper pages.
//!
//! Both scrapers are a single static HTML pass with `scraper`; there is no
//! JavaScript execution and no pagination.
//!
//! | Module | Input | Output | Failure |
//! |--------|-------|--------|---------|
//! | [`links`] | homepage URL | up to 200 absolute article URLs | `PipelineError::Fetch` |
//! | [`articles`] | article URL | body text | `PipelineError::Extraction` |
//!
//! Callers decide what a failure means: the stages in [`crate::pipeline`] log
//! it, record it and move on to the next item.

pub mod articles;
pub mod links;
