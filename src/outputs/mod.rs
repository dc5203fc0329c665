//! Persistence for every pipeline stage.
//!
//! All artifacts are flat files named `{date}_{suffix}.{ext}`:
//!
//! ```text
//! input/
//! └── selected_newspapers.csv            # manifest, column `homepage`
//!
//! output/
//! ├── urls/2024-05-01_urls.json           # link-set document
//! ├── cleaned_urls/2024-05-01_cleanedUrls.csv
//! ├── articles/2024-05-01_articles.csv
//! ├── cleaned_articles/2024-05-01_cleanedArticles.csv
//! ├── selected_articles/                  # hand-curated evaluation input
//! ├── evaluations/2024-05-01_gpt-4.csv
//! └── errors/faulty_urls.csv              # append-only
//! ```
//!
//! # Submodules
//!
//! - [`json`]: read-modify-write link-set documents
//! - [`tables`]: CSV stores, the input manifest and the faulty-URL log

pub mod json;
pub mod tables;
