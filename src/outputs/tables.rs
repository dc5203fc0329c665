//! CSV stores.
//!
//! Every tabular artifact is a headed CSV file whose columns are the serde
//! field names of its row type. Files are always written whole and always
//! carry a header row, even when there are no data rows.

use crate::error::{PipelineError, Result};
use crate::models::{ArticleRecord, CleanedLink, Evaluation, ManifestRow, RawArticleRow};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::{self, OpenOptions};
use std::path::Path;
use tracing::{debug, info, instrument};

/// A row type with a fixed column layout.
pub trait Table: Serialize + DeserializeOwned {
    const HEADERS: &'static [&'static str];
}

impl Table for ManifestRow {
    const HEADERS: &'static [&'static str] = &["homepage"];
}

impl Table for CleanedLink {
    const HEADERS: &'static [&'static str] = &["newspaper", "articles"];
}

impl Table for ArticleRecord {
    const HEADERS: &'static [&'static str] = &["newspaper", "article_url", "article_content"];
}

impl Table for RawArticleRow {
    const HEADERS: &'static [&'static str] = &["newspaper", "article_url", "article_content"];
}

impl Table for Evaluation {
    const HEADERS: &'static [&'static str] = &[
        "newspaper",
        "article_url",
        "article_content",
        "mark_socioeconomic",
        "mark_democracy",
    ];
}

/// Read every row of a headed CSV file.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub fn read_rows<T: Table>(path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| PipelineError::csv(path, e))?;
    let rows = reader
        .deserialize()
        .collect::<std::result::Result<Vec<T>, _>>()
        .map_err(|e| PipelineError::csv(path, e))?;
    debug!(rows = rows.len(), "Read table");
    Ok(rows)
}

/// Write `rows` to `path`, replacing any existing file.
#[instrument(level = "info", skip_all, fields(path = %path.display(), rows = rows.len()))]
pub fn write_rows<T: Table>(path: &Path, rows: &[T]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))?;
    }
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| PipelineError::csv(path, e))?;
    writer
        .write_record(T::HEADERS)
        .map_err(|e| PipelineError::csv(path, e))?;
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| PipelineError::csv(path, e))?;
    }
    writer.flush().map_err(|e| PipelineError::io(path, e))?;
    info!("Wrote table");
    Ok(())
}

/// Homepages listed in the input manifest, in file order.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn read_manifest(path: &Path) -> Result<Vec<String>> {
    let rows: Vec<ManifestRow> = read_rows(path)?;
    let homepages: Vec<String> = rows
        .into_iter()
        .map(|row| row.homepage.trim().to_string())
        .filter(|homepage| !homepage.is_empty())
        .collect();
    info!(count = homepages.len(), "Loaded homepage manifest");
    Ok(homepages)
}

/// Append one failing homepage to the faulty-URL log.
///
/// The log is append-only: repeated failures produce repeated rows.
#[instrument(level = "debug", skip_all, fields(path = %path.display(), %url))]
pub fn append_faulty_url(path: &Path, url: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| PipelineError::io(path, e))?;
    let is_new = file
        .metadata()
        .map_err(|e| PipelineError::io(path, e))?
        .len()
        == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    if is_new {
        writer
            .write_record(["url"])
            .map_err(|e| PipelineError::csv(path, e))?;
    }
    writer
        .write_record([url])
        .map_err(|e| PipelineError::csv(path, e))?;
    writer.flush().map_err(|e| PipelineError::io(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(newspaper: &str, url: &str, content: &str) -> ArticleRecord {
        ArticleRecord {
            newspaper: newspaper.to_string(),
            article_url: url.to_string(),
            article_content: content.to_string(),
        }
    }

    #[test]
    fn test_articles_survive_commas_and_newlines() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("articles/2024-05-01_articles.csv");
        let rows = vec![
            article("https://a.example", "https://a.example/1", "First, line\nsecond \"quoted\" line"),
            article("https://b.example", "https://b.example/2", "Plain"),
        ];
        write_rows(&path, &rows).unwrap();

        let back: Vec<ArticleRecord> = read_rows(&path).unwrap();
        assert_eq!(back, rows);
    }

    #[test]
    fn test_empty_table_still_has_header() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("2024-05-01_gpt-4.csv");
        write_rows::<Evaluation>(&path, &[]).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            raw.trim_end(),
            "newspaper,article_url,article_content,mark_socioeconomic,mark_democracy"
        );
        assert!(read_rows::<Evaluation>(&path).unwrap().is_empty());
    }

    #[test]
    fn test_empty_body_reads_as_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("2024-05-01_articles.csv");
        std::fs::write(
            &path,
            "newspaper,article_url,article_content\nhttps://a.example,https://a.example/1,\nhttps://a.example,https://a.example/2,Body\n",
        )
        .unwrap();

        let rows: Vec<RawArticleRow> = read_rows(&path).unwrap();
        assert_eq!(rows[0].article_content, None);
        assert_eq!(rows[1].article_content.as_deref(), Some("Body"));
    }

    #[test]
    fn test_read_manifest_skips_blank_rows() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("selected_newspapers.csv");
        std::fs::write(&path, "homepage\nhttps://a.example\n \nhttps://b.example \n").unwrap();

        assert_eq!(
            read_manifest(&path).unwrap(),
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
    }

    #[test]
    fn test_faulty_log_appends_without_dedup() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("errors/faulty_urls.csv");
        append_faulty_url(&path, "https://down.example").unwrap();
        append_faulty_url(&path, "https://down.example").unwrap();
        append_faulty_url(&path, "https://other.example").unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = raw.lines().collect();
        assert_eq!(
            lines,
            vec!["url", "https://down.example", "https://down.example", "https://other.example"]
        );
    }
}
