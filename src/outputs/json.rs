//! Link-set documents.
//!
//! One JSON document per day maps each homepage to its harvested URLs:
//!
//! ```text
//! output/urls/2024-05-01_urls.json
//! {
//!   "https://news.example": ["https://news.example/politics/a", ...]
//! }
//! ```
//!
//! Updates are read-modify-write on the whole document. The pipeline runs one
//! harvest at a time, so there is a single writer per document.

use crate::aggregate;
use crate::error::{PipelineError, Result};
use crate::models::LinkSetDocument;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument};

/// Read a day's document. A missing file is an empty document.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub async fn read_link_sets(path: &Path) -> Result<LinkSetDocument> {
    let raw = match fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No link-set document yet");
            return Ok(LinkSetDocument::new());
        }
        Err(e) => return Err(PipelineError::io(path, e)),
    };
    serde_json::from_str(&raw).map_err(|e| PipelineError::json(path, e))
}

/// Write the whole document, replacing the previous file in one rename.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub async fn write_link_sets(path: &Path, document: &LinkSetDocument) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| PipelineError::io(parent, e))?;
    }
    let json = serde_json::to_string_pretty(document).map_err(|e| PipelineError::json(path, e))?;

    let tmp_path = temp_path(path);
    fs::write(&tmp_path, json)
        .await
        .map_err(|e| PipelineError::io(&tmp_path, e))?;
    fs::rename(&tmp_path, path)
        .await
        .map_err(|e| PipelineError::io(path, e))?;
    Ok(())
}

/// Dotted sibling used for the atomic write. Directory scans skip dotfiles,
/// so a temp file left behind by a crash never looks like a unit.
fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.tmp"))
}

/// Merge freshly harvested links for `homepage` into the day's document.
///
/// Returns the number of URLs stored for the homepage afterwards.
#[instrument(level = "info", skip_all, fields(path = %path.display(), %homepage, new = links.len()))]
pub async fn merge_link_set(path: &Path, homepage: &str, links: Vec<String>) -> Result<usize> {
    let mut document = read_link_sets(path).await?;
    let existing = document.remove(homepage);
    let merged = aggregate::merge(existing, links);
    let total = merged.len();
    document.insert(homepage.to_string(), merged);
    write_link_sets(path, &document).await?;
    info!(total, "Stored link set");
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_document_reads_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let doc = read_link_sets(&tmp.path().join("2024-05-01_urls.json")).await.unwrap();
        assert!(doc.is_empty());
    }

    #[tokio::test]
    async fn test_merge_link_set_unions_across_runs() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("urls/2024-05-01_urls.json");

        let first = vec!["https://a.example/1".to_string(), "https://a.example/2".to_string()];
        assert_eq!(merge_link_set(&path, "https://a.example", first).await.unwrap(), 2);

        let second = vec!["https://a.example/2".to_string(), "https://a.example/3".to_string()];
        assert_eq!(merge_link_set(&path, "https://a.example", second).await.unwrap(), 3);

        merge_link_set(&path, "https://b.example", vec!["https://b.example/x".to_string()])
            .await
            .unwrap();

        let doc = read_link_sets(&path).await.unwrap();
        assert_eq!(doc.len(), 2);
        assert_eq!(doc["https://a.example"].len(), 3);
        assert_eq!(doc["https://b.example"], vec!["https://b.example/x".to_string()]);
        assert!(!temp_path(&path).exists());
        let names: Vec<String> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["2024-05-01_urls.json".to_string()]);
    }

    #[test]
    fn test_temp_path_is_hidden_sibling() {
        let tmp = temp_path(Path::new("output/urls/2024-05-01_urls.json"));
        assert_eq!(tmp, Path::new("output/urls/.2024-05-01_urls.json.tmp"));
    }

    #[tokio::test]
    async fn test_corrupt_document_is_a_json_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("2024-05-01_urls.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            read_link_sets(&path).await,
            Err(PipelineError::Json { .. })
        ));
    }
}
