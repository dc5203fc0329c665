//! Incremental work selection.
//!
//! Every stage reads the previous stage's directory and writes its own. A unit
//! is pending when its date token exists on the input side and not on the
//! output side. Once any output file carries the token, the input is never
//! processed again, whatever that output contains.

use crate::error::{PipelineError, Result};
use crate::models::ProcessingUnit;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// Units present in `input_dir` but missing from `output_dir`, with the input
/// file each one came from.
#[instrument(level = "debug", skip_all, fields(input = %input_dir.display(), output = %output_dir.display()))]
pub fn pending(input_dir: &Path, output_dir: &Path) -> Result<BTreeMap<ProcessingUnit, PathBuf>> {
    select(input_dir, output_dir, None)
}

/// Like [`pending`], but only output files tagged `{unit}_{tag}.*` count as
/// done. Evaluation files carry the model name as tag, so scoring a day with
/// one model does not hide it from another.
#[instrument(level = "debug", skip_all, fields(input = %input_dir.display(), output = %output_dir.display(), %tag))]
pub fn pending_tagged(
    input_dir: &Path,
    output_dir: &Path,
    tag: &str,
) -> Result<BTreeMap<ProcessingUnit, PathBuf>> {
    select(input_dir, output_dir, Some(tag))
}

fn select(
    input_dir: &Path,
    output_dir: &Path,
    tag: Option<&str>,
) -> Result<BTreeMap<ProcessingUnit, PathBuf>> {
    let mut inputs: BTreeMap<ProcessingUnit, PathBuf> = BTreeMap::new();
    for name in list_files(input_dir)? {
        let unit = ProcessingUnit::from_filename(&name);
        let path = input_dir.join(&name);
        if let Some(first) = inputs.get(&unit) {
            return Err(PipelineError::DuplicateUnit {
                unit: unit.to_string(),
                first: first.clone(),
                second: path,
            });
        }
        inputs.insert(unit, path);
    }

    let done: BTreeSet<ProcessingUnit> = list_files(output_dir)?
        .into_iter()
        .filter(|name| tag.is_none_or(|t| output_tag(name) == Some(t)))
        .map(|name| ProcessingUnit::from_filename(&name))
        .collect();

    inputs.retain(|unit, _| !done.contains(unit));
    debug!(pending = inputs.len(), done = done.len(), "Selected pending units");
    Ok(inputs)
}

/// The part of `{unit}_{tag}.{ext}` between the first `_` and the extension.
fn output_tag(filename: &str) -> Option<&str> {
    let stem = filename.rsplit_once('.').map_or(filename, |(stem, _)| stem);
    stem.split_once('_').map(|(_, tag)| tag)
}

/// Regular file names in `dir`, sorted. A missing directory has no files.
fn list_files(dir: &Path) -> Result<Vec<String>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(PipelineError::io(dir, e)),
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| PipelineError::io(dir, e))?;
        let is_file = entry
            .file_type()
            .map_err(|e| PipelineError::io(entry.path(), e))?
            .is_file();
        if !is_file {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            if !name.starts_with('.') {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(dir: &Path, name: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(name), "").unwrap();
    }

    fn ids(map: &BTreeMap<ProcessingUnit, PathBuf>) -> Vec<&str> {
        map.keys().map(|u| u.as_str()).collect()
    }

    #[test]
    fn test_pending_is_input_minus_output() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("urls");
        let output = tmp.path().join("cleaned_urls");
        touch(&input, "2024-05-01_urls.json");
        touch(&input, "2024-05-02_urls.json");
        touch(&input, "2024-05-03_urls.json");
        touch(&output, "2024-05-02_cleanedUrls.csv");

        let result = pending(&input, &output).unwrap();
        assert_eq!(ids(&result), vec!["2024-05-01", "2024-05-03"]);
        assert_eq!(result[&ProcessingUnit::new("2024-05-01")], input.join("2024-05-01_urls.json"));
    }

    #[test]
    fn test_pending_empty_once_outputs_exist() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("in");
        let output = tmp.path().join("out");
        touch(&input, "2024-05-01_articles.csv");
        touch(&input, "2024-05-02_articles.csv");

        for unit in pending(&input, &output).unwrap().keys() {
            touch(&output, &unit.filename("cleanedArticles", "csv"));
        }
        assert!(pending(&input, &output).unwrap().is_empty());
    }

    #[test]
    fn test_missing_output_dir_means_everything_pending() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("in");
        touch(&input, "2024-05-01_articles.csv");
        let result = pending(&input, &tmp.path().join("does-not-exist")).unwrap();
        assert_eq!(ids(&result), vec!["2024-05-01"]);
    }

    #[test]
    fn test_missing_input_dir_means_no_work() {
        let tmp = tempfile::tempdir().unwrap();
        let result = pending(&tmp.path().join("nope"), &tmp.path().join("out")).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_duplicate_unit_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("in");
        touch(&input, "2024-05-01_articles.csv");
        touch(&input, "2024-05-01_backup.csv");

        let err = pending(&input, &tmp.path().join("out")).unwrap_err();
        assert!(matches!(err, PipelineError::DuplicateUnit { ref unit, .. } if unit == "2024-05-01"));
    }

    #[test]
    fn test_pending_tagged_ignores_other_models() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("cleaned_articles");
        let output = tmp.path().join("evaluations");
        touch(&input, "2024-05-01_cleanedArticles.csv");
        touch(&input, "2024-05-02_cleanedArticles.csv");
        touch(&output, "2024-05-01_gpt-4.csv");
        touch(&output, "2024-05-02_gemini-1.5-flash-latest.csv");

        let gpt4 = pending_tagged(&input, &output, "gpt-4").unwrap();
        assert_eq!(ids(&gpt4), vec!["2024-05-02"]);

        let gemini = pending_tagged(&input, &output, "gemini-1.5-flash-latest").unwrap();
        assert_eq!(ids(&gemini), vec!["2024-05-01"]);
    }

    #[test]
    fn test_output_tag() {
        assert_eq!(output_tag("2024-05-01_gpt-4.csv"), Some("gpt-4"));
        assert_eq!(output_tag("2024-05-01_gemini-1.5-flash-latest.csv"), Some("gemini-1.5-flash-latest"));
        assert_eq!(output_tag("2024-05-01.csv"), None);
    }
}
