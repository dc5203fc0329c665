//! Utility functions for dates, log formatting and file system checks.

use crate::error::{PipelineError, Result};
use chrono::{Local, NaiveDate};
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Today's processing date in `YYYY-MM-DD` form, in local time.
pub fn today() -> String {
    Local::now().date_naive().format("%Y-%m-%d").to_string()
}

/// Validate a processing date given on the command line.
///
/// # Arguments
///
/// * `raw` - the date as typed, e.g. `2024-05-01`
///
/// # Returns
///
/// The date unchanged when it is a real calendar day in zero-padded
/// `YYYY-MM-DD` form. Anything else (underscores, path fragments, `2024-5-1`)
/// is a [`PipelineError::Config`], since the date becomes the join key of
/// every file name downstream.
pub fn parse_date(raw: &str) -> Result<String> {
    let invalid = || PipelineError::config(format!("invalid date '{raw}', expected YYYY-MM-DD"));
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| invalid())?;
    if date.format("%Y-%m-%d").to_string() != raw {
        return Err(invalid());
    }
    Ok(raw.to_string())
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes (on a char boundary) with an
/// ellipsis and a count of the dropped bytes appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…(+{} bytes)", &s[..end], s.len() - end)
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then writes and removes a probe file.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .await
        .map_err(|e| PipelineError::io(path, e))?;
    let probe_path = path.join("..__probe_write__");
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(PipelineError::io(probe_path, e)),
    }
}
