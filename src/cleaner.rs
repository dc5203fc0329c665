//! Corpus cleaning by article length and newspaper volume.

use crate::models::{ArticleRecord, RawArticleRow};
use std::collections::HashMap;
use tracing::{debug, info, instrument};

/// Thresholds for [`clean`].
#[derive(Debug, Clone, Copy)]
pub struct CleanLimits {
    pub min_length: usize,
    pub max_length: usize,
    /// Newspapers with fewer surviving articles are dropped entirely.
    pub min_group_size: usize,
}

impl Default for CleanLimits {
    fn default() -> Self {
        Self {
            min_length: 1000,
            max_length: 5000,
            min_group_size: 5,
        }
    }
}

/// Filter the extracted corpus.
///
/// In order: drop rows without a textual body, keep bodies whose length in
/// chars lies in `min_length..=max_length`, then drop every newspaper left
/// with fewer than `min_group_size` rows. Surviving rows keep their order.
#[instrument(level = "info", skip_all, fields(rows = rows.len(), min = limits.min_length, max = limits.max_length))]
pub fn clean(rows: Vec<RawArticleRow>, limits: CleanLimits) -> Vec<ArticleRecord> {
    let in_range: Vec<ArticleRecord> = rows
        .into_iter()
        .filter_map(|row| {
            let content = row.article_content.filter(|c| !c.is_empty())?;
            let length = content.chars().count();
            if length < limits.min_length || length > limits.max_length {
                debug!(url = %row.article_url, length, "Article length out of range");
                return None;
            }
            Some(ArticleRecord {
                newspaper: row.newspaper,
                article_url: row.article_url,
                article_content: content,
            })
        })
        .collect();

    let mut group_sizes: HashMap<&str, usize> = HashMap::new();
    for record in &in_range {
        *group_sizes.entry(record.newspaper.as_str()).or_default() += 1;
    }
    let keep: Vec<bool> = in_range
        .iter()
        .map(|record| group_sizes[record.newspaper.as_str()] >= limits.min_group_size)
        .collect();

    let cleaned: Vec<ArticleRecord> = in_range
        .into_iter()
        .zip(keep)
        .filter_map(|(record, keep)| keep.then_some(record))
        .collect();
    info!(kept = cleaned.len(), "Cleaned articles");
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(newspaper: &str, n: usize, length: usize) -> RawArticleRow {
        RawArticleRow {
            newspaper: newspaper.to_string(),
            article_url: format!("{newspaper}/{n}"),
            article_content: Some("a".repeat(length)),
        }
    }

    #[test]
    fn test_length_and_group_scenario() {
        let lengths = [500, 1200, 1200, 1200, 1200, 1200, 6000];
        let rows: Vec<RawArticleRow> = lengths
            .iter()
            .enumerate()
            .map(|(i, &len)| row("X", i, len))
            .collect();

        let cleaned = clean(rows, CleanLimits::default());
        assert_eq!(cleaned.len(), 5);
        assert!(cleaned.iter().all(|r| r.article_content.chars().count() == 1200));
        let urls: Vec<&str> = cleaned.iter().map(|r| r.article_url.as_str()).collect();
        assert_eq!(urls, vec!["X/1", "X/2", "X/3", "X/4", "X/5"]);
    }

    #[test]
    fn test_small_groups_are_dropped() {
        let mut rows: Vec<RawArticleRow> = (0..5).map(|i| row("big", i, 2000)).collect();
        rows.extend((0..4).map(|i| row("small", i, 2000)));
        // Out of range, so "small" stays at four.
        rows.push(row("small", 9, 9000));

        let cleaned = clean(rows, CleanLimits::default());
        assert_eq!(cleaned.len(), 5);
        assert!(cleaned.iter().all(|r| r.newspaper == "big"));
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let rows = vec![
            row("X", 0, 1000),
            row("X", 1, 5000),
            row("X", 2, 999),
            row("X", 3, 5001),
        ];
        let limits = CleanLimits {
            min_group_size: 1,
            ..CleanLimits::default()
        };
        let cleaned = clean(rows, limits);
        let urls: Vec<&str> = cleaned.iter().map(|r| r.article_url.as_str()).collect();
        assert_eq!(urls, vec!["X/0", "X/1"]);
    }

    #[test]
    fn test_missing_bodies_are_discarded() {
        let mut rows: Vec<RawArticleRow> = (0..5).map(|i| row("X", i, 1500)).collect();
        rows[2].article_content = None;
        let cleaned = clean(rows, CleanLimits::default());
        assert!(cleaned.is_empty());
    }

    #[test]
    fn test_length_counts_chars_not_bytes() {
        let rows = vec![RawArticleRow {
            newspaper: "X".to_string(),
            article_url: "X/0".to_string(),
            article_content: Some("é".repeat(3)),
        }];
        let limits = CleanLimits {
            min_length: 3,
            max_length: 3,
            min_group_size: 1,
        };
        assert_eq!(clean(rows, limits).len(), 1);
    }

    #[test]
    fn test_output_satisfies_invariants() {
        let rows: Vec<RawArticleRow> = (0..40)
            .map(|i| row(["a", "b", "c"][i % 3], i, 300 * (i + 1)))
            .collect();
        let limits = CleanLimits::default();
        let cleaned = clean(rows, limits);

        let mut sizes: HashMap<&str, usize> = HashMap::new();
        for r in &cleaned {
            let len = r.article_content.chars().count();
            assert!(len >= limits.min_length && len <= limits.max_length);
            *sizes.entry(r.newspaper.as_str()).or_default() += 1;
        }
        assert!(sizes.values().all(|&n| n >= limits.min_group_size));
    }
}
