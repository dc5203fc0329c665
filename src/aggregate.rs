//! Link aggregation and ranking.
//!
//! Harvested links accumulate in a per-day [`LinkSetDocument`] through
//! [`merge`], which only ever grows a homepage's set. [`filter_and_rank`] then
//! turns a day's document into the cleaned-link table: homepages with too few
//! links are dropped and the rest keep their longest URLs.

use crate::models::{CleanedLink, LinkSetDocument, RankedLink};
use itertools::Itertools;
use std::cmp::Reverse;
use std::collections::HashSet;
use tracing::{debug, info, instrument};

/// Union of an existing link set and freshly harvested links.
///
/// Without an existing set the new links are kept verbatim. Otherwise the
/// existing order is kept and unseen new links are appended in their order.
/// Merging the same links twice is a no-op.
pub fn merge(existing: Option<Vec<String>>, new_links: Vec<String>) -> Vec<String> {
    let Some(mut merged) = existing else {
        return new_links;
    };
    let mut seen: HashSet<String> = merged.iter().cloned().collect();
    for link in new_links {
        if seen.insert(link.clone()) {
            merged.push(link);
        }
    }
    merged
}

/// Thresholds for [`filter_and_rank`].
#[derive(Debug, Clone, Copy)]
pub struct RankLimits {
    /// Homepages with fewer URLs than this are dropped entirely.
    pub min_links: usize,
    /// URLs kept per surviving homepage.
    pub top: usize,
}

impl Default for RankLimits {
    fn default() -> Self {
        Self {
            min_links: 30,
            top: 20,
        }
    }
}

/// Select the `top` longest URLs of every homepage with at least `min_links`.
///
/// Homepages come out in sorted order. Within a homepage URLs are ordered by
/// length descending; equal lengths keep their document order.
#[instrument(level = "info", skip_all, fields(homepages = document.len()))]
pub fn filter_and_rank(document: &LinkSetDocument, limits: RankLimits) -> Vec<CleanedLink> {
    let rows: Vec<RankedLink> = document
        .iter()
        .flat_map(|(homepage, urls)| urls.iter().map(move |url| RankedLink::new(homepage, url)))
        .collect();

    let mut kept = Vec::new();
    let mut dropped = 0usize;
    for (homepage, group) in &rows.into_iter().chunk_by(|link| link.homepage.clone()) {
        let group: Vec<RankedLink> = group.collect();
        if group.len() < limits.min_links {
            debug!(%homepage, links = group.len(), "Dropping homepage with too few links");
            dropped += 1;
            continue;
        }
        kept.extend(
            group
                .into_iter()
                .sorted_by_key(|link| Reverse(link.length))
                .take(limits.top)
                .map(CleanedLink::from),
        );
    }

    info!(rows = kept.len(), dropped, "Ranked links");
    kept
}
