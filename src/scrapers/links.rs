//! Homepage link harvesting.

use crate::error::{PipelineError, Result};
use itertools::Itertools;
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument};
use url::Url;

static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("static selector"));

/// Fetch `homepage` and collect its absolute article links.
///
/// Returns at most `max_links` unique URLs in page order. An unparseable
/// homepage, a non-2xx status or a network failure is a
/// [`PipelineError::Fetch`].
#[instrument(level = "info", skip(client))]
pub async fn harvest(client: &Client, homepage: &str, max_links: usize) -> Result<Vec<String>> {
    let url = Url::parse(homepage).map_err(|e| PipelineError::fetch(homepage, e))?;
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| PipelineError::fetch(homepage, e))?;
    let status = response.status();
    if !status.is_success() {
        return Err(PipelineError::fetch(homepage, format!("HTTP {status}")));
    }
    let html = response
        .text()
        .await
        .map_err(|e| PipelineError::fetch(homepage, e))?;

    let links = extract_links(&html, max_links);
    info!(count = links.len(), "Harvested homepage links");
    debug!(urls = ?links, "Homepage links");
    Ok(links)
}

/// Absolute (`http`-prefixed) `href` targets of `html`, deduplicated, capped.
pub fn extract_links(html: &str, max_links: usize) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(&LINK_SELECTOR)
        .filter_map(|element| element.value().attr("href"))
        .filter(|href| href.starts_with("http"))
        .map(str::to_string)
        .unique()
        .take(max_links)
        .collect()
}
