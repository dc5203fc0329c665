//! Article body extraction.
//!
//! The body is the text of the `<p>` elements inside `<article>` when the page
//! has one, otherwise every `<p>` on the page. Paragraphs are whitespace
//! normalized and joined by blank lines.

use crate::error::{PipelineError, Result};
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tracing::{info, instrument};

static ARTICLE_PARAGRAPHS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("article p").expect("static selector"));
static ALL_PARAGRAPHS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p").expect("static selector"));

/// Download `url` and return its body text.
///
/// Non-2xx statuses, network failures and pages without paragraph text are
/// all [`PipelineError::Extraction`].
#[instrument(level = "info", skip(client))]
pub async fn extract(client: &Client, url: &str) -> Result<String> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| PipelineError::extraction(url, e))?;
    let status = response.status();
    if !status.is_success() {
        return Err(PipelineError::extraction(url, format!("HTTP {status}")));
    }
    let html = response
        .text()
        .await
        .map_err(|e| PipelineError::extraction(url, e))?;

    let body = extract_body(&html)
        .ok_or_else(|| PipelineError::extraction(url, "no article text found"))?;
    info!(chars = body.chars().count(), "Parsed article");
    Ok(body)
}

/// Paragraph text of `html`, or `None` when there is none.
pub fn extract_body(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    let mut paragraphs = collect_paragraphs(document.select(&ARTICLE_PARAGRAPHS));
    if paragraphs.is_empty() {
        paragraphs = collect_paragraphs(document.select(&ALL_PARAGRAPHS));
    }

    if paragraphs.is_empty() {
        None
    } else {
        Some(paragraphs.join("\n\n"))
    }
}

fn collect_paragraphs<'a>(elements: impl Iterator<Item = ElementRef<'a>>) -> Vec<String> {
    elements
        .map(|element| {
            element
                .text()
                .flat_map(str::split_whitespace)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|text| !text.is_empty())
        .collect()
}
