//! arXiv listing scraper.
//!
//! Reads the daily RSS listing for a handful of AI-adjacent categories. A
//! paper cross-listed in several categories appears in several feeds; only
//! its first appearance is kept. A failing category feed is logged and
//! skipped, the others still contribute.

use crate::models::{Category, Item};
use crate::scrapers::feeds::{FEED_TIMEOUT, entry_link, entry_summary, entry_time, entry_title};
use crate::scrapers::{ScrapeError, SourceAdapter, get_text, pace, require_any_success};
use crate::utils::now_millis;
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{info, instrument, warn};

const CATEGORIES: [&str; 3] = ["cs.AI", "cs.CL", "cs.LG"];
const PER_CATEGORY: usize = 10;
const FEED_DELAY: Duration = Duration::from_millis(500);
const ABSTRACT_CHARS: usize = 300;

pub struct Arxiv {
    client: Client,
}

impl Arxiv {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SourceAdapter for Arxiv {
    fn name(&self) -> &str {
        "arXiv"
    }

    #[instrument(level = "info", skip_all)]
    async fn fetch_items(&self) -> Result<Vec<Item>, ScrapeError> {
        let mut seen = HashSet::new();
        let mut papers = Vec::new();
        let mut succeeded = 0;
        let mut last_error = None;

        for (i, cat) in CATEGORIES.iter().enumerate() {
            if i > 0 {
                pace(FEED_DELAY).await;
            }
            let url = format!("https://export.arxiv.org/rss/{cat}");
            let parsed = match get_text(&self.client, &url, FEED_TIMEOUT).await {
                Ok(body) => parse_listing(&body, cat, now_millis()),
                Err(e) => Err(e),
            };
            match parsed {
                Ok(batch) => {
                    succeeded += 1;
                    for paper in batch {
                        if seen.insert(paper.id.clone()) {
                            papers.push(paper);
                        }
                    }
                }
                Err(e) => {
                    warn!(category = cat, error = %e, "arXiv category feed failed");
                    last_error = Some(e);
                }
            }
        }
        require_any_success(succeeded, last_error)?;

        info!(count = papers.len(), "Fetched arXiv papers");
        Ok(papers)
    }
}

/// Parse one category listing into at most ten papers.
pub fn parse_listing(body: &str, category: &str, now: i64) -> Result<Vec<Item>, ScrapeError> {
    let feed = feed_rs::parser::parse(body.as_bytes())?;
    let papers = feed
        .entries
        .iter()
        .take(PER_CATEGORY)
        .map(|entry| {
            let link = entry_link(entry);
            let arxiv_id = link
                .split_once("/abs/")
                .map(|(_, id)| id.to_string())
                .unwrap_or_else(|| entry.id.clone());
            let mut item = Item::new(
                format!("arxiv-{arxiv_id}"),
                entry_title(entry),
                link,
                "arXiv",
                Category::Paper,
                entry_time(entry).unwrap_or(now),
            );
            item.description = Some(entry_summary(entry, ABSTRACT_CHARS));
            item.author = entry
                .authors
                .first()
                .map(|p| p.name.clone())
                .filter(|n| !n.is_empty());
            item.arxiv_category = Some(category.to_string());
            item
        })
        .collect();
    Ok(papers)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>cs.AI updates on arXiv.org</title>
    <link>http://rss.arxiv.org/rss/cs.AI</link>
    <description>cs.AI updates</description>
    <item>
      <title>Attention Is
        Still All You Need</title>
      <link>https://arxiv.org/abs/2405.00001</link>
      <guid>oai:arXiv.org:2405.00001v1</guid>
      <description>arXiv:2405.00001v1 Announce Type: new Abstract: We revisit attention.</description>
      <pubDate>Mon, 06 May 2024 00:00:00 -0400</pubDate>
    </item>
    <item>
      <title>A Paper Without Abs Link</title>
      <link>https://example.org/paper</link>
      <guid>oai:arXiv.org:2405.00002v1</guid>
      <description>Short.</description>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_parse_listing() {
        let papers = parse_listing(LISTING, "cs.AI", 5).unwrap();
        assert_eq!(papers.len(), 2);

        let first = &papers[0];
        assert_eq!(first.id, "arxiv-2405.00001");
        assert_eq!(first.title, "Attention Is Still All You Need");
        assert_eq!(first.url, "https://arxiv.org/abs/2405.00001");
        assert_eq!(first.category, Category::Paper);
        assert_eq!(first.arxiv_category.as_deref(), Some("cs.AI"));
        assert!(first.description.as_deref().unwrap().contains("We revisit attention."));

        let second = &papers[1];
        assert_eq!(second.id, "arxiv-oai:arXiv.org:2405.00002v1");
        assert_eq!(second.time, 5);
    }

    #[test]
    fn test_abstract_is_truncated() {
        let long = "x".repeat(1000);
        let body = LISTING.replace("Short.", &long);
        let papers = parse_listing(&body, "cs.LG", 0).unwrap();
        assert_eq!(papers[1].description.as_deref().map(|d| d.chars().count()), Some(300));
    }
}
