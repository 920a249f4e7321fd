//! Table-driven RSS / Atom adapters.
//!
//! Several sources are nothing more than a feed URL plus a few mapping
//! choices: which id prefix to use, which category to file entries under,
//! whether to keep only AI-related entries, and how many to take. Each of
//! those is one [`FeedSpec`] row in [`FEEDS`]; a single [`FeedAdapter`] type
//! serves all of them.
//!
//! Parsing is done with `feed-rs`, which accepts RSS 0.9x/1.0/2.0, Atom and
//! JSON Feed, so upstreams switching formats does not break the adapter.

use crate::heuristics::{AI_PRODUCT, CHINA_AI, KeywordSet};
use crate::models::{Category, Item};
use crate::scrapers::{ScrapeError, SourceAdapter, get_text, snippet};
use crate::utils::now_millis;
use async_trait::async_trait;
use feed_rs::model::Entry;
use reqwest::Client;
use std::time::Duration;
use tracing::{info, instrument};

pub(crate) const FEED_TIMEOUT: Duration = Duration::from_secs(15);

/// One feed-backed source.
#[derive(Debug, Clone, Copy)]
pub struct FeedSpec {
    pub source: &'static str,
    pub url: &'static str,
    pub id_prefix: &'static str,
    pub category: Category,
    pub is_china: bool,
    /// When set, only entries whose title + summary match are kept.
    pub keywords: Option<KeywordSet>,
    pub limit: usize,
    pub snippet_chars: usize,
}

/// 机器之心, 36氪, InfoQ and Product Hunt, in that order.
pub const FEEDS: [FeedSpec; 4] = [
    FeedSpec {
        source: "机器之心",
        url: "https://www.jiqizhixin.com/rss",
        id_prefix: "jqzx",
        category: Category::ChinaAi,
        is_china: true,
        keywords: None,
        limit: 15,
        snippet_chars: 200,
    },
    FeedSpec {
        source: "36氪",
        url: "https://36kr.com/feed",
        id_prefix: "36kr",
        category: Category::ChinaAi,
        is_china: true,
        keywords: Some(CHINA_AI),
        limit: 10,
        snippet_chars: 200,
    },
    FeedSpec {
        source: "InfoQ",
        url: "https://www.infoq.cn/feed",
        id_prefix: "infoq",
        category: Category::Practice,
        is_china: true,
        keywords: None,
        limit: 10,
        snippet_chars: 200,
    },
    FeedSpec {
        source: "Product Hunt",
        url: "https://www.producthunt.com/feed",
        id_prefix: "ph",
        category: Category::AiProduct,
        is_china: false,
        keywords: Some(AI_PRODUCT),
        limit: 10,
        snippet_chars: 200,
    },
];

pub struct FeedAdapter {
    client: Client,
    spec: FeedSpec,
}

impl FeedAdapter {
    pub fn new(client: Client, spec: FeedSpec) -> Self {
        Self { client, spec }
    }
}

#[async_trait]
impl SourceAdapter for FeedAdapter {
    fn name(&self) -> &str {
        self.spec.source
    }

    #[instrument(level = "info", skip_all, fields(source = self.spec.source))]
    async fn fetch_items(&self) -> Result<Vec<Item>, ScrapeError> {
        let body = get_text(&self.client, self.spec.url, FEED_TIMEOUT).await?;
        let items = parse_feed(&self.spec, &body, now_millis())?;
        info!(count = items.len(), "Parsed feed");
        Ok(items)
    }
}

/// Parse a feed body according to `spec`.
pub fn parse_feed(spec: &FeedSpec, body: &str, now: i64) -> Result<Vec<Item>, ScrapeError> {
    let feed = feed_rs::parser::parse(body.as_bytes())?;
    let items = feed
        .entries
        .iter()
        .filter(|entry| match &spec.keywords {
            Some(kw) => kw.matches(&format!(
                "{}{}",
                entry_title(entry),
                entry_summary(entry, usize::MAX)
            )),
            None => true,
        })
        .take(spec.limit)
        .map(|entry| {
            let link = entry_link(entry);
            let key = if entry.id.is_empty() { link.clone() } else { entry.id.clone() };
            let mut item = Item::new(
                format!("{}-{}", spec.id_prefix, key),
                entry_title(entry),
                link,
                spec.source,
                spec.category,
                entry_time(entry).unwrap_or(now),
            );
            item.description = Some(entry_summary(entry, spec.snippet_chars));
            if spec.is_china {
                item.is_china = Some(true);
            }
            item
        })
        .collect();
    Ok(items)
}

/// Entry title with line breaks folded into spaces.
pub(crate) fn entry_title(entry: &Entry) -> String {
    entry
        .title
        .as_ref()
        .map(|t| t.content.split_whitespace().collect::<Vec<_>>().join(" "))
        .unwrap_or_default()
}

/// First link of the entry, or an empty string.
pub(crate) fn entry_link(entry: &Entry) -> String {
    entry
        .links
        .first()
        .map(|l| l.href.clone())
        .unwrap_or_default()
}

/// Plain-text summary (falling back to the content body) cut to `max_chars`.
pub(crate) fn entry_summary(entry: &Entry, max_chars: usize) -> String {
    let raw = entry
        .summary
        .as_ref()
        .map(|s| s.content.as_str())
        .or_else(|| entry.content.as_ref().and_then(|c| c.body.as_deref()))
        .unwrap_or_default();
    snippet(raw, max_chars)
}

/// Publication time in epoch ms, falling back to the update time.
pub(crate) fn entry_time(entry: &Entry) -> Option<i64> {
    entry
        .published
        .or(entry.updated)
        .map(|t| t.timestamp_millis())
}
