//! Source adapters for every upstream the daily snapshot draws from.
//!
//! Each adapter fetches one external endpoint (or a small family of related
//! endpoints) and maps the response into [`Item`]s. Adapters are stateless and
//! know nothing about each other.
//!
//! # Supported Sources
//!
//! | Source | Module | Method | Notes |
//! |--------|--------|--------|-------|
//! | GitHub Trending | [`github`] | HTML scraping | All languages and Python, daily |
//! | Hacker News | [`hackernews`] | Firebase JSON API | Top 50 stories, one request per story |
//! | arXiv | [`arxiv`] | RSS | cs.AI, cs.CL, cs.LG |
//! | Dev.to | [`devto`] | JSON API | Five tags, top of the week |
//! | 机器之心 / 36氪 / InfoQ / Product Hunt | [`feeds`] | RSS / Atom | Table-driven [`feeds::FeedSpec`] |
//! | Hugging Face | [`huggingface`] | JSON API | Trending models |
//!
//! # Contract
//!
//! Adapters implement [`SourceAdapter::fetch_items`] and are free to return
//! errors from it. Callers never see those errors: [`settle`] is the adapter
//! boundary, converting any error or panic into an empty list and a log line.
//!
//! Every network call sets its own timeout. Adapters that walk sub-resources
//! call [`pace`] between requests.

pub mod arxiv;
pub mod devto;
pub mod feeds;
pub mod github;
pub mod hackernews;
pub mod huggingface;

use crate::models::Item;
use async_trait::async_trait;
use futures::FutureExt;
use once_cell::sync::Lazy;
use regex::Regex;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// User agent sent with every adapter request. Several upstreams reject
/// requests without a browser-like agent.
pub const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko)";

/// Errors an adapter may hit while fetching or parsing.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status} from {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid feed: {0}")]
    Feed(#[from] feed_rs::parser::ParseFeedError),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("parse error: {0}")]
    Parse(String),
}

/// One external source.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Human-readable adapter name used in logs and fetch reports.
    fn name(&self) -> &str;

    /// Fetch and map the source's current items.
    async fn fetch_items(&self) -> Result<Vec<Item>, ScrapeError>;
}

/// Outcome of running one adapter through [`settle`].
#[derive(Debug)]
pub struct Settled {
    pub items: Vec<Item>,
    /// `None` when the adapter returned normally, otherwise what went wrong.
    pub failure: Option<String>,
}

/// Run an adapter and absorb every failure it can produce.
///
/// Errors and panics are logged with the adapter name and turned into an
/// empty item list.
pub async fn settle(adapter: &dyn SourceAdapter) -> Settled {
    let name = adapter.name();
    match AssertUnwindSafe(adapter.fetch_items()).catch_unwind().await {
        Ok(Ok(items)) => {
            info!(source = name, count = items.len(), "Adapter finished");
            Settled { items, failure: None }
        }
        Ok(Err(e)) => {
            warn!(source = name, error = %e, "Adapter failed; contributing no items");
            Settled {
                items: Vec::new(),
                failure: Some(e.to_string()),
            }
        }
        Err(panic) => {
            let reason = panic_message(panic.as_ref());
            warn!(source = name, reason = %reason, "Adapter panicked; contributing no items");
            Settled {
                items: Vec::new(),
                failure: Some(format!("panicked: {reason}")),
            }
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// The registered adapters, in the order their items enter the pipeline.
pub fn registered_adapters(client: &reqwest::Client) -> Vec<Box<dyn SourceAdapter>> {
    let mut adapters: Vec<Box<dyn SourceAdapter>> = vec![
        Box::new(github::GithubTrending::new(client.clone(), None)),
        Box::new(github::GithubTrending::new(client.clone(), Some("python"))),
        Box::new(hackernews::HackerNews::new(client.clone())),
        Box::new(arxiv::Arxiv::new(client.clone())),
        Box::new(devto::DevTo::new(client.clone())),
    ];
    let [jiqizhixin, kr36, infoq, producthunt] = feeds::FEEDS;
    adapters.push(Box::new(feeds::FeedAdapter::new(client.clone(), jiqizhixin)));
    adapters.push(Box::new(feeds::FeedAdapter::new(client.clone(), kr36)));
    adapters.push(Box::new(feeds::FeedAdapter::new(client.clone(), infoq)));
    adapters.push(Box::new(huggingface::HuggingFace::new(client.clone())));
    adapters.push(Box::new(feeds::FeedAdapter::new(client.clone(), producthunt)));
    adapters
}

/// Build the HTTP client shared by every adapter. Timeouts are set per request.
pub fn http_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder().user_agent(USER_AGENT).build()
}

/// GET `url` with a per-call timeout and return the body, failing on non-2xx.
pub(crate) async fn get_text(
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
) -> Result<String, ScrapeError> {
    let resp = client.get(url).timeout(timeout).send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(ScrapeError::Status {
            status,
            url: url.to_string(),
        });
    }
    Ok(resp.text().await?)
}

/// Verdict for an adapter built from several sub-requests (tags, categories).
///
/// Partial failure is tolerated. When not one sub-request succeeded the last
/// error is returned, so the adapter is reported as rejected rather than as
/// fulfilled with zero items.
pub(crate) fn require_any_success(
    succeeded: usize,
    last_error: Option<ScrapeError>,
) -> Result<(), ScrapeError> {
    match last_error {
        Some(e) if succeeded == 0 => Err(e),
        _ => Ok(()),
    }
}

/// Sleep between sequential calls to the same upstream.
pub(crate) async fn pace(delay: Duration) {
    tokio::time::sleep(delay).await;
}

/// Strip tags, collapse whitespace and cut to at most `max_chars` characters.
pub(crate) fn snippet(raw: &str, max_chars: usize) -> String {
    static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<[^>]+>").expect("valid regex"));
    static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

    let stripped = RE_TAGS.replace_all(raw, " ");
    let collapsed = RE_WS.replace_all(&stripped, " ");
    collapsed.trim().chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;

    struct Fixed(Vec<Item>);
    struct Failing;
    struct Panicking;

    #[async_trait]
    impl SourceAdapter for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }
        async fn fetch_items(&self) -> Result<Vec<Item>, ScrapeError> {
            Ok(self.0.clone())
        }
    }

    #[async_trait]
    impl SourceAdapter for Failing {
        fn name(&self) -> &str {
            "failing"
        }
        async fn fetch_items(&self) -> Result<Vec<Item>, ScrapeError> {
            Err(ScrapeError::Parse("boom".to_string()))
        }
    }

    #[async_trait]
    impl SourceAdapter for Panicking {
        fn name(&self) -> &str {
            "panicking"
        }
        async fn fetch_items(&self) -> Result<Vec<Item>, ScrapeError> {
            panic!("adapter exploded");
        }
    }

    #[tokio::test]
    async fn test_settle_passes_items_through() {
        let item = Item::new("x-1", "t", "https://x", "X", Category::Tech, 0);
        let settled = settle(&Fixed(vec![item.clone()])).await;
        assert_eq!(settled.items, vec![item]);
        assert!(settled.failure.is_none());
    }

    #[tokio::test]
    async fn test_settle_turns_error_into_empty_list() {
        let settled = settle(&Failing).await;
        assert!(settled.items.is_empty());
        assert!(settled.failure.unwrap().contains("boom"));
    }

    #[tokio::test]
    async fn test_settle_turns_panic_into_empty_list() {
        let settled = settle(&Panicking).await;
        assert!(settled.items.is_empty());
        assert_eq!(settled.failure.unwrap(), "panicked: adapter exploded");
    }

    #[test]
    fn test_require_any_success() {
        assert!(require_any_success(0, None).is_ok());
        assert!(require_any_success(2, Some(ScrapeError::Parse("tag 3".into()))).is_ok());

        let err = require_any_success(0, Some(ScrapeError::Parse("tag 5".into()))).unwrap_err();
        assert_eq!(err.to_string(), "parse error: tag 5");
    }

    #[tokio::test(start_paused = true)]
    async fn test_pace_waits_the_full_delay() {
        let t0 = tokio::time::Instant::now();
        pace(Duration::from_millis(300)).await;
        assert!(t0.elapsed() >= Duration::from_millis(300));
    }

    #[test]
    fn test_snippet_strips_tags_and_truncates() {
        let raw = "<p>Hello   <b>world</b></p>\n\n and more";
        assert_eq!(snippet(raw, 100), "Hello world and more");
        assert_eq!(snippet(raw, 5), "Hello");
    }

    #[test]
    fn test_snippet_counts_characters_not_bytes() {
        assert_eq!(snippet("大模型周报", 3), "大模型");
    }

    #[test]
    fn test_registered_adapters_order() {
        let client = reqwest::Client::new();
        let names: Vec<String> = registered_adapters(&client)
            .iter()
            .map(|a| a.name().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "GitHub Trending",
                "GitHub Trending (python)",
                "Hacker News",
                "arXiv",
                "Dev.to",
                "机器之心",
                "36氪",
                "InfoQ",
                "Hugging Face",
                "Product Hunt",
            ]
        );
    }
}
