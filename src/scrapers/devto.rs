//! Dev.to articles via the public Forem API.
//!
//! Queries the week's top articles for a few tags, one request per tag with a
//! pause in between. An article tagged with several of the queried tags shows
//! up in several responses and is kept once.

use crate::models::{Category, Item};
use crate::scrapers::{ScrapeError, SourceAdapter, get_text, pace, require_any_success};
use crate::utils::now_millis;
use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{info, instrument, warn};

const TAGS: [&str; 5] = ["ai", "machinelearning", "llm", "webdev", "programming"];
const TIMEOUT: Duration = Duration::from_secs(10);
const TAG_DELAY: Duration = Duration::from_millis(300);

pub struct DevTo {
    client: Client,
}

impl DevTo {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
pub struct Article {
    pub id: u64,
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    #[serde(default)]
    pub tag_list: Vec<String>,
    pub public_reactions_count: Option<u64>,
    pub comments_count: Option<u64>,
    pub published_at: Option<String>,
    pub user: Option<User>,
}

#[derive(Debug, Deserialize)]
pub struct User {
    pub name: Option<String>,
    pub username: Option<String>,
}

#[async_trait]
impl SourceAdapter for DevTo {
    fn name(&self) -> &str {
        "Dev.to"
    }

    #[instrument(level = "info", skip_all)]
    async fn fetch_items(&self) -> Result<Vec<Item>, ScrapeError> {
        let mut seen = HashSet::new();
        let mut articles = Vec::new();
        let mut succeeded = 0;
        let mut last_error = None;
        let now = now_millis();

        for (i, tag) in TAGS.iter().enumerate() {
            if i > 0 {
                pace(TAG_DELAY).await;
            }
            let url = format!("https://dev.to/api/articles?tag={tag}&per_page=15&top=7");
            let batch = get_text(&self.client, &url, TIMEOUT)
                .await
                .and_then(|body| Ok(serde_json::from_str::<Vec<Article>>(&body)?));
            match batch {
                Ok(batch) => {
                    succeeded += 1;
                    for article in batch {
                        if seen.insert(article.id) {
                            articles.push(article_to_item(article, now));
                        }
                    }
                }
                Err(e) => {
                    warn!(tag, error = %e, "Dev.to tag request failed");
                    last_error = Some(e);
                }
            }
        }
        require_any_success(succeeded, last_error)?;

        info!(count = articles.len(), "Fetched Dev.to articles");
        Ok(articles)
    }
}

/// Map an article into an item. `now` stands in for a missing or malformed
/// publication time.
pub fn article_to_item(article: Article, now: i64) -> Item {
    let time = article
        .published_at
        .as_deref()
        .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
        .map(|t| t.timestamp_millis())
        .unwrap_or(now);

    let mut item = Item::new(
        format!("devto-{}", article.id),
        article.title,
        article.url,
        "Dev.to",
        Category::Practice,
        time,
    );
    item.description = Some(article.description.unwrap_or_default());
    item.author = article.user.and_then(|u| u.name.or(u.username));
    item.tags = Some(article.tag_list);
    item.reactions = Some(article.public_reactions_count.unwrap_or(0));
    item.comments = Some(article.comments_count.unwrap_or(0));
    item
}
