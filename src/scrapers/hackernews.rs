//! Hacker News scraper using the public Firebase API.
//!
//! The API only hands out story ids in bulk, so the adapter fetches the top
//! story list and then each story individually. Story requests are paced with
//! a short delay; firing fifty requests back to back gets the client throttled.

use crate::heuristics::AI_NEWS;
use crate::models::{Category, Item};
use crate::scrapers::{ScrapeError, SourceAdapter, get_text, pace};
use crate::utils::now_millis;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, instrument};

const API_BASE: &str = "https://hacker-news.firebaseio.com/v0";
const LIST_TIMEOUT: Duration = Duration::from_secs(10);
const ITEM_TIMEOUT: Duration = Duration::from_secs(5);
const ITEM_DELAY: Duration = Duration::from_millis(50);
const MAX_STORIES: usize = 50;

pub struct HackerNews {
    client: Client,
}

impl HackerNews {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

/// The subset of the Firebase item payload we read.
#[derive(Debug, Deserialize)]
pub struct Story {
    pub id: u64,
    pub title: Option<String>,
    pub url: Option<String>,
    pub score: Option<u64>,
    pub descendants: Option<u64>,
    pub by: Option<String>,
    /// Unix seconds.
    pub time: Option<i64>,
}

#[async_trait]
impl SourceAdapter for HackerNews {
    fn name(&self) -> &str {
        "Hacker News"
    }

    #[instrument(level = "info", skip_all)]
    async fn fetch_items(&self) -> Result<Vec<Item>, ScrapeError> {
        let list_url = format!("{API_BASE}/topstories.json");
        let ids: Vec<u64> =
            serde_json::from_str(&get_text(&self.client, &list_url, LIST_TIMEOUT).await?)?;

        let now = now_millis();
        let mut stories = Vec::new();
        for id in ids.into_iter().take(MAX_STORIES) {
            let item_url = format!("{API_BASE}/item/{id}.json");
            let fetched = get_text(&self.client, &item_url, ITEM_TIMEOUT)
                .await
                .and_then(|body| Ok(serde_json::from_str::<Option<Story>>(&body)?));
            match fetched {
                Ok(Some(story)) => {
                    if let Some(item) = story_to_item(story, now) {
                        stories.push(item);
                    }
                }
                Ok(None) => debug!(id, "Story not found"),
                Err(e) => debug!(id, error = %e, "Skipping story"),
            }
            pace(ITEM_DELAY).await;
        }

        let ai_count = stories.iter().filter(|s| s.is_ai()).count();
        info!(count = stories.len(), ai_count, "Fetched Hacker News stories");
        Ok(stories)
    }
}

/// Map a story into an item. Stories without a title (deleted, dead) are
/// dropped; a story without a timestamp is stamped with `now`.
pub fn story_to_item(story: Story, now: i64) -> Option<Item> {
    let title = story.title.filter(|t| !t.is_empty())?;
    let is_ai = AI_NEWS.matches(&title);
    let url = story
        .url
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| format!("https://news.ycombinator.com/item?id={}", story.id));

    let mut item = Item::new(
        format!("hn-{}", story.id),
        title,
        url,
        "Hacker News",
        if is_ai { Category::AiNews } else { Category::Tech },
        story
            .time
            .map(|secs| secs.saturating_mul(1000))
            .unwrap_or(now),
    );
    item.score = Some(story.score.unwrap_or(0));
    item.comments = Some(story.descendants.unwrap_or(0));
    item.author = story.by;
    item.is_ai = Some(is_ai);
    Some(item)
}
