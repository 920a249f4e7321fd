//! Data models for aggregated items and the persisted snapshot.
//!
//! This module defines the core data structures used throughout the application:
//! - [`Item`]: The uniform unit every source adapter produces
//! - [`Category`]: The fixed tag set an item is filed under
//! - [`Snapshot`]: The single document written at the end of a run
//!
//! Field names serialize in camelCase to match the JSON the display layer
//! reads. Optional fields that were never populated are omitted entirely.

use crate::classify::Buckets;
use serde::{Deserialize, Serialize};

/// The fixed set of categories an [`Item`] can be filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Github,
    AiNews,
    Tech,
    Paper,
    Practice,
    ChinaAi,
    AiProduct,
    AiTool,
    Community,
}

/// A single aggregated entry, regardless of which source produced it.
///
/// # Identity
///
/// `id` is derived from the source's natural key (repository name, story id,
/// feed guid) with a per-source prefix, so the same upstream entity gets the
/// same `id` on every run. `url` doubles as a secondary identity when present.
///
/// # Ranking signals
///
/// The numeric signals are all optional. Bucket ranking reads them through
/// the `*_or_zero` accessors so a missing signal sorts as `0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub title: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub source: String,
    pub category: Category,
    /// Epoch milliseconds.
    pub time: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reactions: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downloads: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub likes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replies: Option<u64>,

    #[serde(rename = "isAI", default, skip_serializing_if = "Option::is_none")]
    pub is_ai: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_china: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stars_today: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_stars: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arxiv_category: Option<String>,

    /// Only ever set by the enricher.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_summary: Option<String>,
}

impl Item {
    /// Create an item with the required fields set and every optional field empty.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        url: impl Into<String>,
        source: impl Into<String>,
        category: Category,
        time: i64,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            url: url.into(),
            description: None,
            source: source.into(),
            category,
            time,
            score: None,
            comments: None,
            reactions: None,
            downloads: None,
            likes: None,
            replies: None,
            is_ai: None,
            is_china: None,
            author: None,
            language: None,
            stars_today: None,
            total_stars: None,
            tags: None,
            arxiv_category: None,
            ai_summary: None,
        }
    }

    /// Identity used by the deduplicator: the url when present, the id otherwise.
    pub fn identity_key(&self) -> &str {
        if self.url.is_empty() { &self.id } else { &self.url }
    }

    pub fn score_or_zero(&self) -> u64 {
        self.score.unwrap_or(0)
    }

    pub fn reactions_or_zero(&self) -> u64 {
        self.reactions.unwrap_or(0)
    }

    pub fn is_ai(&self) -> bool {
        self.is_ai.unwrap_or(false)
    }

    pub fn is_china(&self) -> bool {
        self.is_china.unwrap_or(false)
    }
}

/// Run metadata stored under `meta` in the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMeta {
    /// Whether the enricher actually ran this time.
    pub ai_summary_enabled: bool,
    /// Sorted, distinct source names present in the deduplicated corpus.
    pub sources: Vec<String>,
}

/// The document written at the end of every run.
///
/// Each run produces exactly one `Snapshot`; it replaces the previous file
/// wholesale. Nothing from earlier runs is carried forward.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Epoch milliseconds at which the snapshot was assembled.
    pub update_time: i64,
    /// Display form of `update_time` in the display layer's timezone.
    pub update_time_str: String,
    /// Size of the deduplicated corpus, not the sum of bucket sizes.
    pub total_count: usize,
    pub daily: Buckets,
    pub extra: Buckets,
    pub meta: SnapshotMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Item {
        Item::new(
            "hn-1",
            "Show HN: a thing",
            "https://example.com/thing",
            "Hacker News",
            Category::AiNews,
            1_700_000_000_000,
        )
    }

    #[test]
    fn test_category_serializes_kebab_case() {
        assert_eq!(serde_json::to_string(&Category::AiNews).unwrap(), "\"ai-news\"");
        assert_eq!(serde_json::to_string(&Category::ChinaAi).unwrap(), "\"china-ai\"");
        assert_eq!(serde_json::to_string(&Category::Github).unwrap(), "\"github\"");
        assert_eq!(serde_json::to_string(&Category::AiTool).unwrap(), "\"ai-tool\"");
    }

    #[test]
    fn test_item_omits_unpopulated_fields() {
        let json = serde_json::to_value(sample()).unwrap();
        let obj = json.as_object().unwrap();
        assert!(obj.contains_key("id"));
        assert!(obj.contains_key("time"));
        assert!(!obj.contains_key("aiSummary"));
        assert!(!obj.contains_key("score"));
        assert!(!obj.contains_key("isAI"));
    }

    #[test]
    fn test_item_camel_case_keys() {
        let mut item = sample();
        item.is_ai = Some(true);
        item.is_china = Some(false);
        item.stars_today = Some("120 stars today".to_string());
        item.ai_summary = Some("summary".to_string());

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["isAI"], true);
        assert_eq!(json["isChina"], false);
        assert_eq!(json["starsToday"], "120 stars today");
        assert_eq!(json["aiSummary"], "summary");
    }

    #[test]
    fn test_identity_key_prefers_url() {
        let item = sample();
        assert_eq!(item.identity_key(), "https://example.com/thing");

        let mut no_url = sample();
        no_url.url.clear();
        assert_eq!(no_url.identity_key(), "hn-1");
    }

    #[test]
    fn test_missing_signals_read_as_zero() {
        let item = sample();
        assert_eq!(item.score_or_zero(), 0);
        assert_eq!(item.reactions_or_zero(), 0);
        assert!(!item.is_ai());
        assert!(!item.is_china());
    }
}
