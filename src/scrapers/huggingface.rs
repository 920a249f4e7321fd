//! Trending models from the Hugging Face Hub API.

use crate::models::{Category, Item};
use crate::scrapers::{ScrapeError, SourceAdapter, get_text};
use crate::utils::now_millis;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, instrument};

const MODELS_URL: &str = "https://huggingface.co/api/models?sort=trending&limit=15";
const TIMEOUT: Duration = Duration::from_secs(15);

pub struct HuggingFace {
    client: Client,
}

impl HuggingFace {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
pub struct Model {
    pub id: String,
    pub pipeline_tag: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub downloads: Option<u64>,
    pub likes: Option<u64>,
}

#[async_trait]
impl SourceAdapter for HuggingFace {
    fn name(&self) -> &str {
        "Hugging Face"
    }

    #[instrument(level = "info", skip_all)]
    async fn fetch_items(&self) -> Result<Vec<Item>, ScrapeError> {
        let body = get_text(&self.client, MODELS_URL, TIMEOUT).await?;
        let models: Vec<Model> = serde_json::from_str(&body)?;
        let now = now_millis();
        let items: Vec<Item> = models.into_iter().map(|m| model_to_item(m, now)).collect();
        info!(count = items.len(), "Fetched Hugging Face models");
        Ok(items)
    }
}

/// The Hub reports no trending timestamp, so items carry the fetch time.
pub fn model_to_item(model: Model, now: i64) -> Item {
    let description = model
        .pipeline_tag
        .or_else(|| model.tags.into_iter().next())
        .unwrap_or_else(|| "AI Model".to_string());

    let mut item = Item::new(
        format!("hf-{}", model.id.replacen('/', "-", 1)),
        model.id.clone(),
        format!("https://huggingface.co/{}", model.id),
        "Hugging Face",
        Category::AiTool,
        now,
    );
    item.description = Some(description);
    item.downloads = Some(model.downloads.unwrap_or(0));
    item.likes = Some(model.likes.unwrap_or(0));
    item
}
