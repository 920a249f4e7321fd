//! Optional AI summaries for the top of the page.
//!
//! The enricher only exists when summaries are switched on *and* a credential
//! is configured; otherwise [`Enricher::from_config`] returns `None` and the
//! pipeline never touches a provider.
//!
//! When active it summarizes the `mustRead` items and the first few `tools`,
//! skipping titles that are not in Latin script. Calls go out one at a time
//! with a pause after each, to stay inside the provider's rate limit. A failed
//! call leaves that item without `aiSummary` and the batch carries on.

use crate::api::{ProviderKind, RetrySummarize, Summarizer, SummaryProvider, SummaryRequest};
use crate::classify::Buckets;
use crate::heuristics::is_latin_script;
use crate::models::Item;
use itertools::Itertools;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Pause after every provider call.
pub const CALL_DELAY: Duration = Duration::from_millis(500);

/// How many `tools` items are summarized, counted from the top.
pub const TOOLS_QUOTA: usize = 5;

/// Summarization settings as read from the command line / environment.
#[derive(Debug, Clone)]
pub struct AiSummaryConfig {
    pub enabled: bool,
    pub provider: ProviderKind,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub max_retries: usize,
}

impl AiSummaryConfig {
    /// Enabled and holding a non-blank credential.
    pub fn is_active(&self) -> bool {
        self.enabled && self.credential().is_some()
    }

    fn credential(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

pub struct Enricher<S> {
    summarizer: S,
    delay: Duration,
}

impl Enricher<RetrySummarize<SummaryProvider>> {
    /// Build the configured enricher, or `None` when summaries are off.
    pub fn from_config(config: &AiSummaryConfig) -> Option<Self> {
        if !config.is_active() {
            if config.enabled {
                warn!("AI summaries enabled but no API key configured; skipping enrichment");
            }
            return None;
        }
        let key = config.credential()?;
        let provider = SummaryProvider::new(
            config.provider,
            key,
            config.model.as_deref(),
            config.base_url.as_deref(),
        );
        info!(provider = ?config.provider, "AI summaries enabled");
        Some(Self::new(RetrySummarize::new(
            provider,
            config.max_retries,
            Duration::from_secs(1),
        )))
    }
}

impl<S: Summarizer> Enricher<S> {
    pub fn new(summarizer: S) -> Self {
        Self {
            summarizer,
            delay: CALL_DELAY,
        }
    }

    #[cfg(test)]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Summarize the eligible items and attach the results to every bucket
    /// copy of those items. Returns the number of items summarized.
    #[instrument(level = "info", skip_all)]
    pub async fn enrich(&self, daily: &mut Buckets, extra: &mut Buckets) -> usize {
        let targets = select_targets(daily);
        info!(targets = targets.len(), "Generating AI summaries");

        let mut summaries: HashMap<String, String> = HashMap::new();
        for item in &targets {
            let req = SummaryRequest {
                title: &item.title,
                description: item.description.as_deref().unwrap_or_default(),
                url: &item.url,
            };
            match self.summarizer.summarize(&req).await {
                Ok(text) => {
                    summaries.insert(item.id.clone(), text);
                }
                Err(e) => warn!(id = %item.id, error = %e, "AI summary failed; leaving item unsummarized"),
            }
            tokio::time::sleep(self.delay).await;
        }

        for item in daily.items_mut().chain(extra.items_mut()) {
            if let Some(text) = summaries.get(&item.id) {
                item.ai_summary = Some(text.clone());
            }
        }

        info!(
            summarized = summaries.len(),
            failed = targets.len() - summaries.len(),
            "AI summaries done"
        );
        summaries.len()
    }
}

/// `mustRead` plus the first [`TOOLS_QUOTA`] tools, Latin-script titles only,
/// each item once.
pub fn select_targets(daily: &Buckets) -> Vec<Item> {
    let must_read = daily.get("mustRead").unwrap_or_default();
    let tools = daily.get("tools").unwrap_or_default();
    must_read
        .iter()
        .chain(tools.iter().take(TOOLS_QUOTA))
        .filter(|item| is_latin_script(&item.title))
        .unique_by(|item| item.id.clone())
        .cloned()
        .collect()
}
