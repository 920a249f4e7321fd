//! One collection run, from fetch to assembled snapshot.
//!
//! ```text
//! adapters ──fetch_all──▶ raw items ──dedup──▶ corpus ──classify──▶ daily / extra
//!                                                                      │
//!                                                      (enrich, when active)
//!                                                                      ▼
//!                                                                  Snapshot
//! ```
//!
//! Nothing here touches the filesystem; writing is left to
//! [`outputs::snapshot`](crate::outputs::snapshot).

use crate::api::Summarizer;
use crate::classify::{DAILY_RULES, EXTRA_RULES, classify};
use crate::dedup::{SeenKeys, dedup};
use crate::enrich::Enricher;
use crate::fetch::{FetchReport, SourceOutcome, fetch_all};
use crate::models::{Item, Snapshot, SnapshotMeta};
use crate::scrapers::SourceAdapter;
use crate::utils::format_update_time;
use itertools::Itertools;
use tracing::{info, instrument, warn};

/// Result of a run: the snapshot plus what happened on the way.
#[derive(Debug)]
pub struct Run {
    pub snapshot: Snapshot,
    /// Per-adapter outcome, in registration order.
    pub outcomes: Vec<SourceOutcome>,
    /// Item count before deduplication.
    pub raw_count: usize,
}

/// Fetch from every adapter, deduplicate, classify and optionally enrich.
///
/// `now` is the epoch-millisecond timestamp stamped on the snapshot. Passing
/// `None` for `enricher` leaves every `aiSummary` absent and records
/// `aiSummaryEnabled: false`.
#[instrument(level = "info", skip_all, fields(adapters = adapters.len(), enrich = enricher.is_some()))]
pub async fn run<S: Summarizer>(
    adapters: &[Box<dyn SourceAdapter>],
    enricher: Option<&Enricher<S>>,
    now: i64,
) -> Run {
    let FetchReport { items, outcomes } = fetch_all(adapters).await;
    let raw_count = items.len();

    let mut seen = SeenKeys::new();
    let corpus = dedup(items, &mut seen);
    if corpus.is_empty() {
        warn!("Every source came back empty");
    }

    let mut daily = classify(&corpus, DAILY_RULES);
    let mut extra = classify(&corpus, EXTRA_RULES);

    if let Some(enricher) = enricher {
        enricher.enrich(&mut daily, &mut extra).await;
    }

    let snapshot = Snapshot {
        update_time: now,
        update_time_str: format_update_time(now),
        total_count: corpus.len(),
        daily,
        extra,
        meta: SnapshotMeta {
            ai_summary_enabled: enricher.is_some(),
            sources: source_names(&corpus),
        },
    };

    Run {
        snapshot,
        outcomes,
        raw_count,
    }
}

/// Distinct `source` values in `corpus`, sorted.
pub fn source_names(corpus: &[Item]) -> Vec<String> {
    corpus
        .iter()
        .map(|item| item.source.clone())
        .sorted()
        .dedup()
        .collect()
}

/// Log the per-source and per-bucket tallies of a run.
pub fn log_report(run: &Run) {
    for outcome in &run.outcomes {
        match outcome {
            SourceOutcome::Fulfilled { source, count } => {
                info!(%source, count, "Source fulfilled");
            }
            SourceOutcome::Rejected { source, reason } => {
                warn!(%source, %reason, "Source rejected");
            }
        }
    }
    for bucket in run.snapshot.daily.iter().chain(run.snapshot.extra.iter()) {
        info!(bucket = bucket.name, count = bucket.items.len(), "Bucket");
    }
    info!(
        raw = run.raw_count,
        total = run.snapshot.total_count,
        sources = run.snapshot.meta.sources.len(),
        "Run summary"
    );
}
