//! Concurrent fetch across every registered adapter.
//!
//! All adapters start together and run interleaved on the current task. The
//! orchestrator waits until each one has settled, whether it produced items,
//! returned an error, or panicked. There is no early exit and no retry here;
//! each adapter is bounded only by its own per-request timeouts.

use crate::models::Item;
use crate::scrapers::{SourceAdapter, settle};
use futures::future::join_all;
use std::time::Instant;
use tracing::{info, instrument, warn};

/// How one adapter ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOutcome {
    Fulfilled { source: String, count: usize },
    Rejected { source: String, reason: String },
}

/// Everything collected from one round of fetching.
#[derive(Debug, Default)]
pub struct FetchReport {
    /// Items from every adapter that succeeded, in registration order.
    pub items: Vec<Item>,
    /// One entry per adapter, in registration order.
    pub outcomes: Vec<SourceOutcome>,
}

impl FetchReport {
    pub fn failed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, SourceOutcome::Rejected { .. }))
            .count()
    }
}

/// Run every adapter concurrently and collect whatever they produce.
#[instrument(level = "info", skip_all, fields(adapters = adapters.len()))]
pub async fn fetch_all(adapters: &[Box<dyn SourceAdapter>]) -> FetchReport {
    let t0 = Instant::now();
    let settled = join_all(adapters.iter().map(|a| settle(a.as_ref()))).await;

    let mut report = FetchReport::default();
    for (adapter, result) in adapters.iter().zip(settled) {
        let source = adapter.name().to_string();
        match result.failure {
            None => {
                report.outcomes.push(SourceOutcome::Fulfilled {
                    source,
                    count: result.items.len(),
                });
                report.items.extend(result.items);
            }
            Some(reason) => {
                warn!(%source, %reason, "Source contributed nothing this run");
                report.outcomes.push(SourceOutcome::Rejected { source, reason });
            }
        }
    }

    info!(
        items = report.items.len(),
        failed = report.failed_count(),
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "All sources settled"
    );
    report
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::Category;
    use crate::scrapers::ScrapeError;
    use async_trait::async_trait;
    use std::time::Duration;

    /// Test adapter with a scripted result and optional latency.
    pub(crate) struct Scripted {
        pub name: &'static str,
        pub result: Result<Vec<Item>, &'static str>,
        pub delay: Duration,
        pub panics: bool,
    }

    impl Scripted {
        pub fn ok(name: &'static str, items: Vec<Item>) -> Self {
            Self {
                name,
                result: Ok(items),
                delay: Duration::ZERO,
                panics: false,
            }
        }

        pub fn err(name: &'static str, reason: &'static str) -> Self {
            Self {
                name,
                result: Err(reason),
                delay: Duration::ZERO,
                panics: false,
            }
        }

        pub fn panicking(name: &'static str) -> Self {
            Self {
                name,
                result: Ok(Vec::new()),
                delay: Duration::ZERO,
                panics: true,
            }
        }

        pub fn delayed(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    #[async_trait]
    impl SourceAdapter for Scripted {
        fn name(&self) -> &str {
            self.name
        }

        async fn fetch_items(&self) -> Result<Vec<Item>, ScrapeError> {
            tokio::time::sleep(self.delay).await;
            if self.panics {
                panic!("{} blew up", self.name);
            }
            self.result
                .clone()
                .map_err(|r| ScrapeError::Parse(r.to_string()))
        }
    }

    pub(crate) fn item(id: &str, url: &str, source: &str) -> Item {
        Item::new(id, id, url, source, Category::Tech, 0)
    }

    #[tokio::test]
    async fn test_all_successful_items_are_concatenated_in_order() {
        let adapters: Vec<Box<dyn SourceAdapter>> = vec![
            Box::new(
                Scripted::ok("slow", vec![item("a", "", "A")]).delayed(Duration::from_millis(30)),
            ),
            Box::new(Scripted::ok("fast", vec![item("b", "", "B"), item("c", "", "B")])),
        ];
        let report = fetch_all(&adapters).await;
        let ids: Vec<&str> = report.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(report.failed_count(), 0);
    }

    #[tokio::test]
    async fn test_failures_are_isolated() {
        let adapters: Vec<Box<dyn SourceAdapter>> = vec![
            Box::new(Scripted::err("broken", "timeout")),
            Box::new(Scripted::panicking("crashy")),
            Box::new(Scripted::ok("fine", vec![item("x", "https://x", "Fine")])),
        ];
        let report = fetch_all(&adapters).await;
        assert_eq!(report.items.len(), 1);
        assert_eq!(report.failed_count(), 2);
        assert_eq!(
            report.outcomes[2],
            SourceOutcome::Fulfilled {
                source: "fine".to_string(),
                count: 1
            }
        );
        assert!(matches!(
            &report.outcomes[0],
            SourceOutcome::Rejected { source, reason } if source == "broken" && reason.contains("timeout")
        ));
    }

    #[tokio::test]
    async fn test_every_adapter_failing_yields_empty_report() {
        let adapters: Vec<Box<dyn SourceAdapter>> = vec![
            Box::new(Scripted::err("one", "dns")),
            Box::new(Scripted::panicking("two")),
        ];
        let report = fetch_all(&adapters).await;
        assert!(report.items.is_empty());
        assert_eq!(report.failed_count(), 2);
    }

    #[tokio::test]
    async fn test_no_adapters() {
        let report = fetch_all(&[]).await;
        assert!(report.items.is_empty());
        assert!(report.outcomes.is_empty());
    }
}
