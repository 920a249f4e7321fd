//! # AI Dev Daily
//!
//! A daily digest collector for developers following AI. One run pulls items
//! from a fixed set of public sources, merges and deduplicates them, sorts
//! them into named sections, optionally asks an LLM for one-line summaries of
//! the top items, and writes the whole result as a single JSON snapshot for a
//! static page to render.
//!
//! ## Sources
//!
//! GitHub Trending (all languages and Python), Hacker News, arXiv (cs.AI,
//! cs.CL, cs.LG), Dev.to, 机器之心, 36氪, InfoQ, Hugging Face and Product Hunt.
//!
//! ## Usage
//!
//! ```sh
//! ai_dev_daily -d ./data
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Fetching**: Every source adapter runs concurrently; failures are isolated
//! 2. **Deduplication**: First-seen-wins by url, falling back to id
//! 3. **Classification**: A fixed table of bucket rules cuts the corpus into sections
//! 4. **Enrichment**: Optional AI summaries, one call at a time
//! 5. **Output**: Atomic write of `latest.json`

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod classify;
mod cli;
mod dedup;
mod enrich;
mod fetch;
mod heuristics;
mod models;
mod outputs;
mod pipeline;
mod scrapers;
mod utils;

use cli::Cli;
use enrich::Enricher;
use outputs::snapshot::write_snapshot;
use utils::{ensure_writable_dir, now_millis};

#[tokio::main(flavor = "current_thread")]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("ai_dev_daily starting up");

    let args = Cli::parse();
    debug!(data_dir = %args.data_dir, dry_run = args.dry_run, "Parsed CLI arguments");

    // Early check: the data dir must be writable before any fetching.
    if !args.dry_run {
        if let Err(e) = ensure_writable_dir(&args.data_dir).await {
            error!(
                path = %args.data_dir,
                error = %e,
                "Data directory is not writable (fix perms or choose a different path)"
            );
            return Err(e);
        }
    }

    let client = scrapers::http_client()?;
    let adapters = scrapers::registered_adapters(&client);
    info!(count = adapters.len(), "Registered source adapters");

    let enricher = if args.dry_run {
        None
    } else {
        Enricher::from_config(&args.ai_summary_config())
    };

    let run = pipeline::run(&adapters, enricher.as_ref(), now_millis()).await;
    pipeline::log_report(&run);

    if args.dry_run {
        info!(
            elapsed_secs = start_time.elapsed().as_secs_f64(),
            "Dry run complete; snapshot not written"
        );
        return Ok(());
    }

    match write_snapshot(&run.snapshot, std::path::Path::new(&args.data_dir)).await {
        Ok(path) => info!(path = %path.display(), total = run.snapshot.total_count, "Snapshot published"),
        Err(e) => {
            error!(error = %e, "Failed to write snapshot");
            return Err(e);
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        elapsed_secs = elapsed.as_secs_f64(),
        elapsed_mins = elapsed.as_secs_f64() / 60.0,
        "ai_dev_daily completed successfully"
    );

    Ok(())
}
