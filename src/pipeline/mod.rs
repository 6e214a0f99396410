// src/pipeline/mod.rs

//! Pipeline entry point and stages.
//!
//! - `feed`: fetch, sanitize, parse, extract, enrich one source
//! - `ingest`: bounded worker-pool scheduling
//! - `aggregate`: sentinel, sort, publish, run statistics

pub mod aggregate;
pub mod feed;
pub mod ingest;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

pub use feed::FeedProcessor;
pub use ingest::{FeedFailure, IngestOutcome, fetch_all};

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::logsink::LogSink;
use crate::models::{AvatarEntry, AvatarIndex, RunSummary};
use crate::retry::RetryPolicy;
use crate::storage::ObjectStore;

/// Execute one full ingest-and-publish run.
///
/// A single run-scoped deadline governs everything: when it expires, every
/// in-flight retry wait aborts promptly and the affected sources surface as
/// ordinary failures. The summary is emitted through the sink before
/// returning, whether the run completed, degraded, or aborted.
pub async fn run_pipeline(
    config: &Config,
    store: Arc<dyn ObjectStore>,
    sink: &LogSink,
) -> Result<RunSummary> {
    let mut summary = RunSummary::begin();

    let cancel = CancellationToken::new();
    let deadline_guard = {
        let cancel = cancel.clone();
        let deadline = config.run_deadline;
        tokio::spawn(async move {
            tokio::time::sleep(deadline).await;
            cancel.cancel();
        })
    };

    sink.info("Run starting.").await;

    let outcome =
        match load_and_ingest(config, store.as_ref(), sink, &cancel, &mut summary).await {
            Ok(outcome) => outcome,
            Err(e) => {
                deadline_guard.abort();
                sink.error(format!("Run failed: {e}")).await;
                summary.finalize();
                report(&summary, sink).await;
                return Err(e);
            }
        };

    let policy = RetryPolicy {
        max_attempts: config.max_retries,
        base_interval: config.retry_interval,
        backoff: config.backoff,
    };
    let summary = aggregate::aggregate_run(
        outcome,
        summary,
        store.as_ref(),
        &config.output_key,
        &policy,
        &cancel,
        sink,
    )
    .await;

    deadline_guard.abort();
    report(&summary, sink).await;
    Ok(summary)
}

/// Load reference data and schedule every source through the worker pool.
async fn load_and_ingest(
    config: &Config,
    store: &dyn ObjectStore,
    sink: &LogSink,
    cancel: &CancellationToken,
    summary: &mut RunSummary,
) -> Result<IngestOutcome> {
    let avatars = load_avatars(store, &config.avatars_key).await?;
    sink.info(format!("Loaded {} avatar entries.", avatars.len()))
        .await;

    let sources = load_sources(store, &config.subscriptions_key).await?;
    summary.total = sources.len();
    sink.info(format!("Loaded {} subscriptions.", sources.len()))
        .await;

    let processor = Arc::new(FeedProcessor::new(
        config,
        Arc::new(avatars),
        sink.clone(),
        cancel.clone(),
    )?);

    Ok(fetch_all(sources, config.max_concurrency, {
        let processor = Arc::clone(&processor);
        move |source: String| {
            let processor = Arc::clone(&processor);
            async move { processor.process(&source).await }
        }
    })
    .await)
}

async fn report(summary: &RunSummary, sink: &LogSink) {
    for line in summary.report_lines() {
        sink.info(line).await;
    }
}

/// Load and split the subscription list: one URL per line, trimmed, blank
/// lines dropped.
async fn load_sources(store: &dyn ObjectStore, key: &str) -> Result<Vec<String>> {
    let bytes = store.get(key).await?;
    let text = String::from_utf8(bytes)
        .map_err(|e| AppError::storage(format!("subscription list {key} is not UTF-8: {e}")))?;

    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Load the avatar reference data into its read-only index.
async fn load_avatars(store: &dyn ObjectStore, key: &str) -> Result<AvatarIndex> {
    let bytes = store.get(key).await?;
    let entries: Vec<AvatarEntry> = serde_json::from_slice(&bytes)?;
    Ok(AvatarIndex::from_entries(entries))
}
