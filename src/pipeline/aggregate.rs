// src/pipeline/aggregate.rs

//! Final aggregation and publish.
//!
//! Merges the scheduler's outcomes into the publishable collection, pushes
//! it to the object store, and fills in the run statistics. A failed
//! publish degrades the run but never invalidates the statistics.

use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::logsink::LogSink;
use crate::models::{Article, RunSummary, sentinel};
use crate::pipeline::ingest::IngestOutcome;
use crate::retry::{RetryPolicy, with_retry};
use crate::storage::ObjectStore;
use crate::utils::time::parse_display_date;

/// Marker distinguishing the fallback avatar from reference-data hits.
const DEFAULT_AVATAR_MARKER: &str = "default.png";

/// Sort newest-first by the formatted publish date.
///
/// Entries whose date fails to re-parse are treated as minimally old and
/// sort last.
pub fn sort_by_date_desc(articles: &mut [Article]) {
    articles.sort_by(|a, b| parse_display_date(&b.date).cmp(&parse_display_date(&a.date)));
}

/// Serialize the collection and write it through a retried publish.
pub async fn publish(
    store: &dyn ObjectStore,
    key: &str,
    articles: &[Article],
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    sink: &LogSink,
) -> Result<()> {
    let bytes = serde_json::to_vec(articles)?;

    with_retry(policy, cancel, sink, "publish", || {
        let bytes = bytes.clone();
        async move { store.put(key, bytes, "application/json").await }
    })
    .await?;

    sink.info(format!(
        "Published {} entries ({} bytes) to {key}",
        articles.len(),
        bytes.len()
    ))
    .await;
    Ok(())
}

/// Merge outcomes, publish, and finalize the run statistics.
pub async fn aggregate_run(
    outcome: IngestOutcome,
    mut summary: RunSummary,
    store: &dyn ObjectStore,
    output_key: &str,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    sink: &LogSink,
) -> RunSummary {
    let IngestOutcome { articles, failures } = outcome;

    summary.success = articles.len();
    summary.failure = failures.len();
    summary.time_parse_failures = failures.iter().filter(|f| f.error.is_time_parse()).count();

    let (missing, defaulted) = avatar_stats(&articles);
    summary.missing_avatar = missing;
    summary.default_avatar = defaulted;
    summary.failures = failures.iter().map(ToString::to_string).collect();

    let mut collection = articles;
    collection.push(sentinel());
    sort_by_date_desc(&mut collection);

    if let Err(e) = publish(store, output_key, &collection, policy, cancel, sink).await {
        // Degraded completion: statistics above stay valid.
        sink.error(format!("Publish failed: {e}")).await;
    }

    summary.finalize();
    summary
}

fn avatar_stats(articles: &[Article]) -> (usize, usize) {
    let missing = articles.iter().filter(|a| a.avatar.is_empty()).count();
    let defaulted = articles
        .iter()
        .filter(|a| a.avatar.contains(DEFAULT_AVATAR_MARKER))
        .count();
    (missing, defaulted)
}
