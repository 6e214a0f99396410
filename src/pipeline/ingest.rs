// src/pipeline/ingest.rs

//! Bounded worker-pool scheduler.
//!
//! Distributes sources to a fixed pool of workers and aggregates the
//! outcomes: every dispatched source yields exactly one success or one
//! tagged failure, and the call returns only after all workers drain the
//! queue.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::models::Article;

/// One failed source with its underlying cause.
#[derive(Debug)]
pub struct FeedFailure {
    pub source: String,
    pub error: AppError,
}

impl fmt::Display for FeedFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fetch failed ({}): {}", self.source, self.error)
    }
}

/// Complete result set of one scheduling pass.
#[derive(Debug, Default)]
pub struct IngestOutcome {
    pub articles: Vec<Article>,
    pub failures: Vec<FeedFailure>,
}

impl IngestOutcome {
    /// Total outcomes collected; always equals the number of sources.
    pub fn len(&self) -> usize {
        self.articles.len() + self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process all sources with at most `concurrency` in flight.
///
/// Generic over the per-source operation so scheduling behavior is
/// testable in isolation. No ordering is guaranteed among outcomes.
pub async fn fetch_all<P, Fut>(
    sources: Vec<String>,
    concurrency: usize,
    process: P,
) -> IngestOutcome
where
    P: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Article>> + Send + 'static,
{
    let queue = Arc::new(Mutex::new(VecDeque::from(sources)));
    let outcome = Arc::new(Mutex::new(IngestOutcome::default()));
    let process = Arc::new(process);

    let workers: Vec<_> = (0..concurrency.max(1))
        .map(|_| {
            let queue = Arc::clone(&queue);
            let outcome = Arc::clone(&outcome);
            let process = Arc::clone(&process);

            tokio::spawn(async move {
                loop {
                    let Some(source) = queue.lock().await.pop_front() else {
                        break;
                    };

                    let result = (process.as_ref())(source.clone()).await;

                    let mut outcome = outcome.lock().await;
                    match result {
                        Ok(article) => outcome.articles.push(article),
                        Err(error) => outcome.failures.push(FeedFailure { source, error }),
                    }
                }
            })
        })
        .collect();

    // Barrier: no partial results are returned early.
    join_all(workers).await;

    match Arc::try_unwrap(outcome) {
        Ok(mutex) => mutex.into_inner(),
        // All workers have joined, so no clone can remain; kept total anyway.
        Err(arc) => std::mem::take(&mut *arc.lock().await),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn stub_article(source: &str) -> Article {
        Article {
            domain_name: format!("https://{source}"),
            name: source.to_string(),
            title: "t".to_string(),
            link: format!("https://{source}/latest"),
            date: "May 1, 2024".to_string(),
            avatar: "a".to_string(),
        }
    }

    fn sources(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("feed-{i}.example")).collect()
    }

    async fn run_scheduler(n: usize, k: usize) -> IngestOutcome {
        fetch_all(sources(n), k, |source: String| async move {
            tokio::time::sleep(Duration::from_millis(2)).await;
            // Odd-numbered sources fail.
            let index: usize = source
                .trim_start_matches("feed-")
                .trim_end_matches(".example")
                .parse()
                .unwrap();
            if index % 2 == 1 {
                Err(AppError::storage(format!("down: {source}")))
            } else {
                Ok(stub_article(&source))
            }
        })
        .await
    }

    #[tokio::test]
    async fn test_every_source_yields_exactly_one_outcome() {
        for k in [1, 4, 64] {
            let outcome = run_scheduler(25, k).await;
            assert_eq!(outcome.len(), 25, "k={k}");
            assert_eq!(outcome.articles.len(), 13, "k={k}");
            assert_eq!(outcome.failures.len(), 12, "k={k}");

            // No duplicates, no omissions.
            let mut seen: HashSet<String> = HashSet::new();
            for article in &outcome.articles {
                assert!(seen.insert(article.name.clone()));
            }
            for failure in &outcome.failures {
                assert!(seen.insert(failure.source.clone()));
            }
            assert_eq!(seen.len(), 25);
        }
    }

    #[tokio::test]
    async fn test_concurrency_limit_is_respected() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let outcome = {
            let in_flight = Arc::clone(&in_flight);
            let peak = Arc::clone(&peak);
            fetch_all(sources(30), 4, move |source: String| {
                let in_flight = Arc::clone(&in_flight);
                let peak = Arc::clone(&peak);
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    Ok(stub_article(&source))
                }
            })
            .await
        };

        assert_eq!(outcome.len(), 30);
        assert!(peak.load(Ordering::SeqCst) <= 4);
    }

    #[tokio::test]
    async fn test_empty_source_list() {
        let outcome = fetch_all(Vec::new(), 8, |source: String| async move {
            Ok(stub_article(&source))
        })
        .await;
        assert!(outcome.is_empty());
    }

    #[tokio::test]
    async fn test_zero_concurrency_is_clamped_to_one() {
        let outcome = run_scheduler(3, 0).await;
        assert_eq!(outcome.len(), 3);
    }

    #[tokio::test]
    async fn test_failure_display_includes_source_and_cause() {
        let failure = FeedFailure {
            source: "https://feed.example/rss".to_string(),
            error: AppError::storage("connection refused"),
        };
        let text = failure.to_string();
        assert!(text.contains("https://feed.example/rss"));
        assert!(text.contains("connection refused"));
    }
}
