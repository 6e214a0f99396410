// src/retry.rs

//! Bounded retry with configurable backoff.
//!
//! Every network operation in the pipeline runs through [`with_retry`]; the
//! backoff wait races the run-scoped cancellation token so an expired
//! deadline aborts promptly instead of sleeping out the schedule.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::{AppError, Result};
use crate::logsink::{LogLevel, LogSink, RETRY_TARGET};

/// Wait strategy between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Same base interval before every attempt
    Fixed,
    /// Base interval doubling after each failed attempt, uncapped
    Exponential,
}

/// Retry parameters shared by all retried operations in a run.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first (>= 1)
    pub max_attempts: u32,

    /// Base wait between attempts (> 0)
    pub base_interval: Duration,

    pub backoff: Backoff,
}

impl RetryPolicy {
    /// Wait before attempt `failed + 1`, given `failed` failures so far.
    fn delay(&self, failed: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.base_interval,
            Backoff::Exponential => self.base_interval * 2u32.saturating_pow(failed - 1),
        }
    }
}

/// Run `op` up to `policy.max_attempts` times.
///
/// Returns the first success. Each failure before the last attempt emits a
/// WARN record and waits out the backoff delay, unless the cancellation
/// token fires first, in which case `AppError::Cancelled` is returned
/// immediately. An op failure that is itself a cancellation is never
/// retried. The final failure is wrapped in `AppError::RetriesExhausted`.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    sink: &LogSink,
    label: &str,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last_err = AppError::Cancelled;

    for attempt in 1..=policy.max_attempts {
        if cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }

        match op().await {
            Ok(value) => return Ok(value),
            Err(AppError::Cancelled) => return Err(AppError::Cancelled),
            Err(e) => {
                sink.log_to(
                    RETRY_TARGET,
                    LogLevel::Warn,
                    format!("retry {attempt}/{} for {label}: {e}", policy.max_attempts),
                )
                .await;
                last_err = e;
            }
        }

        if attempt < policy.max_attempts {
            tokio::select! {
                _ = tokio::time::sleep(policy.delay(attempt)) => {}
                _ = cancel.cancelled() => return Err(AppError::Cancelled),
            }
        }
    }

    Err(AppError::RetriesExhausted {
        attempts: policy.max_attempts,
        source: Box::new(last_err),
    })
}
