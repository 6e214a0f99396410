// src/config.rs

//! Environment-driven configuration.
//!
//! All knobs come from the environment; required values are validated before
//! the pipeline starts and a missing one is a fatal startup error.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{AppError, Result};
use crate::logsink::LogLevel;
use crate::retry::Backoff;

/// Runtime configuration for one aggregator process.
#[derive(Debug, Clone)]
pub struct Config {
    /// Object store credential pair (also consumed by the SDK chain)
    pub access_key_id: String,
    pub secret_access_key: String,

    /// Target bucket
    pub bucket: String,

    /// Maximum attempts per retried operation
    pub max_retries: u32,

    /// Base wait between retry attempts
    pub retry_interval: Duration,

    /// Backoff policy between attempts
    pub backoff: Backoff,

    /// Worker pool size for the ingestion scheduler
    pub max_concurrency: usize,

    /// Per-request HTTP timeout
    pub http_timeout: Duration,

    /// Deadline for the whole ingest+publish run
    pub run_deadline: Duration,

    /// Minimum severity accepted by the log sink
    pub log_level: LogLevel,

    /// Root directory for day-bucketed log files
    pub log_dir: PathBuf,

    /// Day buckets older than this are pruned at startup
    pub log_retention_days: u32,

    /// Object key of the newline-separated subscription list
    pub subscriptions_key: String,

    /// Object key of the avatar reference data (JSON array)
    pub avatars_key: String,

    /// Object key the published collection is written to
    pub output_key: String,
}

impl Config {
    /// Read configuration from the environment.
    ///
    /// Missing required variables fail immediately; optional values fall
    /// back to their defaults when absent or unparseable.
    pub fn from_env() -> Result<Self> {
        let config = Self {
            access_key_id: require("AWS_ACCESS_KEY_ID")?,
            secret_access_key: require("AWS_SECRET_ACCESS_KEY")?,
            bucket: require("FEEDRING_BUCKET")?,
            max_retries: env_parse("FEEDRING_MAX_RETRIES", 3),
            retry_interval: Duration::from_secs(env_parse("FEEDRING_RETRY_INTERVAL_SECS", 10)),
            backoff: parse_backoff(&env_string("FEEDRING_RETRY_BACKOFF", "exponential")),
            max_concurrency: env_parse("FEEDRING_MAX_CONCURRENCY", 10),
            http_timeout: Duration::from_secs(env_parse("FEEDRING_HTTP_TIMEOUT_SECS", 15)),
            run_deadline: Duration::from_secs(env_parse("FEEDRING_RUN_DEADLINE_SECS", 180)),
            log_level: LogLevel::parse(&env_string("FEEDRING_LOG_LEVEL", "info")),
            log_dir: PathBuf::from(env_string("FEEDRING_LOG_DIR", "logs")),
            log_retention_days: env_parse("FEEDRING_LOG_RETENTION_DAYS", 7),
            subscriptions_key: env_string("FEEDRING_SUBSCRIPTIONS_KEY", "data/subscriptions.txt"),
            avatars_key: env_string("FEEDRING_AVATARS_KEY", "data/avatars.json"),
            output_key: env_string("FEEDRING_OUTPUT_KEY", "data/feed.json"),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.max_retries == 0 {
            return Err(AppError::config("FEEDRING_MAX_RETRIES must be >= 1"));
        }
        if self.retry_interval.is_zero() {
            return Err(AppError::config("FEEDRING_RETRY_INTERVAL_SECS must be > 0"));
        }
        if self.max_concurrency == 0 {
            return Err(AppError::config("FEEDRING_MAX_CONCURRENCY must be >= 1"));
        }
        if self.http_timeout.is_zero() {
            return Err(AppError::config("FEEDRING_HTTP_TIMEOUT_SECS must be > 0"));
        }
        if self.run_deadline.is_zero() {
            return Err(AppError::config("FEEDRING_RUN_DEADLINE_SECS must be > 0"));
        }
        Ok(())
    }
}

fn require(key: &str) -> Result<String> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(AppError::config(format!(
            "environment variable {key} must be set"
        ))),
    }
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_backoff(value: &str) -> Backoff {
    match value.to_lowercase().as_str() {
        "fixed" => Backoff::Fixed,
        _ => Backoff::Exponential,
    }
}
