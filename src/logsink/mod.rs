// src/logsink/mod.rs

//! Asynchronous, batched, day-rotating run log.
//!
//! Log calls enqueue onto a bounded channel and return; a single consumer
//! task batches records per destination file and flushes them either when a
//! batch fills or on a periodic tick. Closing the sink drains every record
//! accepted before shutdown began.

pub mod dest;
mod worker;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{AppError, Result};
use dest::LogDestination;
use worker::SinkWorker;

/// Default destination file for run-progress records.
pub const RUN_TARGET: &str = "run.log";

/// Destination file for retry warnings.
pub const RETRY_TARGET: &str = "retries.log";

/// Log severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "debug" => LogLevel::Debug,
            "info" => LogLevel::Info,
            "warn" => LogLevel::Warn,
            "error" => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }
}

/// One log record; exists only until written.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub timestamp: DateTime<Local>,
    pub level: LogLevel,
    pub message: String,
    /// Destination file within the day bucket
    pub target: String,
}

impl LogRecord {
    /// Render as the on-disk line format.
    pub fn format_line(&self) -> String {
        format!(
            "[{}] [{}] {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.level.as_str(),
            self.message
        )
    }
}

pub(crate) enum SinkMessage {
    Record(LogRecord),
    Shutdown,
}

/// Tuning knobs for the sink.
#[derive(Debug, Clone)]
pub struct SinkConfig {
    /// Records below this level are discarded before enqueueing
    pub min_level: LogLevel,

    /// Bounded queue capacity; producers wait when it is full
    pub queue_capacity: usize,

    /// A target's batch flushes once it holds this many records
    pub batch_size: usize,

    /// All pending batches flush on this interval
    pub flush_interval: Duration,

    /// Day buckets older than this are pruned at startup
    pub retention_days: u32,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
            queue_capacity: 2048,
            batch_size: 50,
            flush_interval: Duration::from_secs(3),
            retention_days: 7,
        }
    }
}

/// Cheap-clone producer handle.
///
/// A log call never blocks beyond enqueueing: when the queue has capacity it
/// returns immediately, and when the queue is full the producer waits for a
/// slot rather than dropping the record.
#[derive(Clone)]
pub struct LogSink {
    tx: mpsc::Sender<SinkMessage>,
    min_level: LogLevel,
}

impl LogSink {
    /// Start the sink: prepare the current day bucket, prune old buckets,
    /// and spawn the single consumer task.
    pub async fn start(
        dest: Arc<dyn LogDestination>,
        config: SinkConfig,
    ) -> Result<(LogSink, SinkController)> {
        let today = current_day();
        dest.prepare_day(&today).await?;
        if let Err(e) = dest.prune(config.retention_days).await {
            log::warn!("Pruning old log buckets failed: {e}");
        }

        let (tx, rx) = mpsc::channel(config.queue_capacity);
        let worker = SinkWorker::new(rx, dest, config.clone(), today);
        let handle = tokio::spawn(worker.run());

        let controller = SinkController {
            tx: tx.clone(),
            handle,
        };
        let sink = LogSink {
            tx,
            min_level: config.min_level,
        };
        Ok((sink, controller))
    }

    /// Enqueue a record for the default run target.
    pub async fn log(&self, level: LogLevel, message: impl Into<String>) {
        self.log_to(RUN_TARGET, level, message).await;
    }

    /// Enqueue a record for an explicit destination file.
    pub async fn log_to(&self, target: &str, level: LogLevel, message: impl Into<String>) {
        if level < self.min_level {
            return;
        }
        let record = LogRecord {
            timestamp: Local::now(),
            level,
            message: message.into(),
            target: target.to_string(),
        };
        // The only failure mode is a closed channel (sink already shut
        // down); late records are discarded rather than panicking.
        let _ = self.tx.send(SinkMessage::Record(record)).await;
    }

    pub async fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message).await;
    }

    pub async fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message).await;
    }

    pub async fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message).await;
    }

    pub async fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message).await;
    }
}

/// Owns the consumer task; closing it drains the queue.
pub struct SinkController {
    tx: mpsc::Sender<SinkMessage>,
    handle: JoinHandle<()>,
}

impl SinkController {
    /// Signal end-of-stream and wait for the consumer to drain and flush
    /// every buffered record.
    ///
    /// Records enqueued before this call are durably written when `close`
    /// returns `Ok`. If draining exceeds `timeout` the consumer is left
    /// running detached and a drain-timeout error is returned.
    pub async fn close(self, timeout: Duration) -> Result<()> {
        let Self { tx, handle } = self;

        let shutdown = async move {
            let _ = tx.send(SinkMessage::Shutdown).await;
            let _ = handle.await;
        };

        tokio::time::timeout(timeout, shutdown)
            .await
            .map_err(|_| AppError::storage("log sink drain exceeded its timeout ceiling"))
    }
}

pub(crate) fn current_day() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}
