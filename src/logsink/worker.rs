// src/logsink/worker.rs

//! Single-consumer task behind the log sink.
//!
//! Owns the in-memory batch map exclusively; per-target batches preserve
//! the enqueue order of their records.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::interval;

use super::dest::LogDestination;
use super::{SinkConfig, SinkMessage, current_day};

pub(crate) struct SinkWorker {
    rx: mpsc::Receiver<SinkMessage>,
    dest: Arc<dyn LogDestination>,
    config: SinkConfig,
    /// Pending lines per destination file
    batches: HashMap<String, Vec<String>>,
    /// Day bucket the pending batches belong to
    day: String,
}

impl SinkWorker {
    pub(crate) fn new(
        rx: mpsc::Receiver<SinkMessage>,
        dest: Arc<dyn LogDestination>,
        config: SinkConfig,
        day: String,
    ) -> Self {
        Self {
            rx,
            dest,
            config,
            batches: HashMap::new(),
            day,
        }
    }

    pub(crate) async fn run(mut self) {
        let mut ticker = interval(self.config.flush_interval);
        // The first tick fires immediately; skip it so an empty sink does
        // not touch the destination right after start.
        ticker.tick().await;

        loop {
            tokio::select! {
                message = self.rx.recv() => {
                    match message {
                        Some(SinkMessage::Record(record)) => {
                            let target = record.target.clone();
                            self.batches
                                .entry(target.clone())
                                .or_default()
                                .push(record.format_line());

                            if self.batches[&target].len() >= self.config.batch_size {
                                self.flush_target(&target).await;
                            }
                        }
                        Some(SinkMessage::Shutdown) | None => {
                            self.drain().await;
                            return;
                        }
                    }
                }
                _ = ticker.tick() => {
                    self.rotate_if_needed().await;
                    self.flush_all().await;
                }
            }
        }
    }

    /// Consume everything already enqueued, then flush all batches.
    async fn drain(&mut self) {
        while let Ok(message) = self.rx.try_recv() {
            if let SinkMessage::Record(record) = message {
                self.batches
                    .entry(record.target.clone())
                    .or_default()
                    .push(record.format_line());
            }
        }
        self.flush_all().await;
    }

    async fn rotate_if_needed(&mut self) {
        let today = current_day();
        if today == self.day {
            return;
        }
        // Pending records belong to the day they were buffered under.
        self.flush_all().await;
        if let Err(e) = self.dest.prepare_day(&today).await {
            log::warn!("Log rotation to {today} failed: {e}");
            return;
        }
        self.day = today;
    }

    async fn flush_target(&mut self, target: &str) {
        if let Some(lines) = self.batches.remove(target) {
            if lines.is_empty() {
                return;
            }
            if let Err(e) = self.dest.append(&self.day, target, &lines).await {
                log::warn!("Flushing {} log records to {target} failed: {e}", lines.len());
            }
        }
    }

    async fn flush_all(&mut self) {
        let targets: Vec<String> = self.batches.keys().cloned().collect();
        for target in targets {
            self.flush_target(&target).await;
        }
    }
}
