// src/logsink/dest.rs

//! Durable log destinations.
//!
//! The sink writes through this trait; the shipped implementation appends
//! to local day-bucketed files. A remote version-controlled append API can
//! back the same trait.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};

/// A day-bucketed append-only log target.
#[async_trait]
pub trait LogDestination: Send + Sync {
    /// Ensure the bucket for the given day exists and is writable.
    async fn prepare_day(&self, day: &str) -> Result<()>;

    /// Append lines to one file within a day bucket.
    ///
    /// Lines sharing a `(day, target)` pair must land in call order.
    async fn append(&self, day: &str, target: &str, lines: &[String]) -> Result<()>;

    /// Remove buckets older than the retention window.
    async fn prune(&self, _retention_days: u32) -> Result<()> {
        Ok(())
    }
}

/// Local filesystem destination: `{dir}/{YYYY-MM-DD}/{target}`.
pub struct LocalLogDest {
    dir: PathBuf,
}

impl LocalLogDest {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn bucket_path(&self, day: &str) -> PathBuf {
        self.dir.join(day)
    }
}

#[async_trait]
impl LogDestination for LocalLogDest {
    async fn prepare_day(&self, day: &str) -> Result<()> {
        tokio::fs::create_dir_all(self.bucket_path(day)).await?;
        Ok(())
    }

    async fn append(&self, day: &str, target: &str, lines: &[String]) -> Result<()> {
        let path = self.bucket_path(day).join(target);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(&path)
            .await
            .map_err(|e| AppError::storage(format!("open {}: {e}", path.display())))?;

        let mut block = lines.join("\n");
        block.push('\n');
        file.write_all(block.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    async fn prune(&self, retention_days: u32) -> Result<()> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(AppError::Io(e)),
        };

        let threshold = Local::now().date_naive() - chrono::Days::new(u64::from(retention_days));

        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let Ok(day) = NaiveDate::parse_from_str(name, "%Y-%m-%d") else {
                continue;
            };
            if day < threshold {
                if let Err(e) = tokio::fs::remove_dir_all(entry.path()).await {
                    log::warn!("Removing stale log bucket {name} failed: {e}");
                }
            }
        }
        Ok(())
    }
}
