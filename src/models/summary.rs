// src/models/summary.rs

//! Run statistics reported at the end of every run.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Aggregate counters for one full run.
///
/// Built incrementally while the run progresses and finalized exactly once;
/// `success + failure` always equals the number of dispatched sources.
#[derive(Debug, Default, Clone)]
pub struct RunSummary {
    /// Total sources dispatched
    pub total: usize,

    /// Sources that yielded an article
    pub success: usize,

    /// Sources that failed
    pub failure: usize,

    /// Failure subset: sources with an unresolvable publish time
    pub time_parse_failures: usize,

    /// Articles with an empty avatar value
    pub missing_avatar: usize,

    /// Articles that fell back to the default avatar
    pub default_avatar: usize,

    /// Human-readable failure descriptions, one per failed source
    pub failures: Vec<String>,

    /// Wall-clock start of the run
    pub started_at: Option<DateTime<Utc>>,

    /// Elapsed wall-clock duration, set on finalize
    pub elapsed: Duration,
}

impl RunSummary {
    /// Start a new summary stamped with the current time.
    pub fn begin() -> Self {
        Self {
            started_at: Some(Utc::now()),
            ..Self::default()
        }
    }

    /// Fix the elapsed duration. Call once, at the end of the run.
    pub fn finalize(&mut self) {
        if let Some(started) = self.started_at {
            let elapsed = Utc::now().signed_duration_since(started);
            self.elapsed = elapsed.to_std().unwrap_or(Duration::ZERO);
        }
    }

    /// Render the summary as the log lines emitted at the end of a run.
    pub fn report_lines(&self) -> Vec<String> {
        let mut lines = vec![
            "Run complete.".to_string(),
            format!("Sources processed: {}", self.total),
            format!(
                "Succeeded: {}, failed: {} (unparseable publish time: {})",
                self.success, self.failure, self.time_parse_failures
            ),
            format!(
                "Missing avatar: {}, default avatar: {}",
                self.missing_avatar, self.default_avatar
            ),
        ];

        if !self.failures.is_empty() {
            lines.push("Failure detail:".to_string());
            for failure in &self.failures {
                lines.push(format!(" - {failure}"));
            }
        }

        lines.push(format!("Elapsed: {:.2?}", self.elapsed));
        lines
    }
}
