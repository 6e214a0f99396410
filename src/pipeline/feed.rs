// src/pipeline/feed.rs

//! Per-source feed processing.
//!
//! Turns one subscription URL into an enriched [`Article`] or a descriptive
//! error tagged with the source. Never mutates shared state.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::logsink::LogSink;
use crate::models::{Article, AvatarIndex, DEFAULT_AVATAR, display_name};
use crate::retry::{RetryPolicy, with_retry};
use crate::utils::text::sanitize_markup;
use crate::utils::time::format_date;
use crate::utils::url::normalize_domain;

/// Service that fetches and enriches a single feed.
pub struct FeedProcessor {
    client: reqwest::Client,
    avatars: Arc<AvatarIndex>,
    policy: RetryPolicy,
    sink: LogSink,
    cancel: CancellationToken,
}

impl FeedProcessor {
    /// Create a new processor with the run's shared HTTP client.
    pub fn new(
        config: &Config,
        avatars: Arc<AvatarIndex>,
        sink: LogSink,
        cancel: CancellationToken,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("feedring/", env!("CARGO_PKG_VERSION")))
            .timeout(config.http_timeout)
            .build()?;

        Ok(Self {
            client,
            avatars,
            policy: RetryPolicy {
                max_attempts: config.max_retries,
                base_interval: config.retry_interval,
                backoff: config.backoff,
            },
            sink,
            cancel,
        })
    }

    /// Process one source into an article.
    pub async fn process(&self, url: &str) -> Result<Article> {
        // Fetch and sanitize are one retried unit; a non-success status
        // fails the attempt like any transport error.
        let body = with_retry(&self.policy, &self.cancel, &self.sink, url, || {
            self.fetch_sanitized(url)
        })
        .await?;

        let feed = with_retry(&self.policy, &self.cancel, &self.sink, url, || {
            let body = body.clone();
            async move {
                feed_rs::parser::parse(body.as_bytes()).map_err(|e| AppError::parse(url, e))
            }
        })
        .await?;

        if feed.entries.is_empty() {
            return Err(AppError::EmptyFeed {
                url: url.to_string(),
            });
        }

        // The feed's first-listed item is treated as latest; the source's
        // own ordering is mirrored, not re-sorted.
        let entry = &feed.entries[0];

        let published = entry
            .published
            .or(entry.updated)
            .ok_or_else(|| AppError::TimeParse {
                url: url.to_string(),
            })?;

        let canonical = feed
            .links
            .first()
            .map(|l| l.href.clone())
            .unwrap_or_default();
        let domain = match normalize_domain(&canonical) {
            Ok(domain) => domain,
            Err(e) => {
                self.sink
                    .warn(format!("Domain normalization failed for {url}: {e}"))
                    .await;
                "unknown".to_string()
            }
        };

        let avatar = self
            .avatars
            .lookup(&domain)
            .unwrap_or(DEFAULT_AVATAR)
            .to_string();

        let raw_title = feed
            .title
            .as_ref()
            .map(|t| t.content.clone())
            .unwrap_or_default();

        Ok(Article {
            domain_name: domain,
            name: display_name(&raw_title).to_string(),
            title: entry
                .title
                .as_ref()
                .map(|t| t.content.clone())
                .unwrap_or_default(),
            link: entry
                .links
                .first()
                .map(|l| l.href.clone())
                .unwrap_or_default(),
            date: format_date(published),
            avatar,
        })
    }

    async fn fetch_sanitized(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let text = response.text().await?;
        Ok(sanitize_markup(&text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logsink::{LogSink, SinkConfig, dest::LocalLogDest};
    use crate::models::AvatarEntry;
    use crate::retry::Backoff;
    use std::path::PathBuf;
    use std::time::Duration;
    use tempfile::TempDir;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const VALID_RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
    <title>Example Blog</title>
    <link>https://blog.example.com</link>
    <item>
        <title>Latest Post</title>
        <link>https://blog.example.com/latest</link>
        <pubDate>Wed, 01 May 2024 00:00:00 GMT</pubDate>
    </item>
    <item>
        <title>Older Post</title>
        <link>https://blog.example.com/older</link>
        <pubDate>Mon, 01 Apr 2024 00:00:00 GMT</pubDate>
    </item>
</channel></rss>"#;

    const EMPTY_RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
    <title>Quiet Blog</title>
    <link>https://quiet.example.com</link>
</channel></rss>"#;

    const DATELESS_RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
    <title>No Dates</title>
    <link>https://nodates.example.com</link>
    <item><title>Undated</title><link>https://nodates.example.com/p</link></item>
</channel></rss>"#;

    fn test_config() -> Config {
        Config {
            access_key_id: "id".into(),
            secret_access_key: "secret".into(),
            bucket: "bucket".into(),
            max_retries: 2,
            retry_interval: Duration::from_millis(10),
            backoff: Backoff::Fixed,
            max_concurrency: 2,
            http_timeout: Duration::from_secs(5),
            run_deadline: Duration::from_secs(60),
            log_level: crate::logsink::LogLevel::Info,
            log_dir: PathBuf::from("logs"),
            log_retention_days: 7,
            subscriptions_key: "data/subscriptions.txt".into(),
            avatars_key: "data/avatars.json".into(),
            output_key: "data/feed.json".into(),
        }
    }

    async fn test_processor(avatars: Vec<AvatarEntry>) -> (FeedProcessor, TempDir) {
        let tmp = TempDir::new().unwrap();
        let dest = Arc::new(LocalLogDest::new(tmp.path()));
        let (sink, _controller) = LogSink::start(dest, SinkConfig::default()).await.unwrap();
        let processor = FeedProcessor::new(
            &test_config(),
            Arc::new(AvatarIndex::from_entries(avatars)),
            sink,
            CancellationToken::new(),
        )
        .unwrap();
        (processor, tmp)
    }

    #[tokio::test]
    async fn test_process_success_with_known_avatar() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(VALID_RSS))
            .mount(&server)
            .await;

        let (processor, _tmp) = test_processor(vec![AvatarEntry {
            domain_name: "https://blog.example.com".into(),
            name: "Example".into(),
            avatar: "https://img.example.com/blog.png".into(),
        }])
        .await;

        let article = processor.process(&format!("{}/feed", server.uri())).await.unwrap();
        assert_eq!(article.domain_name, "https://blog.example.com");
        assert_eq!(article.title, "Latest Post");
        assert_eq!(article.link, "https://blog.example.com/latest");
        assert_eq!(article.date, "May 1, 2024");
        assert_eq!(article.avatar, "https://img.example.com/blog.png");
    }

    #[tokio::test]
    async fn test_process_falls_back_to_default_avatar() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(VALID_RSS))
            .mount(&server)
            .await;

        let (processor, _tmp) = test_processor(Vec::new()).await;
        let article = processor.process(&format!("{}/feed", server.uri())).await.unwrap();
        assert_eq!(article.avatar, DEFAULT_AVATAR);
    }

    #[tokio::test]
    async fn test_empty_feed_is_terminal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(EMPTY_RSS))
            .mount(&server)
            .await;

        let (processor, _tmp) = test_processor(Vec::new()).await;
        let err = processor
            .process(&format!("{}/feed", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::EmptyFeed { .. }));
    }

    #[tokio::test]
    async fn test_missing_publish_time_is_terminal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(DATELESS_RSS))
            .mount(&server)
            .await;

        let (processor, _tmp) = test_processor(Vec::new()).await;
        let err = processor
            .process(&format!("{}/feed", server.uri()))
            .await
            .unwrap_err();
        assert!(err.is_time_parse());
    }

    #[tokio::test]
    async fn test_non_success_status_exhausts_retries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(2) // max_retries attempts, then exhaustion
            .mount(&server)
            .await;

        let (processor, _tmp) = test_processor(Vec::new()).await;
        let err = processor
            .process(&format!("{}/feed", server.uri()))
            .await
            .unwrap_err();
        match err {
            AppError::RetriesExhausted { attempts, source } => {
                assert_eq!(attempts, 2);
                assert!(matches!(*source, AppError::Status { status: 404, .. }));
            }
            e => panic!("expected RetriesExhausted, got {e:?}"),
        }
    }

    #[tokio::test]
    async fn test_control_characters_are_stripped_before_parse() {
        let dirty = VALID_RSS.replace("Latest Post", "Latest\u{0} Post");
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(dirty))
            .mount(&server)
            .await;

        let (processor, _tmp) = test_processor(Vec::new()).await;
        let article = processor.process(&format!("{}/feed", server.uri())).await.unwrap();
        assert_eq!(article.title, "Latest Post");
    }
}
