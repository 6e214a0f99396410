// src/error.rs

//! Unified error handling for the aggregator.

use thiserror::Error;

/// Result type alias for aggregator operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error (missing or invalid environment values)
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status from a feed endpoint
    #[error("Unexpected status {status} from {url}")]
    Status { url: String, status: u16 },

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Object store operation failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Feed content could not be parsed
    #[error("Parse error for {url}: {message}")]
    Parse { url: String, message: String },

    /// Feed parsed but contained no items
    #[error("No items in feed: {url}")]
    EmptyFeed { url: String },

    /// Neither the published nor the updated timestamp could be resolved
    #[error("Unresolvable publish time for {url}")]
    TimeParse { url: String },

    /// The run deadline expired or shutdown was requested
    #[error("Operation cancelled")]
    Cancelled,

    /// All retry attempts were used up
    #[error("Exceeded {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<AppError>,
    },
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Create a parse error tagged with the originating feed URL.
    pub fn parse(url: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Parse {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Whether this error was caused by cancellation (directly or wrapped).
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled => true,
            Self::RetriesExhausted { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }

    /// Whether this error is the unresolvable-publish-time failure.
    pub fn is_time_parse(&self) -> bool {
        match self {
            Self::TimeParse { .. } => true,
            Self::RetriesExhausted { source, .. } => source.is_time_parse(),
            _ => false,
        }
    }
}
