//! Market-Mirror: a resource-bounded marketplace catalogue crawler
//!
//! This crate mirrors a third-party marketplace's sellers, items and reviews
//! into a key-value index. It fetches pages from several candidate hosts with
//! failover, reads bodies under byte and time budgets, carves seller regions
//! out of raw HTML, and folds raw records into deduplicated aggregates.

pub mod aggregate;
pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod scoreboard;
pub mod storage;

use thiserror::Error;

/// Main error type for Market-Mirror operations
#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Request timeout for {url} after {elapsed_ms}ms")]
    Timeout { url: String, elapsed_ms: u64 },

    #[error("Stream error for {url}: {source}")]
    Stream {
        url: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Invalid JSON from {url}: {source}")]
    Decode {
        url: String,
        source: serde_json::Error,
    },

    #[error("No hosts succeeded for {path}")]
    NoHostsSucceeded { path: String },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MirrorError {
    /// Returns the HTTP status carried by this error, if any
    ///
    /// Network failures, timeouts and stream errors carry no status.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http { source, .. } | Self::Reqwest(source) => {
                source.status().map(|s| s.as_u16())
            }
            _ => None,
        }
    }

    /// True if this error is the wall-clock timeout marker
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid pattern in config: {0}")]
    InvalidPattern(String),
}

/// Result type alias for Market-Mirror operations
pub type Result<T> = std::result::Result<T, MirrorError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use aggregate::{build_item_image_lookup, build_market_sellers, SellerAggregate};
pub use config::Config;
pub use crawler::{ItemCrawler, UpstreamClient};
pub use scoreboard::ScoreBoard;
pub use storage::BlobStore;
