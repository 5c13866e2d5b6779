//! Corpinfo: a resilient corporate-registry crawler
//!
//! This crate crawls a three-level administrative-region hierarchy and the
//! paginated corporate listings underneath it, routing every request through
//! a pool of ephemeral egress endpoints with rate limiting and retry.

pub mod client;
pub mod config;
pub mod crawler;
pub mod limiter;
pub mod pool;
pub mod storage;

use thiserror::Error;

/// Main error type for corpinfo operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Request to {url} failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        source: reqwest::Error,
    },

    #[error("Endpoint provisioning failed: {0}")]
    Provision(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Crawl interrupted")]
    Interrupted,
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
}

/// Result type alias for corpinfo operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use client::{FetchOutcome, RetryingClient};
pub use config::Config;
pub use limiter::RateLimiter;
pub use pool::{Endpoint, EndpointPool};
