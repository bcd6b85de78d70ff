//! Sitemap Harvester: resolves a site's sitemap hierarchy into article records
//!
//! This crate walks sitemap index files down to their leaf sitemaps, streams the
//! deduplicated article URLs they list, and runs each URL through a pluggable
//! extractor that produces a structured [`Article`] record.

pub mod article;
pub mod config;
pub mod extract;
pub mod fetcher;
pub mod output;
pub mod pipeline;
pub mod resolver;
pub mod shutdown;
pub mod sitemap;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for harvesting operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid root sitemap URL: {0}")]
    InvalidRoot(#[from] UrlError),

    #[error("Failed to fetch root sitemap {url}: {source}")]
    RootFetch {
        url: String,
        source: fetcher::FetchError,
    },

    #[error("Failed to decode root sitemap {url}: {source}")]
    RootDecode {
        url: String,
        source: sitemap::DecodeError,
    },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Sink error: {0}")]
    Sink(#[from] output::SinkError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Extraction worker pool closed unexpectedly")]
    PoolClosed,
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

/// URL-specific errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL: {0}")]
    MissingHost(String),
}

/// Result type alias for harvesting operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use article::{Article, ArticleContent, ArticleStatus};
pub use config::Config;
pub use extract::{Extractor, ExtractionError, HtmlMetaExtractor};
pub use pipeline::Pipeline;
pub use resolver::{ArticleStream, ResolveReport, Resolver};
pub use shutdown::Shutdown;
pub use sitemap::{decode, DecodedSitemap, SitemapNode};
