use serde::Deserialize;

/// Main configuration structure for the harvester
///
/// Every section is optional; a missing section takes its defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub resolver: ResolverConfig,
    pub extractor: ExtractorConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// Sitemap walk configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ResolverConfig {
    /// Maximum number of sitemap documents fetched concurrently per level
    pub fan_out: usize,

    /// Total attempts per fetch, including the first one
    pub max_attempts: u32,

    /// Delay before the first retry (milliseconds)
    pub initial_backoff_ms: u64,

    /// Upper bound on the exponential delay (milliseconds)
    pub max_backoff_ms: u64,

    /// Random extra delay added to every backoff (milliseconds)
    pub jitter_ms: u64,

    /// Per-request timeout (milliseconds)
    pub request_timeout_ms: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            fan_out: 8,
            max_attempts: 4,
            initial_backoff_ms: 500,
            max_backoff_ms: 30_000,
            jitter_ms: 250,
            request_timeout_ms: 30_000,
        }
    }
}

/// Extraction pool configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ExtractorConfig {
    /// Maximum number of articles extracted at once
    pub concurrency: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self { concurrency: 16 }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct UserAgentConfig {
    /// Name of the crawler
    pub crawler_name: String,

    /// Version of the crawler
    pub crawler_version: String,

    /// URL with information about the crawler
    pub contact_url: String,

    /// Email address for crawler-related contact
    pub contact_email: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: env!("CARGO_PKG_NAME").to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://github.com/sitemap-harvester".to_string(),
            contact_email: "harvester@example.com".to_string(),
        }
    }
}

/// Where harvested articles are written
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One JSON object per line
    #[default]
    Jsonl,

    /// Rows in a SQLite `articles` table
    Sqlite,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Sink format
    pub format: OutputFormat,

    /// Output file or database path; stdout when absent (jsonl only)
    pub path: Option<String>,

    /// Path to the markdown run summary
    pub summary_path: Option<String>,

    /// Failure ratio above which the run exits non-zero
    pub max_failure_ratio: f64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Jsonl,
            path: None,
            summary_path: None,
            max_failure_ratio: 0.25,
        }
    }
}
