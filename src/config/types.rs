use serde::Deserialize;

/// Main configuration structure for corpinfo
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub target: TargetConfig,
    pub provisioner: ProvisionerConfig,
    pub output: OutputConfig,
}

/// Request pipeline configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum requests per rolling second (also the in-flight cap)
    #[serde(rename = "rate-limit", default = "default_rate_limit")]
    pub rate_limit: u32,

    /// Total attempts per logical request
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Number of egress endpoints provisioned at startup
    #[serde(rename = "pool-size", default = "default_pool_size")]
    pub pool_size: u32,
}

/// Crawl target configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    /// Domain of the registry site being crawled
    pub domain: String,

    /// Scheme used when resolving paths against endpoint hosts
    #[serde(default = "default_scheme")]
    pub scheme: String,
}

/// Egress-endpoint provisioning service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ProvisionerConfig {
    /// Base URL of the provisioning service
    #[serde(rename = "base-url")]
    pub base_url: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

fn default_rate_limit() -> u32 {
    8
}

fn default_max_retries() -> u32 {
    3
}

fn default_pool_size() -> u32 {
    8
}

fn default_scheme() -> String {
    "https".to_string()
}
