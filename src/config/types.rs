use serde::Deserialize;
use std::time::Duration;

/// Live quotes page scraped when no source is configured
pub const DEFAULT_SOURCE_URL: &str = "https://bigpara.hurriyet.com.tr/borsa/canli-borsa/";

/// Main configuration structure for the scraper
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Where quotes are fetched from
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// URL of the live quotes page
    #[serde(default = "default_source_url")]
    pub url: String,

    /// Probe the site origin once at startup before scheduling
    #[serde(rename = "check-connectivity", default = "default_true")]
    pub check_connectivity: bool,
}

/// How often the scrape job runs
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
    /// Seconds between the end of one tick and the next
    #[serde(rename = "interval-secs", default = "default_interval_secs")]
    pub interval_secs: u64,
}

/// HTTP client behavior
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Whole-request timeout in seconds
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(rename = "connect-timeout-secs", default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Idle pooled connections kept per host
    #[serde(rename = "max-idle-connections", default = "default_max_idle_connections")]
    pub max_idle_connections: usize,

    /// Seconds before an idle pooled connection is closed
    #[serde(rename = "idle-timeout-secs", default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
}

/// Persistence configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path", default = "default_database_path")]
    pub database_path: String,

    /// Quantity assigned to a symbol the first time it is seen
    #[serde(rename = "default-quantity", default = "default_quantity")]
    pub default_quantity: i64,
}

impl ScheduleConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: default_source_url(),
            check_connectivity: true,
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            max_idle_connections: default_max_idle_connections(),
            idle_timeout_secs: default_idle_timeout_secs(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            default_quantity: default_quantity(),
        }
    }
}

fn default_source_url() -> String {
    DEFAULT_SOURCE_URL.to_string()
}

fn default_true() -> bool {
    true
}

fn default_interval_secs() -> u64 {
    180
}

fn default_user_agent() -> String {
    format!("borsa-scraper/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_max_idle_connections() -> usize {
    10
}

fn default_idle_timeout_secs() -> u64 {
    30
}

fn default_database_path() -> String {
    "./stocks.db".to_string()
}

fn default_quantity() -> i64 {
    10_000
}
