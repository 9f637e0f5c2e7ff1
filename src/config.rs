use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Top-level settings for the decider
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// Where the shared meal table lives
    #[serde(default)]
    pub store: StoreConfig,
    /// Outgoing HTTP behaviour for link resolution and recipe import
    #[serde(default)]
    pub fetch: FetchConfig,
    /// File the CLI keeps its session state in between invocations
    #[serde(default = "default_session_path")]
    pub session_path: PathBuf,
    /// Hosts whose links are unwrapped before import (e.g. "pin.it")
    #[serde(default = "default_short_link_domains")]
    pub short_link_domains: Vec<String>,
    /// Secret guarding the "wipe all" action. Wiping is disabled when unset.
    pub admin_password: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    /// CSV file backing the meal table
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
    /// How long a read snapshot is reused before the file is read again
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FetchConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            fetch: FetchConfig::default(),
            session_path: default_session_path(),
            short_link_domains: default_short_link_domains(),
            admin_password: None,
        }
    }
}

impl StoreConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// Default value functions
fn default_store_path() -> PathBuf {
    PathBuf::from("meals.csv")
}

fn default_cache_ttl_secs() -> u64 {
    60
}

fn default_session_path() -> PathBuf {
    PathBuf::from("session.json")
}

fn default_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
}

fn default_short_link_domains() -> Vec<String> {
    vec!["pin.it".to_string(), "pinterest.com".to_string()]
}

impl Settings {
    /// Load settings from file and environment variables
    ///
    /// Settings are loaded with the following priority (highest to lowest):
    /// 1. Environment variables with DINNER__ prefix
    /// 2. dinner.toml file in current directory
    /// 3. Default values
    ///
    /// Environment variable format: DINNER__STORE__PATH, DINNER__ADMIN_PASSWORD
    pub fn load() -> Result<Self, ConfigError> {
        load_settings()
    }
}

/// Load settings from file and environment variables
pub fn load_settings() -> Result<Settings, ConfigError> {
    let settings = Config::builder()
        // Optional config file (can be missing)
        .add_source(File::with_name("dinner").required(false))
        // Use double underscore for nested: DINNER__FETCH__TIMEOUT_SECS
        .add_source(
            Environment::with_prefix("DINNER")
                .prefix_separator("__")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("short_link_domains")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}
