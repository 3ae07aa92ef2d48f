use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub relations: RelationsConfig,
    #[serde(default)]
    pub features: FeaturesConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Admin API connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Admin base URL, e.g. `http://localhost:1337/admin`
    pub base_url: String,
    #[serde(default = "default_api_token_env")]
    pub api_token_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
}

/// Relation field behaviour
#[derive(Debug, Clone, Deserialize)]
pub struct RelationsConfig {
    #[serde(default = "default_search_page_size")]
    pub search_page_size: u32,
    /// Page size used when listing attached relations
    #[serde(default = "default_list_page_size")]
    pub list_page_size: u32,
    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,
    #[serde(default = "default_item_height")]
    pub item_height: u32,
    #[serde(default = "default_gutter")]
    pub gutter: u32,
}

impl Default for RelationsConfig {
    fn default() -> Self {
        Self {
            search_page_size: default_search_page_size(),
            list_page_size: default_list_page_size(),
            search_debounce_ms: default_search_debounce_ms(),
            item_height: default_item_height(),
            gutter: default_gutter(),
        }
    }
}

/// Feature flags passed explicitly to the controllers that need them
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct FeaturesConfig {
    #[serde(default = "default_draft_and_publish")]
    pub draft_and_publish: bool,
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            draft_and_publish: default_draft_and_publish(),
        }
    }
}

/// Response cache settings
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Number of cached relation pages; 0 disables the cache.
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
        }
    }
}

fn default_api_token_env() -> String {
    "RELKIT_API_TOKEN".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> usize {
    2
}

fn default_search_page_size() -> u32 {
    10
}

fn default_list_page_size() -> u32 {
    crate::relations::RELATIONS_TO_DISPLAY as u32
}

fn default_search_debounce_ms() -> u64 {
    250
}

fn default_item_height() -> u32 {
    50
}

fn default_gutter() -> u32 {
    4
}

fn default_draft_and_publish() -> bool {
    true
}

fn default_cache_capacity() -> usize {
    128
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in RELKIT_CONFIG environment variable
    /// 2. ./config.toml in current directory
    pub fn load() -> Result<Self> {
        // .env is optional
        let _ = dotenv::dotenv();

        let config_path = std::env::var("RELKIT_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.toml"));

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        Self::from_toml(&config_str)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(config_str: &str) -> Result<Self> {
        let config: Config = toml::from_str(config_str).context("Failed to parse config.toml")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            anyhow::bail!("api.base_url must not be empty");
        }

        url::Url::parse(&self.api.base_url)
            .with_context(|| format!("api.base_url is not a valid URL: {}", self.api.base_url))?;

        if self.relations.search_page_size == 0 {
            anyhow::bail!("relations.search_page_size must be greater than 0");
        }

        if self.relations.list_page_size == 0 {
            anyhow::bail!("relations.list_page_size must be greater than 0");
        }

        if self.api.timeout_secs == 0 {
            anyhow::bail!("api.timeout_secs must be greater than 0");
        }

        Ok(())
    }

    /// Read the API token from the configured environment variable, if set
    pub fn api_token(&self) -> Option<String> {
        std::env::var(&self.api.api_token_env)
            .ok()
            .filter(|token| !token.trim().is_empty())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.relations.search_debounce_ms)
    }
}
