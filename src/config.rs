use crate::model::ConfigError;
use crate::normalizer::NumberExtraction;
use crate::parser::SUPPORTED_SITES;
use serde::Deserialize;
use std::fs;
use std::time::Duration;

pub const CONFIG_ENV: &str = "JOB_SNIPER_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

#[derive(Debug, Deserialize)]
pub struct SiteConfig {
    pub name: String,
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    /// Overrides the adapter's first listing page.
    pub base_url: Option<String>,
    pub url_pattern: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SummarizerConfig {
    pub endpoint: String,
    pub model: String,
    #[serde(default = "default_summarizer_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_render_service_url")]
    pub render_service_url: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_overview_timeout")]
    pub overview_timeout_ms: u64,
    #[serde(default = "default_detail_timeout")]
    pub detail_timeout_ms: u64,
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    #[serde(default)]
    pub number_extraction: NumberExtraction,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    pub sqlite_path: Option<String>,
    pub sites: Vec<SiteConfig>,
    pub summarizer: Option<SummarizerConfig>,
}

fn default_max_pages() -> u32 {
    100
}

fn default_summarizer_timeout() -> u64 {
    120
}

fn default_render_service_url() -> String {
    "http://localhost:11235".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_overview_timeout() -> u64 {
    2000
}

fn default_detail_timeout() -> u64 {
    5000
}

fn default_max_concurrency() -> usize {
    3
}

fn default_output_dir() -> String {
    "data".to_string()
}

impl AppConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn overview_timeout(&self) -> Duration {
        Duration::from_millis(self.overview_timeout_ms)
    }

    pub fn detail_timeout(&self) -> Duration {
        Duration::from_millis(self.detail_timeout_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.sites.is_empty() {
            return Err(ConfigError::Invalid("no sites configured".into()));
        }
        if self.max_concurrency == 0 {
            return Err(ConfigError::Invalid("max_concurrency must be at least 1".into()));
        }
        for site in &self.sites {
            if !SUPPORTED_SITES.contains(&site.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "unknown site {:?}, expected one of {:?}",
                    site.name, SUPPORTED_SITES
                )));
            }
            if site.max_pages == 0 {
                return Err(ConfigError::Invalid(format!(
                    "max_pages for {} must be at least 1",
                    site.name
                )));
            }
        }
        Ok(())
    }
}

/// `JOB_SNIPER_CONFIG` wins over the default `config.json`.
pub fn config_path() -> String {
    std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
}

pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = serde_json::from_str(content)?;
    config.validate()?;
    Ok(config)
}
