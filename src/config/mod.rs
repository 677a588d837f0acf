//! Configuration management.
//!
//! Values are layered: built-in defaults, then a TOML file, then environment
//! variables prefixed with `SCHOLAR_LENS__` (sections and keys separated by
//! `__`, e.g. `SCHOLAR_LENS__API__BASE_URL`). `SCHOLAR_LENS_API_URL` is
//! accepted as a shortcut for the API base URL and wins over both.

mod file_config;

pub use file_config::{
    default_config_path, find_config_file, find_config_file_in, write_default_config,
    ConfigFileError, CONFIG_FILE_NAME, LOCAL_CONFIG_FILE_NAME,
};

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::utils::{validate_base_url, RetryConfig, DEFAULT_PAGE_RADIUS};

/// Prefix for structured environment overrides
pub const ENV_PREFIX: &str = "SCHOLAR_LENS";

/// Shortcut variable for the API base URL
pub const API_URL_VAR: &str = "SCHOLAR_LENS_API_URL";

/// Errors raised while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub classifier: ClassifierConfig,

    #[serde(default)]
    pub retry: RetrySettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Remote API settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL the search, classify and sample endpoints hang off
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bound on each request attempt
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
            connect_timeout_seconds: default_connect_timeout(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout() -> u64 {
    15
}

fn default_connect_timeout() -> u64 {
    5
}

/// Search view settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Pages shown on each side of the current page
    #[serde(default = "default_page_radius")]
    pub page_radius: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            page_radius: default_page_radius(),
        }
    }
}

fn default_page_radius() -> u32 {
    DEFAULT_PAGE_RADIUS
}

/// Classifier view settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Quiet period before auto-classification
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Categories offered for sample text
    #[serde(default = "default_sample_categories")]
    pub sample_categories: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            sample_categories: default_sample_categories(),
        }
    }
}

impl ClassifierConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

fn default_debounce_ms() -> u64 {
    800
}

fn default_sample_categories() -> Vec<String> {
    ["business", "health", "politics"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Retry policy for transient backend failures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Attempts per request, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    2
}

fn default_initial_delay_ms() -> u64 {
    250
}

fn default_max_delay_ms() -> u64 {
    2000
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default level when neither `RUST_LOG` nor `-v`/`-q` is given
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `text` or `json`
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Retry policy, with each attempt bounded by the API timeout
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.retry.max_attempts,
            initial_delay: Duration::from_millis(self.retry.initial_delay_ms),
            max_delay: Duration::from_millis(self.retry.max_delay_ms),
            attempt_timeout: self.api.timeout(),
            ..RetryConfig::default()
        }
    }

    /// Check values that would make the client unusable
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        self.api.base_url = validate_base_url(&self.api.base_url)
            .map_err(|e| ConfigError::Invalid(format!("api.base_url: {}", e)))?;

        if self.api.timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "api.timeout_seconds must be positive".to_string(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Load configuration, reading overrides from the process environment
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    load_config_with_env(path, None)
}

/// Load configuration with an explicit set of environment variables
///
/// `None` reads the process environment.
pub fn load_config_with_env(
    path: Option<&Path>,
    env: Option<config::Map<String, String>>,
) -> Result<Config, ConfigError> {
    let api_url = match &env {
        Some(vars) => vars.get(API_URL_VAR).cloned(),
        None => std::env::var(API_URL_VAR).ok(),
    };

    let mut builder = config::Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(
            config::File::from(path)
                .format(config::FileFormat::Toml)
                .required(true),
        );
    }
    builder = builder.add_source(
        config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .source(env),
    );

    let mut config: Config = builder.build()?.try_deserialize()?;
    if let Some(url) = api_url {
        tracing::debug!("Using API URL from {}", API_URL_VAR);
        config.api.base_url = url;
    }
    config.validate()?;
    Ok(config)
}
