/*!
 * Application configuration.
 *
 * Every section and field has a serde default, so a partial `conf.json`
 * is completed with defaults on load.
 */

use anyhow::{Context, Result, anyhow};
use log::{LevelFilter, warn};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use url::Url;

use crate::document::MAX_FILE_SIZE_BYTES;
use crate::translation::segmenter::ChunkSizePolicy;

/// Application configuration, loaded from a JSON file
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Target language code (ISO 639-1)
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Translation config
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Input file limits
    #[serde(default)]
    pub files: FilesConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Primary per-chunk endpoint
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PrimaryEndpointConfig {
    /// Service URL, without query string
    #[serde(default = "default_primary_endpoint")]
    pub endpoint: String,

    /// Source language sent with each chunk
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_primary_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for PrimaryEndpointConfig {
    fn default() -> Self {
        Self {
            endpoint: default_primary_endpoint(),
            source_language: default_source_language(),
            timeout_secs: default_primary_timeout_secs(),
        }
    }
}

/// Secondary whole-document backend
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FallbackConfig {
    /// Base URL of the backend API
    #[serde(default = "default_fallback_base_url")]
    pub base_url: String,

    /// Submission timeout in seconds
    #[serde(default = "default_fallback_timeout_secs")]
    pub timeout_secs: u64,

    /// Whether failed local runs are handed to the backend
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            base_url: default_fallback_base_url(),
            timeout_secs: default_fallback_timeout_secs(),
            enabled: default_true(),
        }
    }
}

/// Per-chunk retry schedule
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RetryConfig {
    /// Attempts per chunk, including the first one
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first attempt
    #[serde(default = "default_politeness_delay_ms")]
    pub politeness_delay_ms: u64,

    /// Attempt `n > 1` waits `n` times this
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Extra wait after an HTTP 429
    #[serde(default = "default_rate_limit_cooldown_ms")]
    pub rate_limit_cooldown_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            politeness_delay_ms: default_politeness_delay_ms(),
            backoff_base_ms: default_backoff_base_ms(),
            rate_limit_cooldown_ms: default_rate_limit_cooldown_ms(),
        }
    }
}

/// Translation pipeline configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct TranslationConfig {
    #[serde(default)]
    pub primary: PrimaryEndpointConfig,

    #[serde(default)]
    pub fallback: FallbackConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub segmentation: ChunkSizePolicy,
}

/// Input file limits
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FilesConfig {
    /// Largest accepted upload in bytes
    #[serde(default = "default_max_size_bytes")]
    pub max_size_bytes: u64,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            max_size_bytes: default_max_size_bytes(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            Self::Error => LevelFilter::Error,
            Self::Warn => LevelFilter::Warn,
            Self::Info => LevelFilter::Info,
            Self::Debug => LevelFilter::Debug,
            Self::Trace => LevelFilter::Trace,
        }
    }
}

fn default_target_language() -> String {
    "es".to_string()
}

fn default_primary_endpoint() -> String {
    crate::providers::google::DEFAULT_GTX_ENDPOINT.to_string()
}

fn default_source_language() -> String {
    "auto".to_string()
}

fn default_primary_timeout_secs() -> u64 {
    30
}

fn default_fallback_base_url() -> String {
    "http://localhost:3000/api".to_string()
}

fn default_fallback_timeout_secs() -> u64 {
    120
}

fn default_max_attempts() -> u32 {
    3
}

fn default_politeness_delay_ms() -> u64 {
    300
}

fn default_backoff_base_ms() -> u64 {
    1000
}

fn default_rate_limit_cooldown_ms() -> u64 {
    2000
}

fn default_max_size_bytes() -> u64 {
    MAX_FILE_SIZE_BYTES
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load the configuration at `path`, writing a default one first if it does not exist
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if path.exists() {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;
            let reader = BufReader::new(file);
            return serde_json::from_reader(reader)
                .with_context(|| format!("Failed to parse config file: {}", path.display()));
        }

        warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write default config to file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        crate::language_utils::validate_target_language(&self.target_language)?;

        Url::parse(&self.translation.primary.endpoint).with_context(|| {
            format!("Invalid primary endpoint URL: {}", self.translation.primary.endpoint)
        })?;

        if self.translation.fallback.enabled {
            Url::parse(&self.translation.fallback.base_url).with_context(|| {
                format!("Invalid fallback base URL: {}", self.translation.fallback.base_url)
            })?;
        }

        if self.translation.retry.max_attempts == 0 {
            return Err(anyhow!("translation.retry.max_attempts must be at least 1"));
        }

        let segmentation = &self.translation.segmentation;
        if segmentation.small_document_chunk_size == 0 || segmentation.large_document_chunk_size == 0 {
            return Err(anyhow!("Chunk sizes must be greater than zero"));
        }

        if self.files.max_size_bytes == 0 {
            return Err(anyhow!("files.max_size_bytes must be greater than zero"));
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            target_language: default_target_language(),
            translation: TranslationConfig::default(),
            files: FilesConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
