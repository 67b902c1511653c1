use anyhow::{anyhow, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::formats::SubtitleFormat;
use crate::session::TaskConfig;

/// Application configuration module
/// This module handles loading, validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// LLM optimization / translation settings
    #[serde(default)]
    pub optimization: OptimizationConfig,

    /// Default format when saving
    #[serde(default)]
    pub output_format: SubtitleFormat,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Settings copied onto a task when a run starts
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OptimizationConfig {
    /// Rewrite the original text (fix recognition errors, punctuation)
    #[serde(default = "default_true")]
    pub need_optimize: bool,

    /// Translate into `target_language`
    #[serde(default)]
    pub need_translate: bool,

    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: OpenAI-compatible base URL
    #[serde(default = "default_api_base")]
    pub api_base: String,

    // @field: Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Cues per request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Concurrent requests
    #[serde(default = "default_thread_num")]
    pub thread_num: usize,

    /// ISO code or English name
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Temperature parameter for text generation (0.0 to 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retry count for failed requests
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Backoff base for retries (in milliseconds), doubled on each retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            need_optimize: true,
            need_translate: false,
            api_key: String::new(),
            api_base: default_api_base(),
            model: default_model(),
            batch_size: default_batch_size(),
            thread_num: default_thread_num(),
            target_language: default_target_language(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
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
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_batch_size() -> usize {
    10
}

fn default_thread_num() -> usize {
    4
}

fn default_target_language() -> String {
    "zh".to_string()
}

fn default_temperature() -> f32 {
    0.3
}

fn default_timeout_secs() -> u64 {
    60
}

/// Upper bound for `retry_count`; backoff doubles on every retry
pub const MAX_RETRY_COUNT: u32 = 10;

fn default_retry_count() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

fn is_local_endpoint(url: &str) -> bool {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h == "localhost" || h == "127.0.0.1" || h == "::1" || h == "[::1]"))
        .unwrap_or(false)
}

impl Config {
    /// Load the configuration from a JSON file, writing defaults when it is missing
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;
            let config: Config = serde_json::from_reader(BufReader::new(file))
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            return Ok(config);
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
        let opt = &self.optimization;

        if opt.batch_size == 0 {
            return Err(anyhow!("batch_size must be greater than zero"));
        }
        if opt.thread_num == 0 {
            return Err(anyhow!("thread_num must be greater than zero"));
        }
        if opt.retry_count > MAX_RETRY_COUNT {
            return Err(anyhow!("retry_count must be at most {}", MAX_RETRY_COUNT));
        }
        if opt.need_translate {
            crate::language_utils::resolve_language_name(&opt.target_language)?;
        }
        if url::Url::parse(&opt.api_base).is_err() {
            return Err(anyhow!("Invalid api_base URL: {}", opt.api_base));
        }
        if (opt.need_optimize || opt.need_translate) && opt.api_key.is_empty() && !is_local_endpoint(&opt.api_base) {
            return Err(anyhow!("An API key is required for {}", opt.api_base));
        }

        Ok(())
    }

    /// Values copied onto a task when a run starts. Later config edits do not
    /// reach a run already in progress.
    pub fn optimization_snapshot(&self) -> TaskConfig {
        let opt = &self.optimization;
        TaskConfig {
            need_optimize: opt.need_optimize,
            need_translate: opt.need_translate,
            api_key: opt.api_key.clone(),
            base_url: opt.api_base.clone(),
            llm_model: opt.model.clone(),
            batch_size: opt.batch_size,
            thread_num: opt.thread_num,
            target_language: opt.target_language.clone(),
        }
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            optimization: OptimizationConfig::default(),
            output_format: SubtitleFormat::default(),
            log_level: LogLevel::default(),
        }
    }
}
