//! Persistent run configuration model and defaults.

use std::path::{Path, PathBuf};

use log::info;

/// Root configuration persisted to `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Config {
    #[serde(default)]
    /// Remote catalog settings.
    pub lookup: LookupConfig,
    #[serde(default)]
    /// Per-record retry behavior.
    pub retry: RetryConfig,
    #[serde(default)]
    /// Record iteration, checkpoint and failure handling.
    pub batch: BatchConfig,
}

/// Remote catalog endpoint and HTTP client settings.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct LookupConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Optional Google Books API key appended as `key=`.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,
}

/// Retry cap and pause between transient lookup failures.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

/// Batch iteration settings.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct BatchConfig {
    /// Successful enrichments between checkpoint flushes.
    #[serde(default = "default_checkpoint_interval")]
    pub checkpoint_interval: usize,
    #[serde(default)]
    pub failure_policy: FailurePolicy,
    /// Single-byte field delimiter shared by input and output.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

/// What happens to an in-range record whose retries are all exhausted.
#[derive(
    Debug,
    Clone,
    Copy,
    serde::Deserialize,
    serde::Serialize,
    PartialEq,
    Eq,
    Default,
    clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Omit the record from the output.
    #[default]
    Drop,
    /// Write the record unmodified to the output.
    Passthrough,
    /// Write the record unmodified to a separate quarantine file.
    Quarantine,
}

impl FailurePolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Drop => "drop",
            Self::Passthrough => "passthrough",
            Self::Quarantine => "quarantine",
        }
    }
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
            connect_timeout_secs: default_connect_timeout_secs(),
            read_timeout_secs: default_read_timeout_secs(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            checkpoint_interval: default_checkpoint_interval(),
            failure_policy: FailurePolicy::default(),
            delimiter: default_delimiter(),
        }
    }
}

fn default_base_url() -> String {
    "https://www.googleapis.com/books/v1/volumes".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_read_timeout_secs() -> u64 {
    15
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1_000
}

fn default_checkpoint_interval() -> usize {
    100
}

fn default_delimiter() -> char {
    ','
}

/// Clamps values that would make a run meaningless or loop forever.
pub fn sanitize_config(config: Config) -> Config {
    let mut sanitized = config;
    sanitized.retry.max_attempts = sanitized.retry.max_attempts.max(1);
    sanitized.batch.checkpoint_interval = sanitized.batch.checkpoint_interval.max(1);
    sanitized.lookup.connect_timeout_secs = sanitized.lookup.connect_timeout_secs.max(1);
    sanitized.lookup.read_timeout_secs = sanitized.lookup.read_timeout_secs.max(1);
    sanitized.lookup.base_url = sanitized.lookup.base_url.trim().to_string();
    sanitized.lookup.api_key = sanitized.lookup.api_key.trim().to_string();
    if sanitized.lookup.base_url.is_empty() {
        sanitized.lookup.base_url = default_base_url();
    }
    sanitized
}

/// Returns the delimiter as the single byte the csv reader and writer need.
///
/// The quote character and line breaks are rejected: they already have a
/// meaning in delimited files and would split or merge rows.
pub fn delimiter_byte(delimiter: char) -> Result<u8, String> {
    if matches!(delimiter, '"' | '\n' | '\r') {
        return Err(format!(
            "delimiter cannot be the quote character or a line break, got {delimiter:?}"
        ));
    }
    if delimiter.is_ascii() {
        Ok(delimiter as u8)
    } else {
        Err(format!("delimiter must be a single ASCII character, got {delimiter:?}"))
    }
}

/// Default config file location under the user's config directory.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("genre-enricher").join("config.toml"))
}

/// Loads config from `explicit_path`, or from the default location.
///
/// A missing default file is created with default values. A missing
/// explicitly named file is an error.
pub fn load_config(explicit_path: Option<&Path>) -> Result<Config, String> {
    let config_path = match explicit_path {
        Some(path) => {
            if !path.exists() {
                return Err(format!("config file not found: {}", path.display()));
            }
            path.to_path_buf()
        }
        None => {
            let Some(path) = default_config_path() else {
                info!("No config directory available. Using default config");
                return Ok(Config::default());
            };
            if !path.exists() {
                write_default_config(&path)?;
            }
            path
        }
    };

    let content = std::fs::read_to_string(&config_path)
        .map_err(|err| format!("failed to read config {}: {err}", config_path.display()))?;
    let parsed = toml::from_str::<Config>(&content)
        .map_err(|err| format!("failed to parse config {}: {err}", config_path.display()))?;
    Ok(sanitize_config(parsed))
}

fn write_default_config(path: &Path) -> Result<(), String> {
    info!(
        "Config file not found. Creating default config. path={}",
        path.display()
    );
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|err| format!("failed to create {}: {err}", parent.display()))?;
    }
    let serialized = toml::to_string(&Config::default())
        .map_err(|err| format!("failed to serialize default config: {err}"))?;
    std::fs::write(path, serialized)
        .map_err(|err| format!("failed to write {}: {err}", path.display()))
}
