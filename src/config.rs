//! Runtime configuration loaded from YAML
//!
//! Every field has a default, so the tool runs without a config file at all.
//! A partial file overrides only the keys it names; everything else keeps its
//! default value.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Environment variable that overrides the configured API key file path.
pub const API_KEY_FILE_ENV: &str = "MINDAT_API_KEY_FILE";

/// Maximum backoff delay in seconds.
/// Caps exponential growth so a long retry chain never stalls for minutes
/// between attempts.
pub const MAX_BACKOFF_SECS: f64 = 60.0;

/// Errors raised while loading configuration or credentials
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file exists but could not be read
    #[error("failed to read config file {path}: {detail}")]
    Unreadable {
        /// Path of the config file
        path: PathBuf,
        /// Underlying I/O error text
        detail: String,
    },

    /// Config file contents are not valid YAML for this schema
    #[error("failed to parse config file {path}: {detail}")]
    Parse {
        /// Path of the config file
        path: PathBuf,
        /// Parser error text
        detail: String,
    },

    /// API key file does not exist
    #[error("API key file not found: {0}")]
    KeyFileNotFound(PathBuf),

    /// API key file exists but could not be read
    #[error("failed to read API key file {path}: {detail}")]
    KeyFileUnreadable {
        /// Path of the key file
        path: PathBuf,
        /// Underlying I/O error text
        detail: String,
    },

    /// API key file exists but contains only whitespace
    #[error("API key file {0} is empty")]
    KeyFileEmpty(PathBuf),
}

/// Top-level application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base URL of the API, without a trailing slash
    pub base_url: String,
    /// Path to the file holding the API key
    pub api_key_file: PathBuf,
    /// Connect/read timeout settings
    pub timeouts: Timeouts,
    /// Retry policy for transient HTTP failures
    pub retries: RetryPolicy,
    /// Records requested per page
    pub page_size: u32,
    /// Path templates for the API endpoints
    pub endpoints: EndpointTemplates,
    /// Ordered search strategies; the first productive one wins
    pub search_strategies: Vec<SearchStrategy>,
    /// Output location and format
    pub save: SaveConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.mindat.org/v1".to_string(),
            api_key_file: PathBuf::from("api_key.txt"),
            timeouts: Timeouts::default(),
            retries: RetryPolicy::default(),
            page_size: 100,
            endpoints: EndpointTemplates::default(),
            search_strategies: vec![
                SearchStrategy::new("ltype", 60),
                SearchStrategy::new("txt", "Mine"),
            ],
            save: SaveConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a YAML file, falling back to defaults.
    ///
    /// A missing file is not an error: the defaults target the public Mindat
    /// API. The `MINDAT_API_KEY_FILE` environment variable overrides the
    /// configured key file path when set.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let raw = fs::read_to_string(path).map_err(|e| ConfigError::Unreadable {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })?;
            if raw.trim().is_empty() {
                Self::default()
            } else {
                serde_yaml::from_str(&raw).map_err(|e| ConfigError::Parse {
                    path: path.to_path_buf(),
                    detail: e.to_string(),
                })?
            }
        } else {
            debug!(path = %path.display(), "No config file found, using defaults");
            Self::default()
        };

        if let Ok(key_file) = std::env::var(API_KEY_FILE_ENV) {
            config.api_key_file = PathBuf::from(key_file);
        }

        Ok(config)
    }
}

/// Read and trim the API key from the given key file.
///
/// Called before any network activity so a missing or unusable key aborts
/// the run up front.
pub fn read_api_key(path: &Path) -> Result<String, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::KeyFileNotFound(path.to_path_buf()));
    }

    let raw = fs::read_to_string(path).map_err(|e| ConfigError::KeyFileUnreadable {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;

    let key = raw.trim();
    if key.is_empty() {
        return Err(ConfigError::KeyFileEmpty(path.to_path_buf()));
    }
    Ok(key.to_string())
}

/// HTTP timeout settings in seconds
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// TCP connect timeout
    pub connect: u64,
    /// Overall per-request budget once connected
    pub read: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: 10,
            read: 40,
        }
    }
}

impl Timeouts {
    /// Connect timeout as a [`Duration`]
    pub fn connect_duration(&self) -> Duration {
        Duration::from_secs(self.connect)
    }

    /// Read timeout as a [`Duration`]
    pub fn read_duration(&self) -> Duration {
        Duration::from_secs(self.read)
    }
}

/// Retry policy for transient HTTP failures
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts per request, including the first
    pub total: u32,
    /// Multiplier for the exponential backoff schedule
    pub backoff_factor: f64,
    /// HTTP status codes that trigger a retry
    pub status_forcelist: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            total: 6,
            backoff_factor: 1.2,
            status_forcelist: vec![429, 500, 502, 503, 504],
        }
    }
}

impl RetryPolicy {
    /// Whether a response status should be retried
    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.status_forcelist.contains(&status)
    }

    /// Backoff delay before the retry that follows attempt `attempt`
    /// (zero-based).
    ///
    /// Grows as `backoff_factor * 2^attempt`, capped at [`MAX_BACKOFF_SECS`].
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let secs = self.backoff_factor * 2f64.powi(attempt.min(31) as i32);
        let secs = if secs.is_finite() {
            secs.clamp(0.0, MAX_BACKOFF_SECS)
        } else {
            MAX_BACKOFF_SECS
        };
        Duration::from_secs_f64(secs)
    }
}

/// Path templates appended to the base URL
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointTemplates {
    /// Listing endpoint for localities
    pub localities: String,
    /// Detail endpoint; `{id}` is replaced with the record id
    pub locality_detail: String,
    /// Listing endpoint for minerals recorded at a locality
    pub locality_minerals: String,
}

impl Default for EndpointTemplates {
    fn default() -> Self {
        Self {
            localities: "/localities/".to_string(),
            locality_detail: "/localities/{id}/".to_string(),
            locality_minerals: "/localityminerals/".to_string(),
        }
    }
}

/// One search strategy: a single query parameter and its value.
///
/// Values stay as raw scalars so numeric filters (`ltype: 60`) and text
/// filters (`txt: Mine`) both express naturally in the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchStrategy {
    /// Query parameter name
    pub param: String,
    /// Query parameter value, any YAML scalar
    pub value: serde_json::Value,
}

impl SearchStrategy {
    /// Build a strategy from a parameter name and value
    pub fn new(param: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            param: param.into(),
            value: value.into(),
        }
    }

    /// Render the value as a query-string parameter.
    ///
    /// Strings pass through unquoted; other scalars use their JSON rendering.
    pub fn value_as_param(&self) -> String {
        match &self.value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Output location and format
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveConfig {
    /// Directory that receives artifacts and run logs
    pub dir: PathBuf,
    /// On-disk artifact format
    pub format: SaveFormat,
    /// For the accumulating format, rewrite the document every N appends
    pub checkpoint_every: u32,
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("mindat_data"),
            format: SaveFormat::Json,
            checkpoint_every: 1,
        }
    }
}

/// On-disk artifact format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveFormat {
    /// Single JSON document `{"results": [...]}` rewritten atomically
    Json,
    /// Append-only JSON Lines, one record per line
    Jsonl,
}

impl SaveFormat {
    /// File extension for artifacts in this format
    pub fn extension(self) -> &'static str {
        match self {
            SaveFormat::Json => "json",
            SaveFormat::Jsonl => "jsonl",
        }
    }
}

impl fmt::Display for SaveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}
