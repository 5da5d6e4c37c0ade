//! Configuration structures.
//!
//! The configuration system supports:
//! - Bundled defaults (include_str! from shotlist.toml)
//! - User overrides (~/.config/shotlist/shotlist.toml, then ./shotlist.toml)
//! - Automatic merging with user values taking precedence

use config::{Config, File, FileFormat};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use shotlist_error::{ConfigError, ShotlistError, ShotlistResult};
use std::time::Duration;
use tracing::{debug, instrument};

/// `[retry]` section.
///
/// ```toml
/// [retry]
/// max_retries = 3
/// initial_backoff_ms = 2000
/// factor = 2
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Getters)]
pub struct RetryConfig {
    /// Attempts after the first call
    #[serde(default = "default_max_retries")]
    max_retries: usize,
    /// First backoff delay in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    initial_backoff_ms: u64,
    /// Multiplier applied to each following delay
    #[serde(default = "default_factor")]
    factor: u32,
}

fn default_max_retries() -> usize {
    3
}

fn default_initial_backoff_ms() -> u64 {
    2000
}

fn default_factor() -> u32 {
    2
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            factor: default_factor(),
        }
    }
}

/// `[queue]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Getters)]
pub struct QueueConfig {
    /// Pause after every batch item in milliseconds
    #[serde(default = "default_item_pause_ms")]
    item_pause_ms: u64,
}

fn default_item_pause_ms() -> u64 {
    500
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            item_pause_ms: default_item_pause_ms(),
        }
    }
}

impl QueueConfig {
    /// Pause as a duration.
    pub fn item_pause(&self) -> Duration {
        Duration::from_millis(self.item_pause_ms)
    }
}

/// `[model]` section.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Getters)]
pub struct ModelConfig {
    /// Model identifier
    name: String,
    /// REST base URL
    base_url: String,
    /// Default sampling temperature
    #[serde(default)]
    temperature: Option<f32>,
    /// Environment variable holding the API key
    api_key_env: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: "gemini-2.5-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            temperature: None,
            api_key_env: "GEMINI_API_KEY".to_string(),
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, Getters)]
pub struct LoggingConfig {
    /// Emit JSON lines instead of human-readable logs
    #[serde(default)]
    json: bool,
}

/// Top-level configuration.
///
/// # Example
///
/// ```no_run
/// use shotlist_retry::ShotlistConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ShotlistConfig::load()?;
/// println!("Backoff starts at {}ms", config.retry().initial_backoff_ms());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, Getters)]
pub struct ShotlistConfig {
    /// Retry policy tunables
    #[serde(default)]
    retry: RetryConfig,
    /// Batch queue tunables
    #[serde(default)]
    queue: QueueConfig,
    /// Generation model settings
    #[serde(default)]
    model: ModelConfig,
    /// Logging output
    #[serde(default)]
    logging: LoggingConfig,
}

impl ShotlistConfig {
    /// Load configuration from a specific file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<std::path::Path>) -> ShotlistResult<Self> {
        debug!("Loading configuration from file");

        Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .map_err(|e| {
                ShotlistError::from(ConfigError::new(format!(
                    "Failed to read configuration from {}: {}",
                    path.as_ref().display(),
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                ShotlistError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })
    }

    /// Load configuration with precedence: current dir > home dir > bundled defaults.
    ///
    /// User config files are optional and silently skipped if not found.
    #[instrument]
    pub fn load() -> ShotlistResult<Self> {
        debug!("Loading configuration with precedence: current dir > home dir > bundled defaults");

        const DEFAULT_CONFIG: &str = include_str!("../../../shotlist.toml");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/shotlist/shotlist.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder.add_source(File::with_name("shotlist").required(false));

        builder
            .build()
            .map_err(|e| {
                ShotlistError::from(ConfigError::new(format!(
                    "Failed to build configuration: {}",
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                ShotlistError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })
    }
}
