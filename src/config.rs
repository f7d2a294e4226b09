//! Configuration file support for ocrlabel.
//!
//! User preferences are stored as pretty-printed JSON in the platform
//! config directory. A missing or unreadable file is never fatal; the
//! defaults are used instead.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_NO_LABEL_TEXT;
use crate::store::AutoSavePolicy;

/// Log level setting for the application.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Convert to log crate's LevelFilter.
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

/// Serialization dialect of detection and recognition exports.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Tab-separated label lines
    #[default]
    Paddle,
    /// MMOCR dataset JSON
    #[value(name = "mmocr")]
    MmOcr,
}

impl Dialect {
    /// Registry id of the detection exporter for this dialect.
    pub fn det_exporter(&self) -> &'static str {
        match self {
            Dialect::Paddle => "det",
            Dialect::MmOcr => "det-mm",
        }
    }

    /// Registry id of the recognition exporter for this dialect.
    pub fn rec_exporter(&self) -> &'static str {
        match self {
            Dialect::Paddle => "rec",
            Dialect::MmOcr => "rec-mm",
        }
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version of the configuration file format
    pub version: u32,

    /// User preferences
    #[serde(default)]
    pub preferences: UserPreferences,
}

/// User preferences section of the config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreferences {
    /// Whether key classes are edited and exported
    #[serde(default = "default_kie_mode")]
    pub kie_mode: bool,

    /// Checkpoint frequency for confirmed images
    #[serde(default)]
    pub auto_save: AutoSavePolicy,

    /// Dialect used by detection exports
    #[serde(default)]
    pub det_dialect: Dialect,

    /// Dialect used by recognition exports
    #[serde(default)]
    pub rec_dialect: Dialect,

    /// Transcription given to boxes the recognizer cannot read
    #[serde(default = "default_no_label_text")]
    pub no_label_text: String,

    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,
}

fn default_kie_mode() -> bool {
    true
}

fn default_no_label_text() -> String {
    DEFAULT_NO_LABEL_TEXT.to_string()
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            kie_mode: default_kie_mode(),
            auto_save: AutoSavePolicy::default(),
            det_dialect: Dialect::default(),
            rec_dialect: Dialect::default(),
            no_label_text: default_no_label_text(),
            log_level: LogLevel::default(),
        }
    }
}

impl AppConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            preferences: UserPreferences::default(),
        }
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        // Validate version compatibility
        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }

        Ok(config)
    }

    /// Get the default config file name.
    pub fn default_filename() -> &'static str {
        "ocrlabel-config.json"
    }

    /// Get the default config file path.
    pub fn default_path() -> Option<PathBuf> {
        // Try to use XDG config directory, fall back to home directory
        if let Some(config_dir) = dirs::config_dir() {
            Some(config_dir.join("ocrlabel").join(Self::default_filename()))
        } else {
            dirs::home_dir().map(|home_dir| {
                home_dir
                    .join(".config")
                    .join("ocrlabel")
                    .join(Self::default_filename())
            })
        }
    }

    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load from `path`, falling back to defaults on any problem.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            log::debug!("No config file found at {:?}", path);
            return Self::new();
        }

        match Self::load(path) {
            Ok(config) => {
                log::info!("Loaded configuration from {:?}", path);
                config
            }
            Err(e) => {
                log::warn!("Failed to load config file {:?}: {}", path, e);
                Self::new()
            }
        }
    }

    /// Load from the default path, falling back to defaults.
    pub fn load_from_default_path() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_or_default(&path),
            None => Self::new(),
        }
    }

    /// Save configuration to a file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = self.to_json()?;
        std::fs::write(path, json)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Save configuration to the default path.
    pub fn save_to_default_path(&self) -> Result<(), ConfigError> {
        let path = Self::default_path().ok_or_else(|| {
            ConfigError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not determine config directory",
            ))
        })?;
        self.save(&path)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Configuration version is newer than supported
    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    /// I/O error when reading/writing config
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
