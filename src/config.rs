//! Configuration file support for the slot uploader.
//!
//! Settings are stored as versioned JSON: in `localStorage` on the web and in
//! the user config directory on native builds.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_ACCEPTED_MIME_TYPES, DEFAULT_API_BASE_URL, DEFAULT_MAX_UPLOAD_BYTES,
    ENTITY_ID_PLACEHOLDER,
};
use crate::registry::{EntityClass, EntityRef};

/// Log level setting for the uploader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
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

    /// Convert to log crate's Level.
    pub fn to_level(&self) -> log::Level {
        match self {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Trace => log::Level::Trace,
        }
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Uploader configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploaderConfig {
    /// Version of the configuration file format
    #[serde(default = "default_version")]
    pub version: u32,

    /// Pre-stage file checks
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Server endpoints
    #[serde(default)]
    pub api: ApiConfig,

    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Append a timestamp query to committed URLs so browsers refetch them
    #[serde(default)]
    pub cache_bust_urls: bool,
}

fn default_version() -> u32 {
    CONFIG_VERSION
}

/// Type and size limits checked before a file is staged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Largest accepted file in bytes
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,

    /// Accepted MIME types (compared case-insensitively)
    #[serde(default = "default_accepted_mime_types")]
    pub accepted_mime_types: Vec<String>,
}

fn default_max_bytes() -> u64 {
    DEFAULT_MAX_UPLOAD_BYTES
}

fn default_accepted_mime_types() -> Vec<String> {
    DEFAULT_ACCEPTED_MIME_TYPES
        .iter()
        .map(|mime| mime.to_string())
        .collect()
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_max_bytes(),
            accepted_mime_types: default_accepted_mime_types(),
        }
    }
}

/// Endpoint templates; `{id}` is replaced by the entity id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Scheme, host and port prefix for every request
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Image endpoint for user statistic slots
    #[serde(default = "default_user_stats_path")]
    pub user_stats_path: String,

    /// Image endpoint for match formation slots
    #[serde(default = "default_match_formation_path")]
    pub match_formation_path: String,

    /// Image endpoint for team logo slots
    #[serde(default = "default_team_logo_path")]
    pub team_logo_path: String,
}

fn default_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_user_stats_path() -> String {
    "/api/admin/users/{id}/stat-images".to_string()
}

fn default_match_formation_path() -> String {
    "/api/matches/{id}/formation-images".to_string()
}

fn default_team_logo_path() -> String {
    "/api/teams/{id}/images".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_stats_path: default_user_stats_path(),
            match_formation_path: default_match_formation_path(),
            team_logo_path: default_team_logo_path(),
        }
    }
}

impl ApiConfig {
    /// Full URL serving both the snapshot (GET) and the batch commit (POST).
    pub fn images_url(&self, entity: &EntityRef) -> String {
        let template = match entity.class {
            EntityClass::UserStats => &self.user_stats_path,
            EntityClass::MatchFormation => &self.match_formation_path,
            EntityClass::TeamLogo => &self.team_logo_path,
        };
        let path = template.replace(ENTITY_ID_PLACEHOLDER, &urlencoding::encode(&entity.id));
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

impl UploaderConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            validation: ValidationConfig::default(),
            api: ApiConfig::default(),
            log_level: LogLevel::default(),
            cache_bust_urls: false,
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

    /// Get the default filename for the config file.
    pub fn default_filename() -> &'static str {
        "slot-uploader.json"
    }

    /// Get the default config file path.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn default_path() -> Option<std::path::PathBuf> {
        dirs::config_dir().map(|dir| dir.join("slot_uploader").join(Self::default_filename()))
    }

    /// Read and parse a config file.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from_path(path: &std::path::Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Write the config file, creating parent directories.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn save_to_path(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Try to load configuration from the default path.
    /// Returns None if the file doesn't exist or can't be read.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from_default_path() -> Option<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            log::debug!("No config file found at {:?}", path);
            return None;
        }

        match Self::load_from_path(&path) {
            Ok(config) => {
                log::info!("Loaded configuration from {:?}", path);
                Some(config)
            }
            Err(e) => {
                log::warn!("Failed to load config file {:?}: {}", path, e);
                None
            }
        }
    }

    /// LocalStorage key for WASM config persistence.
    #[cfg(target_arch = "wasm32")]
    const LOCALSTORAGE_KEY: &'static str = "slot-uploader-config";

    /// Try to load configuration from localStorage (WASM only).
    /// Returns None if not found or can't be parsed.
    #[cfg(target_arch = "wasm32")]
    pub fn load_from_local_storage() -> Option<Self> {
        let window = web_sys::window()?;
        let storage = window.local_storage().ok()??;

        match storage.get_item(Self::LOCALSTORAGE_KEY) {
            Ok(Some(json)) => match Self::from_json(&json) {
                Ok(config) => {
                    log::info!("Loaded configuration from localStorage");
                    Some(config)
                }
                Err(e) => {
                    log::warn!("Failed to parse config from localStorage: {}", e);
                    None
                }
            },
            Ok(None) => {
                log::debug!("No config found in localStorage");
                None
            }
            Err(e) => {
                log::warn!("Failed to read from localStorage: {:?}", e);
                None
            }
        }
    }

    /// Save configuration to localStorage (WASM only).
    #[cfg(target_arch = "wasm32")]
    pub fn save_to_local_storage(&self) -> Result<(), ConfigError> {
        let window = web_sys::window()
            .ok_or_else(|| ConfigError::StorageError("No window object available".to_string()))?;

        let storage = window
            .local_storage()
            .map_err(|e| ConfigError::StorageError(format!("localStorage access error: {:?}", e)))?
            .ok_or_else(|| ConfigError::StorageError("localStorage not available".to_string()))?;

        let json = self.to_json()?;

        storage
            .set_item(Self::LOCALSTORAGE_KEY, &json)
            .map_err(|e| {
                ConfigError::StorageError(format!("Failed to save to localStorage: {:?}", e))
            })?;

        log::info!("Saved configuration to localStorage");
        Ok(())
    }

    /// Load from the platform location, falling back to defaults.
    pub fn load_or_default() -> Self {
        #[cfg(target_arch = "wasm32")]
        let loaded = Self::load_from_local_storage();
        #[cfg(not(target_arch = "wasm32"))]
        let loaded = Self::load_from_default_path();

        loaded.unwrap_or_default()
    }
}

impl Default for UploaderConfig {
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
    #[error("Config version {file_version} is newer than supported {supported_version}")]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    /// Config file could not be read or written
    #[error("Config file error: {0}")]
    IoError(#[from] std::io::Error),

    /// Storage error (localStorage in WASM)
    #[error("Storage error: {0}")]
    StorageError(String),
}
