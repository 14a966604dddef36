//! Session configuration.
//!
//! Settings are read from a JSON file (every field optional) and may be
//! overridden from the command line. Once a session starts they are fixed.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{
    APP_DIR, CONFIG_FILE, DEFAULT_BRIGHTNESS_THRESHOLD, DEFAULT_CIRCLE_SIZE,
    DEFAULT_CLAHE_CLIP_LIMIT, DEFAULT_CLAHE_TILE_GRID, DEFAULT_MAX_HISTORY_SIZE, DEFAULT_UNDO_KEY,
};
use crate::error::ConfigError;
use crate::event::{Key, PointerButton};

/// Log level setting for the application.
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
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

/// Current configuration file format version.
pub const CONFIG_VERSION: u32 = 1;

/// CLAHE parameters for the display copy of the image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaheSettings {
    /// Histogram clip limit, relative to a uniform distribution
    pub clip_limit: f32,
    /// Number of tiles along each axis
    pub tile_grid: u32,
}

impl Default for ClaheSettings {
    fn default() -> Self {
        Self {
            clip_limit: DEFAULT_CLAHE_CLIP_LIMIT,
            tile_grid: DEFAULT_CLAHE_TILE_GRID,
        }
    }
}

/// Parameters of one annotation session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotatorConfig {
    /// Version of the configuration file format
    pub version: u32,

    /// Button that paints
    pub paint_button: PointerButton,

    /// Brush radius in pixels
    pub circle_size: u32,

    /// Key that reverts the last stroke
    #[serde(alias = "redo_key")]
    pub undo_key: Key,

    /// Number of undo snapshots kept
    pub max_history_size: usize,

    /// Enhance the displayed image with CLAHE
    pub apply_clahe: bool,

    /// Minimum mean channel value of instance colors
    pub brightness_threshold: u8,

    pub clahe: ClaheSettings,

    /// Stamp along the segment between consecutive pointer samples
    pub interpolate_strokes: bool,

    /// Seed for instance colors; `None` draws from OS entropy
    pub color_seed: Option<u64>,

    /// Log verbosity level
    pub log_level: LogLevel,
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            paint_button: PointerButton::Right,
            circle_size: DEFAULT_CIRCLE_SIZE,
            undo_key: Key::new(DEFAULT_UNDO_KEY),
            max_history_size: DEFAULT_MAX_HISTORY_SIZE,
            apply_clahe: true,
            brightness_threshold: DEFAULT_BRIGHTNESS_THRESHOLD,
            clahe: ClaheSettings::default(),
            interpolate_strokes: false,
            color_seed: None,
            log_level: LogLevel::default(),
        }
    }
}

impl AnnotatorConfig {
    /// Default config file location (`<config dir>/mask-annotator/config.json`).
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Parse a config from JSON text.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        if config.version > CONFIG_VERSION {
            log::warn!(
                "Config version {} is newer than supported version {}",
                config.version,
                CONFIG_VERSION
            );
        }
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Like [`AnnotatorConfig::load`], but a missing file is `Ok(None)`.
    pub fn load_if_present(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }
        Self::load(path).map(Some)
    }

    /// Load `path` if it exists, falling back to defaults.
    ///
    /// A missing file is silent; an unreadable or invalid one is logged.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load_if_present(path) {
            Ok(config) => config.unwrap_or_default(),
            Err(err) => {
                log::warn!("Failed to load config {:?}: {}; using defaults", path, err);
                Self::default()
            }
        }
    }

    /// Write the config, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        log::info!("Saved config to {:?}", path);
        Ok(())
    }

    /// Reject values the session cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.circle_size == 0 {
            return Err(ConfigError::invalid("circle_size must be at least 1"));
        }
        if self.max_history_size == 0 {
            return Err(ConfigError::invalid("max_history_size must be at least 1"));
        }
        if self.clahe.clip_limit.is_nan() || self.clahe.clip_limit <= 0.0 {
            return Err(ConfigError::invalid("clahe.clip_limit must be positive"));
        }
        if self.clahe.tile_grid == 0 {
            return Err(ConfigError::invalid("clahe.tile_grid must be at least 1"));
        }
        Ok(())
    }
}
