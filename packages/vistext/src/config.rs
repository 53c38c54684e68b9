//! Application configuration
//!
//! Settings stored in TOML. Every section and field is optional; missing
//! values fall back to their defaults.

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use vistext_ocr::ComponentDetectorOptions;

use crate::controller::ControllerSettings;
use crate::geometry::ScreenRect;
use crate::normalizer::{ResizeFilter, DEFAULT_MAX_DIMENSION};
use crate::overlay::OverlayStyle;

pub const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub display: DisplaySettings,
    pub overlay: OverlayStyle,
    pub detector: DetectorSettings,
}

impl AppConfig {
    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            viewport: ScreenRect::new(
                0.0,
                0.0,
                self.display.viewport_width,
                self.display.viewport_height,
            ),
            max_dimension: self.display.max_dimension,
            resize_filter: self.display.resize_filter,
            style: self.overlay.clone(),
        }
    }
}

/// Viewport and image-preparation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    /// Width of the rendered viewport in display pixels
    pub viewport_width: f32,
    /// Height of the rendered viewport in display pixels
    pub viewport_height: f32,
    /// Longest edge of the displayed image before it is scaled to fit
    pub max_dimension: u32,
    pub resize_filter: ResizeFilter,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            viewport_width: 375.0,
            viewport_height: 667.0,
            max_dimension: DEFAULT_MAX_DIMENSION,
            resize_filter: ResizeFilter::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    /// Connected-component detection on the local machine
    #[default]
    Components,
    /// Observations recorded by an external engine, read from a JSON file
    Sidecar,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorSettings {
    pub engine: EngineKind,
    /// JSON observations for the sidecar engine
    pub observations: Option<PathBuf>,
    pub components: ComponentDetectorOptions,
}

/// Parse a configuration file
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Per-user configuration directory, if the platform has one
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("com", "vistext", "vistext").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Load `explicit` if given, else the per-user config file if it exists, else defaults
pub fn load_or_default(explicit: Option<&Path>) -> Result<AppConfig, ConfigError> {
    if let Some(path) = explicit {
        let config = load_config(path)?;
        info!("Loaded configuration from {}", path.display());
        return Ok(config);
    }

    if let Some(path) = config_dir().map(|dir| dir.join(CONFIG_FILE_NAME)) {
        if path.exists() {
            let config = load_config(&path)?;
            info!("Loaded configuration from {}", path.display());
            return Ok(config);
        }
    }

    info!("Using default configuration");
    Ok(AppConfig::default())
}
