//! Configuration for fbshot.
//!
//! Loads user configuration from the platform-standard config directory:
//! - Linux: `~/.config/fbshot/config.json`
//! - macOS: `~/Library/Application Support/fbshot/config.json`
//!
//! Everything in the file is optional and command-line flags always win.

use crate::ImageFormat;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Output-related configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputConfig {
    /// Directory where relative image paths are placed. None means the
    /// current working directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
    /// Image format used when --format is not given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<ImageFormat>,
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Output settings group.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Get the path to the config file.
fn config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "fbshot").map(|dirs| dirs.config_dir().join("config.json"))
}

/// Load configuration from disk.
/// Returns default config if the file doesn't exist or is invalid.
pub fn load_config() -> AppConfig {
    let Some(path) = config_path() else {
        return AppConfig::default();
    };
    if !path.exists() {
        return AppConfig::default();
    }
    match fs::read_to_string(&path) {
        Ok(contents) => match serde_json::from_str::<AppConfig>(&contents) {
            Ok(config) => {
                tracing::debug!(path = %path.display(), "loaded config");
                config
            }
            Err(e) => {
                tracing::warn!("ignoring malformed config file: {}", e);
                AppConfig::default()
            }
        },
        Err(e) => {
            tracing::warn!("could not read config file: {}", e);
            AppConfig::default()
        }
    }
}

/// Resolve where a rendered image path should land.
///
/// Absolute paths are used as-is; relative paths go under the configured
/// output directory when one is set.
pub fn resolve_output_path(config: &AppConfig, rendered: &str) -> PathBuf {
    let rendered = PathBuf::from(rendered);
    if rendered.is_absolute() {
        return rendered;
    }
    match &config.output.directory {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir).join(rendered),
        _ => rendered,
    }
}
