use std::path::{Path, PathBuf};

use rs_avatar::{COMPLEXITY_MAX, DecodeOptions};
use serde::Deserialize;
use thiserror::Error;

pub const RS_AVATAR_CONFIG_ENV: &str = "RS_AVATAR_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub render: RenderSettings,
    pub decode: DecodeOptions,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Trust-supplied complexity; above 12287 means unlimited, -1 renders nothing.
    pub complexity: i32,
    pub frames: u32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            complexity: COMPLEXITY_MAX,
            frames: 1,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub filter: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

/// `--config` first, then `RS_AVATAR_CONFIG`.
pub fn settings_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    std::env::var_os(RS_AVATAR_CONFIG_ENV).map(PathBuf::from)
}

/// Built-in defaults when no settings file is named.
pub fn load(explicit: Option<&Path>) -> Result<Settings, ConfigError> {
    let Some(path) = settings_path(explicit) else {
        return Ok(Settings::default());
    };
    let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    parse(&text).map_err(|source| ConfigError::Parse { path, source })
}

pub fn parse(text: &str) -> Result<Settings, toml::de::Error> {
    toml::from_str(text)
}
