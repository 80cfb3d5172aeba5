use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Commented defaults shipped with the binary.
pub const DEFAULT_CONFIG: &str = include_str!("default_config.toml");

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file at {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub page: PageConfig,
    pub links: LinksConfig,
    pub index: IndexConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PageConfig {
    pub title: String,
    pub banner_style: String,
    /// Escape `<`, `&` and quotes in source text. Off by default: raw HTML in
    /// notes is passed through untouched.
    pub escape_html: bool,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            title: "Note".to_string(),
            banner_style: "color:#666;font-size:small".to_string(),
            escape_html: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LinksConfig {
    pub new_tab: bool,
    pub rel: String,
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            new_tab: true,
            rel: "noopener noreferrer".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct IndexConfig {
    pub title: String,
    pub file_name: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            title: "Notes".to_string(),
            file_name: "index.html".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct OutputConfig {
    /// Destination directory. When unset it is derived from the source.
    pub dir: Option<PathBuf>,
}

impl Config {
    /// The configuration compiled into the binary.
    pub fn compiled_default() -> Self {
        toml::from_str(DEFAULT_CONFIG).unwrap_or_default()
    }

    /// Load config from a TOML file, or return defaults if it does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::compiled_default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
