use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::cache::{DEFAULT_VIEWPORT_ROWS, DEFAULT_WINDOW_CAPACITY};
use crate::error::ConfigError;
use crate::tabs::Tab;

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "sdarchive", "sdarchive")
}

/// Host folder mounted at `/ext` when nothing else is configured.
pub fn default_storage_root() -> PathBuf {
    if let Some(dirs) = project_dirs() {
        dirs.data_dir().join("sd")
    } else {
        PathBuf::from("sd")
    }
}

pub fn default_config_path() -> PathBuf {
    if let Some(dirs) = project_dirs() {
        dirs.config_dir().join("config.json")
    } else {
        PathBuf::from("sdarchive.json")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage_root: PathBuf,
    pub window_capacity: usize,
    pub viewport_rows: usize,
    pub long_load_threshold: usize,
    pub history_depth: usize,
    pub max_name_len: usize,
    /// Show a `..` entry below the tab root (file-picker style).
    pub show_parent_entry: bool,
    pub start_tab: Tab,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            storage_root: default_storage_root(),
            window_capacity: DEFAULT_WINDOW_CAPACITY,
            viewport_rows: DEFAULT_VIEWPORT_ROWS,
            long_load_threshold: 100,
            history_depth: 32,
            max_name_len: 255,
            show_parent_entry: false,
            start_tab: Tab::Browser,
        }
    }
}

impl Config {
    /// Load from `path`, or from the default location. A missing file means
    /// defaults; unreadable or malformed files are errors.
    pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("config: {} not found, using defaults", path.display());
                return Ok(Config::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.display().to_string(),
                    source,
                })
            }
        };
        let config = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        log::debug!("config: loaded {}", path.display());
        Ok(config)
    }
}
