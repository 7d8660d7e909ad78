//! Application configuration.
//!
//! Configuration is read from the first YAML file found in the search
//! order returned by [`config_search_paths`]; any missing option keeps its
//! default.
use std::{
    env, fs,
    path::{Path, PathBuf},
};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{Result, StakError};

/// Application configuration settings.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Directory where day files are stored
    pub data_dir: PathBuf,

    /// Default log filter when RUST_LOG is unset
    pub log_level: String,

    /// Renderer palette: "default" or "mono"
    pub theme: String,

    /// Date pattern used for day file names
    pub date_format: String,

    /// Reserved
    pub auto_save: bool,

    /// Order search hits by relevance instead of recency
    pub fuzzy_search: bool,
}

impl Default for Config {
    fn default() -> Self {
        let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Config {
            data_dir: cwd.join("notes"),
            log_level: "info".to_string(),
            theme: "default".to_string(),
            date_format: "%Y-%m-%d".to_string(),
            auto_save: true,
            fuzzy_search: true,
        }
    }
}

impl Config {
    /// Loads configuration from `explicit` or the first existing default location.
    ///
    /// A path that does not exist yields the defaults; a file that exists but
    /// cannot be read or parsed is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => config_search_paths().into_iter().find(|p| p.exists()),
        };

        let mut config = match path {
            Some(path) if path.exists() => {
                info!("Loading config from {}", path.display());
                let text = fs::read_to_string(&path).map_err(|e| StakError::ConfigError {
                    message: format!("failed to read config file {}: {}", path.display(), e),
                })?;
                Self::from_yaml(&text).map_err(|e| StakError::ConfigError {
                    message: format!("failed to parse config file {}: {}", path.display(), e),
                })?
            }
            _ => {
                debug!("No config file found, using defaults");
                Config::default()
            }
        };

        config.data_dir = absolutize(&config.data_dir);
        Ok(config)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Config::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Overrides the data directory, resolving relative paths against the cwd.
    pub fn set_data_dir(&mut self, dir: impl AsRef<Path>) {
        self.data_dir = absolutize(dir.as_ref());
    }

    /// Writes this config as YAML, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|_| StakError::DirectoryError {
                path: parent.to_path_buf(),
            })?;
        }
        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;
        Ok(())
    }

    /// Creates the data directory if it does not exist yet.
    pub fn ensure_data_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.data_dir).map_err(|_| StakError::DirectoryError {
            path: self.data_dir.clone(),
        })
    }

    /// The configured date format as a chrono strftime pattern.
    pub fn strftime_date_format(&self) -> String {
        to_strftime(&self.date_format)
    }
}

/// Default config locations, in the order they are searched.
pub fn config_search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::with_capacity(4);
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".stak").join("config.yaml"));
        paths.push(home.join(".config").join("stak").join("config.yaml"));
    }
    paths.push(PathBuf::from("stak.yaml"));
    paths.push(PathBuf::from(".stak.yaml"));
    paths
}

/// Writes a config holding the defaults to `path`.
pub fn create_sample_config(path: &Path) -> Result<()> {
    Config::default().save(path)
}

/// Translates token (`YYYY-MM-DD`) and reference-layout (`2006-01-02`) date
/// patterns to strftime; patterns already containing `%` pass through.
pub fn to_strftime(pattern: &str) -> String {
    if pattern.contains('%') {
        return pattern.to_string();
    }
    if pattern.trim().is_empty() {
        return "%Y-%m-%d".to_string();
    }
    const TOKENS: &[(&str, &str)] = &[
        ("YYYY", "%Y"),
        ("2006", "%Y"),
        ("MM", "%m"),
        ("01", "%m"),
        ("DD", "%d"),
        ("02", "%d"),
    ];
    let mut out = String::with_capacity(pattern.len() + 4);
    let mut rest = pattern;
    'outer: while !rest.is_empty() {
        for (token, replacement) in TOKENS {
            if let Some(tail) = rest.strip_prefix(token) {
                out.push_str(replacement);
                rest = tail;
                continue 'outer;
            }
        }
        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            out.push(c);
        }
        rest = chars.as_str();
    }
    out
}

fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}
