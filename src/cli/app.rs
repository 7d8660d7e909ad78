//! Non-interactive actions of the stak binary.
//!
//! Everything here prints to a writer and returns; the interactive
//! scratchpad lives in the `ui` module.
use std::{
    io::Write,
    path::{Path, PathBuf},
};

use console::style;
use log::info;

use crate::{config_search_paths, create_sample_config, Config, Result};

/// File written by `--create-config`, relative to the cwd
pub const SAMPLE_CONFIG_FILE: &str = "stak.yaml";

/// CLI application handler for the one-shot flags
pub struct App {
    /// Effective configuration, `--dir` already applied
    config: Config,

    /// Config file given with `--config`, if any
    config_path: Option<PathBuf>,
}

impl App {
    pub fn new(config: Config, config_path: Option<PathBuf>) -> Self {
        Self {
            config,
            config_path,
        }
    }

    /// Prints the data directory and the config search order, marking the
    /// files that exist.
    pub fn show_config(&self, out: &mut impl Write) -> Result<()> {
        writeln!(out, "Data directory: {}", self.config.data_dir.display())?;
        writeln!(out, "Date format:    {}", self.config.date_format)?;
        writeln!(out, "Theme:          {}", self.config.theme)?;
        writeln!(out)?;

        if let Some(path) = &self.config_path {
            writeln!(out, "Config file (--config): {}{}", path.display(), exists_marker(path))?;
            writeln!(out)?;
        }

        writeln!(out, "Config search order:")?;
        for (i, path) in config_search_paths().iter().enumerate() {
            writeln!(out, "  {}. {}{}", i + 1, path.display(), exists_marker(path))?;
        }
        Ok(())
    }

    /// Writes a sample config into `dir` and reports where it went.
    pub fn create_config(&self, dir: &Path, out: &mut impl Write) -> Result<PathBuf> {
        let path = dir.join(SAMPLE_CONFIG_FILE);
        create_sample_config(&path)?;
        info!("Sample config written to {}", path.display());
        writeln!(
            out,
            "Sample config created at {}",
            style(path.display()).green()
        )?;
        Ok(path)
    }
}

fn exists_marker(path: &Path) -> String {
    if path.exists() {
        format!(" {}", style("(exists)").green())
    } else {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn create_config_writes_loadable_yaml() {
        let dir = TempDir::new().unwrap();
        let app = App::new(Config::default(), None);
        let mut out = Vec::new();
        let path = app.create_config(dir.path(), &mut out).unwrap();

        assert!(path.ends_with(SAMPLE_CONFIG_FILE));
        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded.log_level, "info");
        assert!(String::from_utf8(out).unwrap().contains("Sample config created at"));
    }

    #[test]
    fn show_config_lists_search_order() {
        let dir = TempDir::new().unwrap();
        let explicit = dir.path().join("custom.yaml");
        std::fs::write(&explicit, "theme: mono\n").unwrap();

        let mut config = Config::default();
        config.set_data_dir(dir.path().join("notes"));
        let app = App::new(config, Some(explicit));
        let mut out = Vec::new();
        app.show_config(&mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Data directory:"));
        assert!(text.contains("custom.yaml"));
        assert!(text.contains("(exists)"));
        assert!(text.contains("Config search order:"));
        assert!(text.contains("1. "));
    }
}
