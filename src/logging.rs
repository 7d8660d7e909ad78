use std::fs::OpenOptions;

use env_logger::{Builder, Env, Target};
use log::info;

use crate::Config;

pub const LOG_FILE_NAME: &str = "stak.log";

/// Initializes the global logger.
///
/// The terminal belongs to the TUI, so records are appended to `stak.log`
/// in the data directory. `RUST_LOG` overrides the configured level and
/// `verbose` forces `debug`. Falls back to stderr when the log file cannot
/// be opened.
pub fn initialize_logger(config: &Config, verbose: bool) {
    let default_level = if verbose { "debug" } else { config.log_level.as_str() };

    let mut builder = Builder::from_env(Env::default().default_filter_or(default_level));
    builder.format_timestamp_secs().format_module_path(true);

    let log_path = config.data_dir.join(LOG_FILE_NAME);
    match OpenOptions::new().create(true).append(true).open(&log_path) {
        Ok(file) => {
            builder.target(Target::Pipe(Box::new(file)));
        }
        Err(e) => {
            eprintln!("Cannot open log file {}: {}", log_path.display(), e);
            builder.target(Target::Stderr);
        }
    }

    // a logger may already be installed by tests
    if builder.try_init().is_ok() {
        info!("Logger initialized, writing to {}", log_path.display());
    }
}
