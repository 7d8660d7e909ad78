use std::path::PathBuf;

use clap::Parser;

/// Main CLI application arguments
#[derive(Parser, Debug)]
#[clap(
    name = "stak",
    version = concat!("v", env!("CARGO_PKG_VERSION"), " - Your intelligent terminal scratchpad"),
    about = "Your intelligent terminal scratchpad"
)]
pub struct Cli {
    /// Path to the configuration file
    #[clap(short = 'c', long, value_parser)]
    pub config: Option<PathBuf>,

    /// Directory holding the day files (overrides data_dir)
    #[clap(long, value_parser)]
    pub dir: Option<PathBuf>,

    /// Write a sample config to ./stak.yaml and exit
    #[clap(long)]
    pub create_config: bool,

    /// Print the effective data directory and config search order, then exit
    #[clap(long)]
    pub show_config: bool,

    /// Verbose logging
    #[clap(short, long)]
    pub verbose: bool,
}
