//! stak, an intelligent terminal scratchpad
//!
//! This library classifies free-form lines of text into notes, todos,
//! links, code, questions, meetings and ideas, stores them in one Markdown
//! file per day, and drives the interactive terminal view over them.

mod classifier;
mod cli;
mod config;
mod day_file;
mod entry;
mod errors;
mod extractor;
mod logging;
mod search;
mod service;
mod storage;
mod types;
mod watcher;

pub mod calendar;
pub mod ui;

// Re-export key components
pub use classifier::*;
pub use cli::*;
pub use config::*;
pub use day_file::*;
pub use entry::*;
pub use errors::*;
pub use extractor::*;
pub use logging::*;
pub use search::*;
pub use service::*;
pub use storage::*;
pub use types::*;
pub use watcher::*;
