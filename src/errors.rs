//! Error types for the stak application.
//!
//! This module defines custom error types that categorize the failures
//! that can occur while classifying, storing and displaying entries.

use std::{io, path::PathBuf};

use thiserror::Error;

/// The main error type for the stak application.
#[derive(Error, Debug)]
pub enum StakError {
    /// Errors related to file I/O operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Errors related to YAML serialization/deserialization.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A day file exists but has no readable front-matter.
    #[error("Invalid day file {path}: {message}")]
    InvalidFormat { path: PathBuf, message: String },

    /// Errors related to configuration.
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Directory creation or access failed.
    #[error("Failed to create or access directory: {path}")]
    DirectoryError { path: PathBuf },

    /// for mutex lock acquisition issues
    #[error("{message}")]
    LockAcquisitionFailed { message: String },

    /// Fetching a page title failed. Never shown to the user.
    #[error("HTTP error: {message}")]
    Http { message: String },

    /// Terminal setup, drawing or teardown failed.
    #[error("Terminal error: {message}")]
    Terminal { message: String },
}

impl From<reqwest::Error> for StakError {
    fn from(e: reqwest::Error) -> Self {
        StakError::Http {
            message: e.to_string(),
        }
    }
}
