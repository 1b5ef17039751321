//! Error types for gallery-watch
//!
//! This module provides error handling for the crate, including:
//! - A fatal configuration error that aborts startup
//! - Transient fetch errors scoped to the failing task
//! - Persistence errors that leave the image store untouched
//!
//! Duplicate images are deliberately *not* an error: they are a recognized
//! outcome of image processing, modeled as
//! [`ImageOutcome::Duplicate`](crate::crawler::ImageOutcome).

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for gallery-watch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for gallery-watch
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "list_url")
        key: Option<String>,
    },

    /// Network error from the HTTP client
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// List page or article could not be fetched or parsed
    #[error("list fetch error: {0}")]
    List(String),

    /// Image bytes or metadata could not be fetched
    #[error("image fetch error: {0}")]
    Image(String),

    /// Image bytes could not be persisted to the content-addressed store
    ///
    /// The in-memory store is left unchanged when this is returned, so a
    /// later retry of the same image can still succeed cleanly.
    #[error("failed to persist image at {path}: {source}")]
    Persist {
        /// Destination path of the failed write
        path: PathBuf,
        /// Underlying I/O failure
        source: std::io::Error,
    },
}

impl Error {
    /// Convenience constructor for configuration errors
    pub fn config(message: impl Into<String>, key: Option<&str>) -> Self {
        Self::Config {
            message: message.into(),
            key: key.map(String::from),
        }
    }
}
