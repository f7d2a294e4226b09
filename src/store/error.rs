//! Error types for label store operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or persisting the label stores.
#[derive(Error, Debug)]
pub enum StoreError {
    /// I/O error during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A line of a label or cache file could not be parsed.
    ///
    /// Fatal for the load that hit it; lines are never skipped silently.
    #[error("Malformed store file {path:?} at line {line}: {message}")]
    MalformedStoreFile {
        /// File that failed to parse
        path: PathBuf,
        /// 1-based line number
        line: usize,
        /// Parser diagnostic
        message: String,
    },

    /// A path cannot be turned into an image record key.
    #[error("Cannot derive an image key from {path:?}")]
    InvalidImagePath {
        /// The offending path
        path: PathBuf,
    },
}

impl StoreError {
    /// Create a malformed-file error.
    pub fn malformed(path: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        Self::MalformedStoreFile {
            path: path.into(),
            line,
            message: message.into(),
        }
    }
}
