//! Error types for dataset export operations.

use thiserror::Error;

use crate::store::StoreError;

/// Errors that abort an export.
///
/// Problems with individual images or shapes are not errors; they become
/// [`ExportWarning`](crate::export::ExportWarning)s in the export result.
#[derive(Error, Debug)]
pub enum ExportError {
    /// I/O error during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Image encoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// The label store could not be read or re-synced
    #[error("Label store error: {0}")]
    Store(#[from] StoreError),

    /// Nothing to export yet; no output file was written
    #[error("Nothing to export: {reason}")]
    EmptyExportPrecondition {
        /// Why the export cannot run
        reason: String,
    },

    /// No exporter registered under the requested id
    #[error("Unknown export format '{0}'")]
    UnknownExporter(String),
}

impl ExportError {
    /// Create an empty-export error with a reason.
    pub fn empty(reason: impl Into<String>) -> Self {
        Self::EmptyExportPrecondition {
            reason: reason.into(),
        }
    }
}
