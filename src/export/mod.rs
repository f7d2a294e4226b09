//! Dataset export pipeline.
//!
//! Exporters turn the confirmed images of a project into training-dataset
//! files. Every run regenerates its output from scratch: the whole output is
//! rendered in memory first and only then written, each file through a temp
//! file and a rename, so an aborted run leaves the previous output intact.
//!
//! ## Exporters
//!
//! - **det**: detection lines, difficult regions labelled `###`
//! - **det-mm**: detection, MMOCR `TextDetDataset` JSON
//! - **rec**: rectified crops plus `rec_label.txt`
//! - **rec-mm**: rectified crops plus MMOCR `TextRecogDataset` JSON
//! - **kie**: key-information-extraction lines, difficult regions dropped
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ocrlabel::export::{ExportDataset, ExportOptions, ExporterRegistry};
//!
//! let registry = ExporterRegistry::new();
//! let dataset = ExportDataset::from_store(&store)?;
//! let result = registry.require("det")?.export(&dataset, &ExportOptions::new())?;
//! ```

mod dataset;
mod error;
pub mod formats;
mod registry;
mod traits;

pub use dataset::{DatasetEntry, ExportDataset};
pub use error::ExportError;
pub use registry::ExporterRegistry;
pub use traits::{
    DatasetExporter, EncodedCrop, ExportOptions, ExportResult, ExportWarning, RenderedExport,
    WarningKind,
};
