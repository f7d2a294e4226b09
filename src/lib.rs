//! ocrlabel - OCR annotation state and dataset export
//!
//! Keeps the per-project label files of an OCR annotation workflow
//! (`Label.txt`, `Cache.cach`, `fileState.txt`) and turns confirmed images
//! into detection, recognition and key-information-extraction datasets.

pub mod config;
pub mod constants;
pub mod export;
pub mod geometry;
pub mod model;
pub mod recognition;
pub mod session;
pub mod store;
pub mod utils;

pub use config::AppConfig;
pub use export::{ExportDataset, ExportError, ExportOptions, ExporterRegistry};
pub use model::{ImageKey, Point, Shape, ShapeRecord};
pub use recognition::OcrEngine;
pub use session::{Session, SessionError};
pub use store::{LabelStore, SaveMode, StoreError};
