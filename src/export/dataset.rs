//! Intermediate data handed to exporters.
//!
//! An [`ExportDataset`] is a snapshot of the confirmed images, taken from
//! the manual label file right after it has been re-synced from memory.
//! Exporters never look at the live store.

use std::path::{Path, PathBuf};

use crate::export::error::ExportError;
use crate::model::{ImageKey, ShapeRecord};
use crate::store::{LabelStore, StoreError, label_file};

/// One confirmed image and its shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetEntry {
    pub key: ImageKey,

    /// Where the image file is expected on disk.
    pub image_path: PathBuf,

    pub shapes: Vec<ShapeRecord>,

    /// The shape list exactly as written in the label file.
    pub raw_shapes: String,

    /// Line of the label file this entry came from (1-based).
    pub line: usize,
}

impl DatasetEntry {
    /// Build an entry from in-memory shapes.
    pub fn new(
        key: ImageKey,
        image_path: impl Into<PathBuf>,
        shapes: Vec<ShapeRecord>,
    ) -> Result<Self, ExportError> {
        let raw_shapes = serde_json::to_string(&shapes)?;
        Ok(Self {
            key,
            image_path: image_path.into(),
            shapes,
            raw_shapes,
            line: 0,
        })
    }
}

/// Confirmed images ready for export, in label file order.
#[derive(Debug, Clone)]
pub struct ExportDataset {
    project_dir: PathBuf,
    label_path: PathBuf,
    entries: Vec<DatasetEntry>,
}

impl ExportDataset {
    /// Create a dataset from prepared entries.
    pub fn new(
        project_dir: impl Into<PathBuf>,
        label_path: impl Into<PathBuf>,
        entries: Vec<DatasetEntry>,
    ) -> Self {
        Self {
            project_dir: project_dir.into(),
            label_path: label_path.into(),
            entries,
        }
    }

    /// Re-sync the manual label file and read every confirmed image back.
    pub fn from_store(store: &LabelStore) -> Result<Self, ExportError> {
        if store.completion().is_empty() {
            return Err(ExportError::empty("no image has been confirmed yet"));
        }

        store.save_manual()?;
        let label_path = store.label_path();
        if !label_path.is_file() {
            return Err(ExportError::empty(format!("{:?} does not exist", label_path)));
        }

        let content = std::fs::read_to_string(&label_path)?;
        let completed = store.completion().keys();
        let mut entries = Vec::new();
        for raw in label_file::split_raw_lines(&label_path, &content)? {
            if !completed.contains(&raw.key) {
                continue;
            }
            let shapes = label_file::parse_shapes(&raw.shapes_json)
                .map_err(|e| StoreError::malformed(&label_path, raw.line, e.to_string()))?;
            entries.push(DatasetEntry {
                image_path: store.image_path_for(&raw.key),
                key: raw.key,
                shapes,
                raw_shapes: raw.shapes_json,
                line: raw.line,
            });
        }

        log::debug!("Export dataset holds {} images", entries.len());
        Ok(Self::new(store.project_dir(), label_path, entries))
    }

    /// Dataset holding a single image's in-memory manual labels.
    pub fn single(store: &LabelStore, image_path: &Path) -> Result<Self, ExportError> {
        let key = ImageKey::from_path(image_path).ok_or_else(|| StoreError::InvalidImagePath {
            path: image_path.to_path_buf(),
        })?;
        let shapes = store
            .manual()
            .get(&key)
            .cloned()
            .ok_or_else(|| ExportError::empty(format!("{} has no saved labels", key)))?;
        let entry = DatasetEntry::new(key, image_path, shapes)?;
        Ok(Self::new(store.project_dir(), store.label_path(), vec![entry]))
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    /// Manual label file the entries were read from.
    pub fn label_path(&self) -> &Path {
        &self.label_path
    }

    pub fn entries(&self) -> &[DatasetEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
