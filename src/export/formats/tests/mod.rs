//! Unit tests for dataset exporters.
//!
//! Each test builds a throwaway project directory with real image files and
//! a label store, then runs an exporter against it.

mod det_mmocr_tests;
mod rec_paddle_tests;

use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};

use crate::export::{DatasetExporter, ExportDataset, ExportOptions, ExportResult};
use crate::model::{Point, ShapeRecord};
use crate::store::{LabelStore, SaveMode};

/// A project directory named `a` inside a temp dir.
pub(super) struct TestProject {
    _dir: tempfile::TempDir,
    pub project: PathBuf,
    pub store: LabelStore,
}

impl TestProject {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("a");
        std::fs::create_dir(&project).unwrap();
        let store = LabelStore::new(&project);
        Self {
            _dir: dir,
            project,
            store,
        }
    }

    /// Write a gradient image and return its path.
    pub fn add_image(&self, name: &str, width: u32, height: u32) -> PathBuf {
        let path = self.project.join(name);
        let image = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        image.save(&path).unwrap();
        path
    }

    /// Confirm an image with the given shapes.
    pub fn confirm(&mut self, image: &Path, shapes: Vec<ShapeRecord>) {
        self.store.put(image, shapes, SaveMode::Manual).unwrap();
    }

    /// Run an exporter into the project directory.
    pub fn export(&self, exporter: &dyn DatasetExporter) -> ExportResult {
        let dataset = ExportDataset::from_store(&self.store).unwrap();
        exporter.export(&dataset, &ExportOptions::new()).unwrap()
    }

    pub fn read(&self, name: &str) -> String {
        std::fs::read_to_string(self.project.join(name)).unwrap()
    }
}

/// Axis-aligned rectangle as a four-point record.
pub(super) fn rect(text: &str, x: i32, y: i32, w: i32, h: i32) -> ShapeRecord {
    ShapeRecord::new(
        text,
        vec![
            Point::new(x, y),
            Point::new(x + w, y),
            Point::new(x + w, y + h),
            Point::new(x, y + h),
        ],
    )
}

/// Four collinear points.
pub(super) fn collinear(text: &str) -> ShapeRecord {
    ShapeRecord::new(
        text,
        vec![
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(20, 0),
            Point::new(30, 0),
        ],
    )
}
