//! Editing session over one open project directory.
//!
//! A [`Session`] owns the label store, the locked-shape set, the user
//! preferences and the image currently being edited. Opening another
//! directory means building a new session; nothing carries over except
//! what was persisted to disk.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::AppConfig;
use crate::export::formats::export_single_image;
use crate::export::{ExportDataset, ExportError, ExportOptions, ExportResult, ExporterRegistry};
use crate::model::{ImageKey, Shape};
use crate::recognition::{self, BatchReport, OcrEngine, ReRecognition, RecognitionError};
use crate::store::{LabelStore, LockedShapes, PutOutcome, SaveMode, StoreError};
use crate::utils::scan_images;

/// Errors from session operations.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Label store error: {0}")]
    Store(#[from] StoreError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Recognition error: {0}")]
    Recognition(#[from] RecognitionError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The operation needs a loaded image
    #[error("No image is loaded")]
    NoImageLoaded,
}

/// Counts shown by `ocrlabel status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectStatus {
    pub images: usize,
    pub completed: usize,
    pub manual: usize,
    pub cached: usize,
}

/// The image being edited and its live shapes.
#[derive(Debug)]
struct CurrentImage {
    path: PathBuf,
    width: u32,
    height: u32,
    shapes: Vec<Shape>,
}

/// Annotation session for one project directory.
pub struct Session {
    store: LabelStore,
    locked: LockedShapes,
    config: AppConfig,
    registry: ExporterRegistry,
    images: Vec<PathBuf>,
    current: Option<CurrentImage>,
}

impl Session {
    /// Open a project directory: load and merge its label files, list its images.
    pub fn open(project_dir: impl Into<PathBuf>, config: AppConfig) -> Result<Self, SessionError> {
        let project_dir = project_dir.into();
        let store = LabelStore::open(&project_dir)?.with_auto_save(config.preferences.auto_save);
        let images = scan_images(&project_dir)?;
        log::info!("Opened {:?} with {} images", project_dir, images.len());

        Ok(Self {
            store,
            locked: LockedShapes::new(),
            config,
            registry: ExporterRegistry::new(),
            images,
            current: None,
        })
    }

    /// Make `image_path` the current image.
    ///
    /// Stored shapes come from the manual labels, falling back to the cache.
    /// Locked shapes are materialized at the image's size on top; they keep
    /// their transcription only when the same image is reloaded. A stored
    /// shape with the outline of a locked box was saved from it, so its
    /// text and flags go onto the locked box instead of a second copy.
    pub fn load_image(&mut self, image_path: &Path) -> Result<&[Shape], SessionError> {
        let (width, height) = image::image_dimensions(image_path)?;
        let same_image = self
            .current
            .as_ref()
            .is_some_and(|current| current.path == image_path);

        let mut locked = self.locked.materialize(width, height, same_image);
        let mut shapes = Vec::new();
        if let Some(records) = ImageKey::from_path(image_path).and_then(|k| self.store.shapes_for(&k)) {
            for (index, record) in records.iter().enumerate() {
                if let Some(live) = locked
                    .iter_mut()
                    .find(|l| l.points() == record.points.as_slice())
                {
                    live.set_label(record.transcription.as_str());
                    live.set_key_cls(record.key_cls.as_str());
                    live.set_difficult(record.difficult);
                    continue;
                }
                match Shape::from_record(record) {
                    Ok(shape) => shapes.push(shape),
                    Err(e) => log::warn!("{:?}: skipping stored shape {}: {}", image_path, index, e),
                }
            }
        }
        shapes.extend(locked);

        log::debug!(
            "Loaded {:?} ({}x{}) with {} shapes",
            image_path,
            width,
            height,
            shapes.len()
        );
        let current = self.current.insert(CurrentImage {
            path: image_path.to_path_buf(),
            width,
            height,
            shapes,
        });
        Ok(&current.shapes)
    }

    /// Confirm the current image.
    ///
    /// Every live shape is written at its current points, locked or not.
    /// The locked set is then rebuilt from the live locked shapes, so a
    /// locked box deleted here is no longer carried to other images.
    pub fn save_image(&mut self) -> Result<PutOutcome, SessionError> {
        let current = self.current.as_mut().ok_or(SessionError::NoImageLoaded)?;
        let (width, height) = (current.width, current.height);

        let records: Vec<_> = current.shapes.iter().map(Shape::serialize).collect();
        self.locked.relock(current.shapes.iter_mut(), width, height);

        let outcome = self.store.put(&current.path, records, SaveMode::Manual)?;
        log::info!("Saved {} shapes for {:?}", outcome.stored, current.path);
        Ok(outcome)
    }

    /// Lock the selected shapes, or unlock everything if anything is locked.
    ///
    /// Returns true when shapes are locked afterwards.
    pub fn toggle_lock(&mut self, selected: &[usize]) -> Result<bool, SessionError> {
        let current = self.current.as_mut().ok_or(SessionError::NoImageLoaded)?;
        let (width, height) = (current.width, current.height);

        let chosen = current
            .shapes
            .iter_mut()
            .enumerate()
            .filter(|(index, _)| selected.contains(index))
            .map(|(_, shape)| shape);
        let locked = self.locked.toggle(chosen, width, height);
        if !locked {
            current.shapes.iter_mut().for_each(Shape::unlock);
        }
        Ok(locked)
    }

    /// Rotate the current image file by 90 degrees and reload it.
    ///
    /// Stored labels are not transformed; locked shapes follow the new
    /// dimensions through their ratios.
    pub fn rotate_image(&mut self, clockwise: bool) -> Result<&[Shape], SessionError> {
        let path = self
            .current
            .as_ref()
            .map(|current| current.path.clone())
            .ok_or(SessionError::NoImageLoaded)?;

        let image = image::open(&path)?;
        let rotated = if clockwise {
            image.rotate90()
        } else {
            image.rotate270()
        };
        rotated.save(&path)?;
        log::info!(
            "Rotated {:?} {}",
            path,
            if clockwise { "clockwise" } else { "counter-clockwise" }
        );

        self.load_image(&path)
    }

    /// Delete an image file and forget it everywhere, then persist.
    pub fn delete_image(&mut self, image_path: &Path) -> Result<(), SessionError> {
        self.store.remove(image_path);
        self.store.save_all()?;
        self.images.retain(|path| path != image_path);
        if self
            .current
            .as_ref()
            .is_some_and(|current| current.path == image_path)
        {
            self.current = None;
        }
        if image_path.exists() {
            fs::remove_file(image_path)?;
        }
        log::info!("Deleted {:?}", image_path);
        Ok(())
    }

    /// Re-read the text of the current image's shapes.
    pub fn re_recognize(&mut self, engine: &mut dyn OcrEngine) -> Result<ReRecognition, SessionError> {
        let current = self.current.as_mut().ok_or(SessionError::NoImageLoaded)?;
        let image = image::open(&current.path)?.to_rgb8();
        Ok(recognition::re_recognize(
            &image,
            current.shapes.iter_mut(),
            engine,
            &self.config.preferences.no_label_text,
        ))
    }

    /// Run detection and recognition over every unconfirmed image.
    pub fn auto_recognize(&mut self, engine: &mut dyn OcrEngine) -> Result<BatchReport, SessionError> {
        let report = recognition::auto_recognize(&mut self.store, &self.images, engine)?;
        Ok(report)
    }

    /// Persist all label state.
    pub fn save_all(&mut self) -> Result<(), SessionError> {
        self.store.save_all()?;
        Ok(())
    }

    /// Run one exporter over the confirmed images.
    pub fn export(&self, id: &str, options: &ExportOptions) -> Result<ExportResult, SessionError> {
        let exporter = self.registry.require(id)?;
        let dataset = ExportDataset::from_store(&self.store)?;
        Ok(exporter.export(&dataset, options)?)
    }

    /// Detection export in the configured dialect.
    pub fn export_detection(&self, options: &ExportOptions) -> Result<ExportResult, SessionError> {
        self.export(self.config.preferences.det_dialect.det_exporter(), options)
    }

    /// Recognition export in the configured dialect.
    pub fn export_recognition(&self, options: &ExportOptions) -> Result<ExportResult, SessionError> {
        self.export(self.config.preferences.rec_dialect.rec_exporter(), options)
    }

    /// Recognition crops of the current image only.
    pub fn export_current_crops(&self, options: &ExportOptions) -> Result<ExportResult, SessionError> {
        let current = self.current.as_ref().ok_or(SessionError::NoImageLoaded)?;
        Ok(export_single_image(&self.store, &current.path, options)?)
    }

    pub fn status(&self) -> ProjectStatus {
        ProjectStatus {
            images: self.images.len(),
            completed: self.store.completion().len(),
            manual: self.store.manual().len(),
            cached: self.store.cache().len(),
        }
    }

    pub fn images(&self) -> &[PathBuf] {
        &self.images
    }

    pub fn current_path(&self) -> Option<&Path> {
        self.current.as_ref().map(|current| current.path.as_path())
    }

    /// Dimensions of the current image.
    pub fn current_size(&self) -> Option<(u32, u32)> {
        self.current
            .as_ref()
            .map(|current| (current.width, current.height))
    }

    /// Live shapes of the current image; empty when nothing is loaded.
    pub fn shapes(&self) -> &[Shape] {
        self.current
            .as_ref()
            .map(|current| current.shapes.as_slice())
            .unwrap_or_default()
    }

    pub fn shapes_mut(&mut self) -> Option<&mut Vec<Shape>> {
        self.current.as_mut().map(|current| &mut current.shapes)
    }

    pub fn locked(&self) -> &LockedShapes {
        &self.locked
    }

    pub fn store(&self) -> &LabelStore {
        &self.store
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn registry(&self) -> &ExporterRegistry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Quad;
    use crate::model::Point;
    use crate::recognition::Recognition;
    use image::{Rgb, RgbImage};

    struct Fixture {
        _dir: tempfile::TempDir,
        project: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let project = dir.path().join("a");
            fs::create_dir(&project).unwrap();
            Self { _dir: dir, project }
        }

        fn image(&self, name: &str, width: u32, height: u32) -> PathBuf {
            let path = self.project.join(name);
            RgbImage::from_pixel(width, height, Rgb([200, 200, 200]))
                .save(&path)
                .unwrap();
            path
        }

        fn session(&self) -> Session {
            Session::open(&self.project, AppConfig::new()).unwrap()
        }
    }

    fn rect(label: &str, x: i32, y: i32, w: i32, h: i32) -> Shape {
        Shape::new(
            vec![
                Point::new(x, y),
                Point::new(x + w, y),
                Point::new(x + w, y + h),
                Point::new(x, y + h),
            ],
            label,
            "None",
        )
        .unwrap()
    }

    struct ReadsEverything(&'static str);

    impl OcrEngine for ReadsEverything {
        fn detect(&mut self, _image: &RgbImage) -> Result<Vec<Quad>, RecognitionError> {
            Ok(vec![[
                Point::new(2, 2),
                Point::new(30, 2),
                Point::new(30, 12),
                Point::new(2, 12),
            ]])
        }

        fn recognize(&mut self, _crop: &RgbImage) -> Result<Recognition, RecognitionError> {
            Ok(Recognition::new(self.0, 0.5))
        }
    }

    #[test]
    fn test_save_then_reopen() {
        let fixture = Fixture::new();
        let image = fixture.image("1.jpg", 64, 32);

        let mut session = fixture.session();
        assert_eq!(session.images(), &[image.clone()]);
        session.load_image(&image).unwrap();
        session.shapes_mut().unwrap().push(rect("hi", 0, 0, 10, 10));
        session.save_image().unwrap();
        session.save_all().unwrap();

        let mut reopened = fixture.session();
        assert_eq!(reopened.status().completed, 1);
        let shapes = reopened.load_image(&image).unwrap();
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].label(), "hi");
    }

    #[test]
    fn test_operations_need_an_image() {
        let fixture = Fixture::new();
        let mut session = fixture.session();
        assert!(matches!(
            session.save_image(),
            Err(SessionError::NoImageLoaded)
        ));
        assert!(matches!(
            session.toggle_lock(&[0]),
            Err(SessionError::NoImageLoaded)
        ));
        assert!(session.shapes().is_empty());
    }

    #[test]
    fn test_locked_shapes_follow_to_next_image() {
        let fixture = Fixture::new();
        let first = fixture.image("1.jpg", 100, 100);
        let second = fixture.image("2.jpg", 200, 50);

        let mut session = fixture.session();
        session.load_image(&first).unwrap();
        session.shapes_mut().unwrap().push(rect("title", 10, 10, 50, 20));
        assert!(session.toggle_lock(&[0]).unwrap());

        let shapes = session.load_image(&second).unwrap();
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].label(), "");
        assert_eq!(shapes[0].points()[0], Point::new(20, 5));
        assert_eq!(shapes[0].points()[2], Point::new(120, 15));

        session.shapes_mut().unwrap()[0].set_label("other title");
        session.save_image().unwrap();
        let key = ImageKey::from_path(&second).unwrap();
        let stored = session.store().shapes_for(&key).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].transcription, "other title");
    }

    #[test]
    fn test_reload_does_not_duplicate_locked_shapes() {
        let fixture = Fixture::new();
        let image = fixture.image("1.jpg", 100, 100);

        let mut session = fixture.session();
        session.load_image(&image).unwrap();
        session.shapes_mut().unwrap().push(rect("keep", 10, 10, 40, 20));
        session.toggle_lock(&[0]).unwrap();
        session.save_image().unwrap();

        let shapes = session.load_image(&image).unwrap();
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].label(), "keep");
    }

    #[test]
    fn test_revisit_keeps_text_saved_on_locked_box() {
        let fixture = Fixture::new();
        let first = fixture.image("1.jpg", 100, 100);
        let second = fixture.image("2.jpg", 100, 100);
        let third = fixture.image("3.jpg", 100, 100);

        let mut session = fixture.session();
        session.load_image(&first).unwrap();
        session.shapes_mut().unwrap().push(rect("title", 10, 10, 50, 20));
        session.toggle_lock(&[0]).unwrap();

        session.load_image(&second).unwrap();
        session.shapes_mut().unwrap()[0].set_label("foo");
        session.shapes_mut().unwrap()[0].set_key_cls("header");
        session.save_image().unwrap();

        session.load_image(&third).unwrap();
        session.save_image().unwrap();

        let shapes = session.load_image(&second).unwrap();
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].label(), "foo");
        assert_eq!(shapes[0].key_cls(), "header");
        assert!(shapes[0].is_locked());

        session.save_image().unwrap();
        let key = ImageKey::from_path(&second).unwrap();
        let stored = session.store().shapes_for(&key).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].transcription, "foo");
    }

    #[test]
    fn test_deleted_locked_box_is_not_saved_back() {
        let fixture = Fixture::new();
        let first = fixture.image("1.jpg", 100, 100);
        let second = fixture.image("2.jpg", 100, 100);
        let third = fixture.image("3.jpg", 100, 100);

        let mut session = fixture.session();
        session.load_image(&first).unwrap();
        session.shapes_mut().unwrap().push(rect("title", 10, 10, 50, 20));
        session.toggle_lock(&[0]).unwrap();

        session.load_image(&second).unwrap();
        session.shapes_mut().unwrap().clear();
        session.save_image().unwrap();

        let key = ImageKey::from_path(&second).unwrap();
        assert!(session.store().shapes_for(&key).unwrap().is_empty());
        assert!(session.locked().is_empty());

        // The lock ended with the deletion, so nothing follows to the next image
        assert!(session.load_image(&third).unwrap().is_empty());
    }

    #[test]
    fn test_locked_box_on_other_image_saves_its_own_text() {
        let fixture = Fixture::new();
        let first = fixture.image("1.jpg", 100, 100);
        let second = fixture.image("2.jpg", 100, 100);

        let mut session = fixture.session();
        session.load_image(&first).unwrap();
        session.shapes_mut().unwrap().push(rect("title", 10, 10, 50, 20));
        session.toggle_lock(&[0]).unwrap();

        session.load_image(&second).unwrap();
        session.save_image().unwrap();

        let key = ImageKey::from_path(&second).unwrap();
        let stored = session.store().shapes_for(&key).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].transcription, "");
    }

    #[test]
    fn test_unlock_clears_ratios() {
        let fixture = Fixture::new();
        let image = fixture.image("1.jpg", 100, 100);

        let mut session = fixture.session();
        session.load_image(&image).unwrap();
        session.shapes_mut().unwrap().push(rect("x", 10, 10, 40, 20));
        assert!(session.toggle_lock(&[0]).unwrap());
        assert!(!session.toggle_lock(&[]).unwrap());
        assert!(session.locked().is_empty());
        assert!(!session.shapes()[0].is_locked());
    }

    #[test]
    fn test_rotate_swaps_dimensions() {
        let fixture = Fixture::new();
        let image = fixture.image("1.jpg", 80, 40);

        let mut session = fixture.session();
        session.load_image(&image).unwrap();
        session.shapes_mut().unwrap().push(rect("x", 40, 20, 20, 10));
        session.toggle_lock(&[0]).unwrap();

        let shapes = session.rotate_image(true).unwrap();
        assert_eq!(shapes[0].points()[0], Point::new(20, 40));
        assert_eq!(session.current_size(), Some((40, 80)));
        assert_eq!(image::image_dimensions(&image).unwrap(), (40, 80));
    }

    #[test]
    fn test_delete_image_forgets_everything() {
        let fixture = Fixture::new();
        let image = fixture.image("1.jpg", 32, 32);

        let mut session = fixture.session();
        session.load_image(&image).unwrap();
        session.shapes_mut().unwrap().push(rect("x", 0, 0, 10, 10));
        session.save_image().unwrap();
        session.delete_image(&image).unwrap();

        assert!(!image.exists());
        assert!(session.images().is_empty());
        assert!(session.current_path().is_none());
        assert_eq!(fs::read_to_string(session.store().label_path()).unwrap(), "");
        assert_eq!(
            fs::read_to_string(session.store().file_state_path()).unwrap(),
            ""
        );
    }

    #[test]
    fn test_auto_then_re_recognize() {
        let fixture = Fixture::new();
        let image = fixture.image("1.jpg", 40, 20);

        let mut session = fixture.session();
        let report = session.auto_recognize(&mut ReadsEverything("auto")).unwrap();
        assert_eq!(report.shapes_stored, 1);

        let shapes = session.load_image(&image).unwrap();
        assert_eq!(shapes[0].label(), "auto");

        let changed = session.re_recognize(&mut ReadsEverything("")).unwrap();
        assert_eq!(changed.changed, 1);
        assert_eq!(session.shapes()[0].label(), "TEMPORARY");
    }

    #[test]
    fn test_export_by_dialect() {
        let fixture = Fixture::new();
        let image = fixture.image("1.jpg", 32, 32);

        let mut session = fixture.session();
        assert!(matches!(
            session.export_detection(&ExportOptions::new()),
            Err(SessionError::Export(ExportError::EmptyExportPrecondition { .. }))
        ));

        session.load_image(&image).unwrap();
        session.shapes_mut().unwrap().push(rect("X", 0, 0, 10, 10));
        session.save_image().unwrap();

        let result = session.export_detection(&ExportOptions::new()).unwrap();
        assert_eq!(result.images_exported, 1);
        assert!(fixture.project.join("det_label.json").exists());

        let result = session.export_current_crops(&ExportOptions::new()).unwrap();
        assert_eq!(result.annotations_exported, 1);
        assert!(fixture.project.join("rec_gt_1.txt").exists());

        assert!(matches!(
            session.export("voc", &ExportOptions::new()),
            Err(SessionError::Export(ExportError::UnknownExporter(_)))
        ));
    }
}
