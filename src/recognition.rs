//! OCR engine contract and the batch drivers built on it.
//!
//! The engine itself is an external collaborator: given a whole image it
//! returns text boxes, given a rectified crop it returns a transcription.
//! An empty transcription means "no text found". Calls are synchronous and
//! never retried.

use std::path::{Path, PathBuf};

use image::RgbImage;
use thiserror::Error;

use crate::geometry::{self, Quad};
use crate::model::{Shape, ShapeRecord};
use crate::store::{LabelStore, SaveMode, StoreError};

/// Errors from recognition.
#[derive(Error, Debug)]
pub enum RecognitionError {
    /// The engine reported a failure
    #[error("OCR engine error: {0}")]
    Engine(String),

    /// The image could not be decoded
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Results could not be stored
    #[error("Label store error: {0}")]
    Store(#[from] StoreError),
}

/// One recognized text line.
#[derive(Debug, Clone, PartialEq)]
pub struct Recognition {
    pub text: String,
    pub confidence: f32,
}

impl Recognition {
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            text: text.into(),
            confidence,
        }
    }

    /// Whether the engine found no text.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Text detector and recognizer.
pub trait OcrEngine {
    /// Find text regions in a full image.
    fn detect(&mut self, image: &RgbImage) -> Result<Vec<Quad>, RecognitionError>;

    /// Read the text of a rectified crop.
    fn recognize(&mut self, crop: &RgbImage) -> Result<Recognition, RecognitionError>;
}

/// Outcome of [`auto_recognize`].
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Images whose results were stored.
    pub images_processed: usize,
    /// Shapes stored across all images.
    pub shapes_stored: usize,
    /// Images that failed, with the reason. The batch continued past each.
    pub failures: Vec<(PathBuf, String)>,
}

/// Outcome of [`re_recognize`].
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReRecognition {
    /// Shapes whose label changed.
    pub changed: usize,
    /// Shapes that could not be re-read, with the reason.
    pub skipped: Vec<(usize, String)>,
}

/// Detect and recognize every image that has not been confirmed yet.
///
/// Results go to the recognition cache only; shapes the recognizer could
/// not read are dropped. The cache file is rewritten once at the end.
pub fn auto_recognize(
    store: &mut LabelStore,
    images: &[PathBuf],
    engine: &mut dyn OcrEngine,
) -> Result<BatchReport, RecognitionError> {
    let mut report = BatchReport::default();
    let pending: Vec<&PathBuf> = images.iter().filter(|p| !store.is_complete(p)).collect();
    log::info!(
        "Auto recognition over {} of {} images",
        pending.len(),
        images.len()
    );

    for path in pending {
        match recognize_image(path, engine) {
            Ok(records) => {
                let outcome = store.put(path, records, SaveMode::Auto)?;
                report.images_processed += 1;
                report.shapes_stored += outcome.stored;
                log::debug!("{:?}: {} text boxes", path, outcome.stored);
            }
            Err(e) => {
                log::warn!("Auto recognition failed for {:?}: {}", path, e);
                report.failures.push((path.clone(), e.to_string()));
            }
        }
    }

    store.save_cache()?;
    log::info!(
        "Auto recognition stored {} shapes for {} images ({} failures)",
        report.shapes_stored,
        report.images_processed,
        report.failures.len()
    );
    Ok(report)
}

fn recognize_image(
    path: &Path,
    engine: &mut dyn OcrEngine,
) -> Result<Vec<ShapeRecord>, RecognitionError> {
    let image = image::open(path)?.to_rgb8();
    let mut records = Vec::new();
    for quad in engine.detect(&image)? {
        let Some(crop) = geometry::rectify_crop(&image, &quad) else {
            log::debug!("{:?}: skipping degenerate detection {:?}", path, quad);
            continue;
        };
        let recognition = engine.recognize(&crop)?;
        records.push(ShapeRecord::new(recognition.text, quad.to_vec()));
    }
    Ok(records)
}

/// Re-read the text of existing shapes on an image.
///
/// Polygons are reduced to quads for cropping; the shapes keep their
/// outline. A box the recognizer cannot read is labelled `no_label_text`.
/// Degenerate boxes and engine failures skip that shape only.
pub fn re_recognize<'a>(
    image: &RgbImage,
    shapes: impl IntoIterator<Item = &'a mut Shape>,
    engine: &mut dyn OcrEngine,
    no_label_text: &str,
) -> ReRecognition {
    let mut report = ReRecognition::default();

    for (index, shape) in shapes.into_iter().enumerate() {
        let crop = geometry::reduce_to_quad(shape.points())
            .and_then(|quad| geometry::rectify_crop(image, &quad));
        let Some(crop) = crop else {
            log::warn!("Cannot re-recognize shape {}: degenerate box", index);
            report.skipped.push((index, "degenerate box".to_string()));
            continue;
        };

        let recognition = match engine.recognize(&crop) {
            Ok(recognition) => recognition,
            Err(e) => {
                log::warn!("Cannot re-recognize shape {}: {}", index, e);
                report.skipped.push((index, e.to_string()));
                continue;
            }
        };

        let text = if recognition.is_empty() {
            no_label_text
        } else {
            recognition.text.as_str()
        };
        if shape.label() != text {
            shape.set_label(text);
            report.changed += 1;
        }
    }

    log::info!(
        "Re-recognition changed {} labels ({} skipped)",
        report.changed,
        report.skipped.len()
    );
    report
}
