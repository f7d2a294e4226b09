//! Editable text-region shapes and their serialized forms.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::KEY_CLS_NONE;
use crate::geometry;
use crate::model::point::{Point, RatioPoint};

/// Minimum number of vertices for a valid shape (a quad).
pub const MIN_SHAPE_POINTS: usize = 4;

/// Errors raised when constructing or editing a [`Shape`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    /// Fewer than [`MIN_SHAPE_POINTS`] vertices were supplied.
    #[error("shape needs at least 4 points, got {count}")]
    TooFewPoints { count: usize },

    /// Two non-adjacent edges of the ring cross each other.
    #[error("shape outline intersects itself")]
    SelfIntersecting,
}

/// A labeled quad or polygon annotation on one image.
///
/// Locked shapes additionally carry their vertices as ratios of the image
/// size at lock time. Their absolute points are recomputed with
/// [`Shape::materialize`] whenever the owning image is (re)loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    points: Vec<Point>,
    label: String,
    key_cls: String,
    difficult: bool,
    ratio: Option<Vec<RatioPoint>>,
}

impl Shape {
    /// Create a shape, validating its outline.
    pub fn new(
        points: Vec<Point>,
        label: impl Into<String>,
        key_cls: impl Into<String>,
    ) -> Result<Self, ShapeError> {
        validate_points(&points)?;
        Ok(Self {
            points,
            label: label.into(),
            key_cls: key_cls.into(),
            difficult: false,
            ratio: None,
        })
    }

    /// Rebuild a shape from its stored form.
    pub fn from_record(record: &ShapeRecord) -> Result<Self, ShapeError> {
        let mut shape = Self::new(
            record.points.clone(),
            record.transcription.clone(),
            record.key_cls.clone(),
        )?;
        shape.difficult = record.difficult;
        Ok(shape)
    }

    /// Rebuild a locked shape at the given image dimensions.
    ///
    /// When `keep_label` is false the transcription is cleared; a locked
    /// box carried over to a different image keeps its region, not its text.
    pub fn from_locked(
        locked: &LockedShape,
        width: u32,
        height: u32,
        keep_label: bool,
    ) -> Result<Self, ShapeError> {
        let points = locked.points_at(width, height);
        let label = if keep_label {
            locked.transcription.clone()
        } else {
            String::new()
        };
        let mut shape = Self::new(points, label, locked.key_cls.clone())?;
        shape.difficult = locked.difficult;
        shape.ratio = Some(locked.ratio.clone());
        Ok(shape)
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn key_cls(&self) -> &str {
        &self.key_cls
    }

    pub fn is_difficult(&self) -> bool {
        self.difficult
    }

    pub fn is_locked(&self) -> bool {
        self.ratio.is_some()
    }

    /// Ratio representation, present only while locked.
    pub fn ratio(&self) -> Option<&[RatioPoint]> {
        self.ratio.as_deref()
    }

    /// Whether the shape is a plain quad (as opposed to a polygon).
    pub fn is_quad(&self) -> bool {
        self.points.len() == MIN_SHAPE_POINTS
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    pub fn set_difficult(&mut self, difficult: bool) {
        self.difficult = difficult;
    }

    pub fn set_key_cls(&mut self, key_cls: impl Into<String>) {
        self.key_cls = key_cls.into();
    }

    /// Replace the outline (e.g. after the user drags a vertex).
    ///
    /// A locked shape keeps its old ratios until it is locked again.
    pub fn set_points(&mut self, points: Vec<Point>) -> Result<(), ShapeError> {
        validate_points(&points)?;
        self.points = points;
        Ok(())
    }

    /// Lock the shape against the current image size.
    ///
    /// Recomputes the ratios from the current points on every call, so
    /// locking twice at the same size yields the same ratios.
    pub fn lock(&mut self, image_width: u32, image_height: u32) -> LockedShape {
        let ratio: Vec<RatioPoint> = self
            .points
            .iter()
            .map(|p| RatioPoint::from_point(*p, image_width, image_height))
            .collect();
        if ratio.iter().any(|r| !r.is_within_unit()) {
            log::debug!(
                "Locked shape '{}' extends outside the {}x{} image",
                self.label,
                image_width,
                image_height
            );
        }
        self.ratio = Some(ratio.clone());
        LockedShape {
            transcription: self.label.clone(),
            ratio,
            difficult: self.difficult,
            key_cls: self.key_cls.clone(),
        }
    }

    /// Drop the ratio representation, returning the shape to normal.
    pub fn unlock(&mut self) {
        self.ratio = None;
    }

    /// Recompute the absolute points of a locked shape for new image dimensions.
    ///
    /// No-op for unlocked shapes.
    pub fn materialize(&mut self, image_width: u32, image_height: u32) {
        if let Some(ratio) = &self.ratio {
            self.points = ratio
                .iter()
                .map(|r| r.to_point(image_width, image_height))
                .collect();
        }
    }

    /// Serialized form written to label and cache files.
    ///
    /// Always the absolute points. The ratio form of a locked shape is
    /// session state and lives only in [`LockedShape`]; label files never
    /// carry it.
    pub fn serialize(&self) -> ShapeRecord {
        ShapeRecord {
            transcription: self.label.clone(),
            points: self.points.clone(),
            difficult: self.difficult,
            key_cls: self.key_cls.clone(),
        }
    }
}

fn validate_points(points: &[Point]) -> Result<(), ShapeError> {
    if points.len() < MIN_SHAPE_POINTS {
        return Err(ShapeError::TooFewPoints {
            count: points.len(),
        });
    }
    if !geometry::is_simple_polygon(points) {
        return Err(ShapeError::SelfIntersecting);
    }
    Ok(())
}

fn default_key_cls() -> String {
    KEY_CLS_NONE.to_string()
}

/// One shape as stored in `Label.txt` and `Cache.cach`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeRecord {
    pub transcription: String,
    pub points: Vec<Point>,
    #[serde(default)]
    pub difficult: bool,
    #[serde(default = "default_key_cls")]
    pub key_cls: String,
}

impl ShapeRecord {
    /// Create a record with default flags.
    pub fn new(transcription: impl Into<String>, points: Vec<Point>) -> Self {
        Self {
            transcription: transcription.into(),
            points,
            difficult: false,
            key_cls: default_key_cls(),
        }
    }

    pub fn with_difficult(mut self, difficult: bool) -> Self {
        self.difficult = difficult;
        self
    }

    pub fn with_key_cls(mut self, key_cls: impl Into<String>) -> Self {
        self.key_cls = key_cls.into();
        self
    }
}

/// Ratio-based form of a locked shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockedShape {
    pub transcription: String,
    pub ratio: Vec<RatioPoint>,
    #[serde(default)]
    pub difficult: bool,
    #[serde(default = "default_key_cls")]
    pub key_cls: String,
}

impl LockedShape {
    /// Absolute points for the given image dimensions.
    pub fn points_at(&self, width: u32, height: u32) -> Vec<Point> {
        self.ratio.iter().map(|r| r.to_point(width, height)).collect()
    }
}
