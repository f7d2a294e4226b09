//! Pixel and ratio coordinates.

use serde::{Deserialize, Serialize};

/// Integer pixel coordinate within an image.
///
/// Serialized as a two-element array `[x, y]`. Deserialization also accepts
/// floating point pairs (as produced by detectors) and truncates them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[i32; 2]")]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    /// Create a new point.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Point) -> f64 {
        let dx = f64::from(self.x - other.x);
        let dy = f64::from(self.y - other.y);
        dx.hypot(dy)
    }
}

impl From<[f64; 2]> for Point {
    fn from([x, y]: [f64; 2]) -> Self {
        Self {
            x: x as i32,
            y: y as i32,
        }
    }
}

impl From<Point> for [i32; 2] {
    fn from(p: Point) -> Self {
        [p.x, p.y]
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// A point expressed as a fraction of the owning image's width and height.
///
/// Ratio points are what make locked shapes survive rotation and rescaling:
/// they are materialized against whatever dimensions the image has when it
/// is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct RatioPoint {
    pub x: f64,
    pub y: f64,
}

impl RatioPoint {
    /// Convert an absolute point into a ratio of the given image size.
    ///
    /// Zero dimensions yield a zero ratio instead of NaN.
    pub fn from_point(point: Point, width: u32, height: u32) -> Self {
        let ratio = |v: i32, extent: u32| {
            if extent == 0 {
                0.0
            } else {
                f64::from(v) / f64::from(extent)
            }
        };
        Self {
            x: ratio(point.x, width),
            y: ratio(point.y, height),
        }
    }

    /// Materialize this ratio against concrete image dimensions.
    pub fn to_point(&self, width: u32, height: u32) -> Point {
        Point {
            x: (self.x * f64::from(width)).round() as i32,
            y: (self.y * f64::from(height)).round() as i32,
        }
    }

    /// Whether both components lie in `[0, 1]`.
    pub fn is_within_unit(&self) -> bool {
        (0.0..=1.0).contains(&self.x) && (0.0..=1.0).contains(&self.y)
    }
}

impl From<[f64; 2]> for RatioPoint {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

impl From<RatioPoint> for [f64; 2] {
    fn from(p: RatioPoint) -> Self {
        [p.x, p.y]
    }
}
