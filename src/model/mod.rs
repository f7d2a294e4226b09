//! Data models for text-region annotations.

mod key;
mod point;
mod shape;

pub use key::ImageKey;
pub use point::{Point, RatioPoint};
pub use shape::{LockedShape, MIN_SHAPE_POINTS, Shape, ShapeError, ShapeRecord};
