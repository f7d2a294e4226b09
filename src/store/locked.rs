//! Locked shapes carried across image loads.
//!
//! The set belongs to the current editing session, not to any image. Each
//! entry stores its vertices as ratios of the image size at lock time and
//! is re-materialized against whatever image is loaded next, so a locked
//! box follows rotations and resizes.

use crate::model::{LockedShape, Shape};

/// Transient set of locked shapes.
#[derive(Debug, Clone, Default)]
pub struct LockedShapes {
    shapes: Vec<LockedShape>,
}

impl LockedShapes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the given shapes if nothing is locked, otherwise unlock everything.
    ///
    /// Returns true when the set ends up non-empty.
    pub fn toggle<'a>(
        &mut self,
        selected: impl IntoIterator<Item = &'a mut Shape>,
        image_width: u32,
        image_height: u32,
    ) -> bool {
        if self.shapes.is_empty() {
            self.lock_all(selected, image_width, image_height);
        } else {
            log::debug!("Unlocking {} shapes", self.shapes.len());
            self.shapes.clear();
        }
        !self.shapes.is_empty()
    }

    /// Replace the set with the given shapes locked at the given size.
    pub fn lock_all<'a>(
        &mut self,
        shapes: impl IntoIterator<Item = &'a mut Shape>,
        image_width: u32,
        image_height: u32,
    ) {
        self.shapes = shapes
            .into_iter()
            .map(|shape| shape.lock(image_width, image_height))
            .collect();
        log::debug!(
            "Locked {} shapes at {}x{}",
            self.shapes.len(),
            image_width,
            image_height
        );
    }

    /// Rebuild the set from the live locked shapes of the current image.
    ///
    /// Picks up edits to their outline or text. A locked box the user
    /// deleted leaves the set; when none is left the set ends up empty.
    pub fn relock<'a>(
        &mut self,
        shapes: impl IntoIterator<Item = &'a mut Shape>,
        image_width: u32,
        image_height: u32,
    ) {
        let relocked: Vec<LockedShape> = shapes
            .into_iter()
            .filter(|shape| shape.is_locked())
            .map(|shape| shape.lock(image_width, image_height))
            .collect();
        if relocked.len() != self.shapes.len() {
            log::debug!(
                "Locked set shrank from {} to {} shapes",
                self.shapes.len(),
                relocked.len()
            );
        }
        self.shapes = relocked;
    }

    /// Live shapes for an image of the given size.
    ///
    /// Transcriptions are kept only when `same_image` is true. Entries that
    /// collapse into an invalid outline at this size are skipped.
    pub fn materialize(&self, image_width: u32, image_height: u32, same_image: bool) -> Vec<Shape> {
        self.shapes
            .iter()
            .filter_map(|locked| {
                Shape::from_locked(locked, image_width, image_height, same_image)
                    .map_err(|e| log::warn!("Skipping locked shape: {}", e))
                    .ok()
            })
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LockedShape> {
        self.shapes.iter()
    }

    pub fn clear(&mut self) {
        self.shapes.clear();
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}
