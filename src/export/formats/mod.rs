//! Dataset exporter implementations.

mod crops;
mod det_mmocr;
mod det_paddle;
mod kie;
mod rec_mmocr;
mod rec_paddle;

#[cfg(test)]
mod tests;

pub use det_mmocr::DetMmocrExporter;
pub use det_paddle::DetPaddleExporter;
pub use kie::{KieExporter, split_objects};
pub use rec_mmocr::RecMmocrExporter;
pub use rec_paddle::{RecPaddleExporter, export_single_image};
