//! Recognition crops shared by the recognition exporters.

use std::io::Cursor;

use image::{ImageFormat, RgbImage};

use crate::export::dataset::{DatasetEntry, ExportDataset};
use crate::export::error::ExportError;
use crate::export::traits::{EncodedCrop, ExportResult, ExportWarning, WarningKind};
use crate::geometry;
use crate::model::ImageKey;

/// One recognition sample: a crop file and its transcription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RecSample {
    pub file_name: String,
    pub text: String,
}

/// Crops for a whole dataset plus the bookkeeping gathered on the way.
#[derive(Debug, Default)]
pub(crate) struct CropBatch {
    pub samples: Vec<RecSample>,
    pub crops: Vec<EncodedCrop>,
    pub result: ExportResult,
}

/// Rectify every non-difficult shape of every image.
///
/// `name_crop` receives the image key and the shape's index in its image;
/// difficult shapes still consume an index. Missing or unreadable images
/// and degenerate shapes are skipped and reported.
pub(crate) fn collect_crops(
    dataset: &ExportDataset,
    name_crop: impl Fn(&ImageKey, usize) -> String,
) -> Result<CropBatch, ExportError> {
    let mut batch = CropBatch::default();

    for entry in dataset.entries() {
        let Some(image) = load_image(entry, &mut batch.result) else {
            continue;
        };
        batch.result.images_exported += 1;

        for (index, shape) in entry.shapes.iter().enumerate() {
            if shape.difficult {
                continue;
            }

            let crop = geometry::reduce_to_quad(&shape.points)
                .and_then(|quad| geometry::rectify_crop(&image, &quad));
            let Some(crop) = crop else {
                batch.result.add_warning(
                    ExportWarning::new(
                        WarningKind::DegenerateGeometry,
                        format!("cannot rectify '{}'", shape.transcription),
                    )
                    .with_image(&entry.key)
                    .with_shape(index),
                );
                continue;
            };

            let file_name = name_crop(&entry.key, index);
            batch.crops.push(EncodedCrop {
                file_name: file_name.clone(),
                bytes: encode_jpeg(&crop)?,
            });
            batch.samples.push(RecSample {
                file_name,
                text: shape.transcription.clone(),
            });
            batch.result.annotations_exported += 1;
        }
    }

    Ok(batch)
}

/// Decode an entry's image, recording a warning when that is not possible.
pub(crate) fn load_image(entry: &DatasetEntry, result: &mut ExportResult) -> Option<RgbImage> {
    if !check_source(entry, result) {
        return None;
    }

    match image::open(&entry.image_path) {
        Ok(image) => Some(image.to_rgb8()),
        Err(e) => {
            result.add_warning(
                ExportWarning::new(WarningKind::UnreadableImage, e.to_string())
                    .with_image(&entry.key),
            );
            None
        }
    }
}

/// Record a warning for an image file that no longer exists.
///
/// Returns true when the file is present.
pub(crate) fn check_source(entry: &DatasetEntry, result: &mut ExportResult) -> bool {
    if entry.image_path.is_file() {
        return true;
    }
    result.add_warning(
        ExportWarning::new(
            WarningKind::MissingSourceImage,
            format!("{:?} not found", entry.image_path),
        )
        .with_image(&entry.key),
    );
    false
}

/// Encode a crop as JPEG.
pub(crate) fn encode_jpeg(image: &RgbImage) -> Result<Vec<u8>, ExportError> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg)?;
    Ok(bytes)
}
