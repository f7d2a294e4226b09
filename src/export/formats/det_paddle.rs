//! Detection labels, line dialect.
//!
//! One line per image: `<file name>\t<JSON array of {transcription, points}>`.
//! Difficult regions are kept with the transcription `###` so the detector
//! still learns the box.

use serde::Serialize;

use crate::constants::{DET_LABEL_FILE, DIFFICULT_TRANSCRIPTION};
use crate::export::dataset::ExportDataset;
use crate::export::error::ExportError;
use crate::export::formats::crops::check_source;
use crate::export::traits::{DatasetExporter, ExportResult, RenderedExport};
use crate::model::Point;

/// Detection exporter writing `det_label.json` as tab-separated lines.
pub struct DetPaddleExporter;

#[derive(Debug, Serialize)]
struct DetAnnotation<'a> {
    transcription: &'a str,
    points: &'a [Point],
}

impl DatasetExporter for DetPaddleExporter {
    fn id(&self) -> &'static str {
        "det"
    }

    fn display_name(&self) -> &'static str {
        "Detection labels (lines)"
    }

    fn output_file(&self) -> &'static str {
        DET_LABEL_FILE
    }

    fn render(&self, dataset: &ExportDataset) -> Result<RenderedExport, ExportError> {
        let mut result = ExportResult::new();
        let mut contents = String::new();

        for entry in dataset.entries() {
            if !check_source(entry, &mut result) {
                continue;
            }

            let annotations: Vec<DetAnnotation<'_>> = entry
                .shapes
                .iter()
                .map(|shape| DetAnnotation {
                    transcription: if shape.difficult {
                        DIFFICULT_TRANSCRIPTION
                    } else {
                        shape.transcription.as_str()
                    },
                    points: &shape.points,
                })
                .collect();

            contents.push_str(entry.key.file_name());
            contents.push('\t');
            contents.push_str(&serde_json::to_string(&annotations)?);
            contents.push('\n');

            result.images_exported += 1;
            result.annotations_exported += annotations.len();
        }

        Ok(RenderedExport {
            contents: contents.into_bytes(),
            crops: Vec::new(),
            result,
        })
    }
}
