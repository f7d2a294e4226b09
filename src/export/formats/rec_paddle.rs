//! Recognition labels, line dialect.
//!
//! Every non-difficult shape is rectified into a crop under `crop_img/` and
//! listed as `crop_img/<crop>\t<transcription>`.

use std::path::Path;

use crate::constants::{CROP_DIR, REC_LABEL_FILE};
use crate::export::dataset::ExportDataset;
use crate::export::error::ExportError;
use crate::export::formats::crops::{RecSample, collect_crops};
use crate::export::traits::{DatasetExporter, ExportOptions, ExportResult, RenderedExport};
use crate::store::LabelStore;

/// Recognition exporter writing `rec_label.txt` plus crops.
pub struct RecPaddleExporter;

impl DatasetExporter for RecPaddleExporter {
    fn id(&self) -> &'static str {
        "rec"
    }

    fn display_name(&self) -> &'static str {
        "Recognition crops (lines)"
    }

    fn output_file(&self) -> &'static str {
        REC_LABEL_FILE
    }

    fn render(&self, dataset: &ExportDataset) -> Result<RenderedExport, ExportError> {
        let batch = collect_crops(dataset, |key, index| {
            format!("{}_crop_{}.jpg", key.file_stem(), index)
        })?;
        Ok(RenderedExport {
            contents: render_lines(&batch.samples, &format!("{}/", CROP_DIR)).into_bytes(),
            crops: batch.crops,
            result: batch.result,
        })
    }
}

fn render_lines(samples: &[RecSample], prefix: &str) -> String {
    samples
        .iter()
        .map(|s| format!("{}{}\t{}\n", prefix, s.file_name, s.text))
        .collect()
}

/// Export the crops of one image as `rec_gt_<stem>.txt`.
///
/// Uses the in-memory manual labels of the image, confirmed or not. Crops
/// are named `<stem>_<index>.jpg` and listed without the folder prefix.
pub fn export_single_image(
    store: &LabelStore,
    image_path: &Path,
    options: &ExportOptions,
) -> Result<ExportResult, ExportError> {
    let dataset = ExportDataset::single(store, image_path)?;
    let batch = collect_crops(&dataset, |key, index| {
        format!("{}_{}.jpg", key.file_stem(), index)
    })?;

    let stem = dataset
        .entries()
        .first()
        .map(|entry| entry.key.file_stem().to_string())
        .unwrap_or_default();
    let rendered = RenderedExport {
        contents: render_lines(&batch.samples, "").into_bytes(),
        crops: batch.crops,
        result: batch.result,
    };

    let output_dir = options
        .output_dir
        .clone()
        .unwrap_or_else(|| store.project_dir().to_path_buf());
    let result = rendered.write(&output_dir, &format!("rec_gt_{}.txt", stem))?;
    result.log_summary("rec-single");
    Ok(result)
}
