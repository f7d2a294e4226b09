//! Recognition labels, MMOCR dialect.

use serde::Serialize;

use crate::constants::{CROP_DIR, REC_LABEL_JSON_FILE};
use crate::export::dataset::ExportDataset;
use crate::export::error::ExportError;
use crate::export::formats::crops::collect_crops;
use crate::export::traits::{DatasetExporter, RenderedExport};

/// Recognition exporter writing `rec_label.json` as an MMOCR `TextRecogDataset`.
pub struct RecMmocrExporter;

#[derive(Debug, Serialize)]
struct RecDocument {
    metainfo: RecMetainfo,
    data_list: Vec<RecSampleEntry>,
}

#[derive(Debug, Serialize)]
struct RecMetainfo {
    dataset_type: &'static str,
    task_name: &'static str,
}

#[derive(Debug, Serialize)]
struct RecSampleEntry {
    img_path: String,
    instances: Vec<RecInstance>,
}

#[derive(Debug, Serialize)]
struct RecInstance {
    text: String,
}

impl DatasetExporter for RecMmocrExporter {
    fn id(&self) -> &'static str {
        "rec-mm"
    }

    fn display_name(&self) -> &'static str {
        "Recognition crops (MMOCR)"
    }

    fn output_file(&self) -> &'static str {
        REC_LABEL_JSON_FILE
    }

    fn render(&self, dataset: &ExportDataset) -> Result<RenderedExport, ExportError> {
        let batch = collect_crops(dataset, |key, index| {
            format!("{}_{}.jpg", key.file_stem(), index)
        })?;

        let document = RecDocument {
            metainfo: RecMetainfo {
                dataset_type: "TextRecogDataset",
                task_name: "textrecog",
            },
            data_list: batch
                .samples
                .into_iter()
                .map(|sample| RecSampleEntry {
                    img_path: format!("{}/{}", CROP_DIR, sample.file_name),
                    instances: vec![RecInstance { text: sample.text }],
                })
                .collect(),
        };

        Ok(RenderedExport {
            contents: serde_json::to_vec(&document)?,
            crops: batch.crops,
            result: batch.result,
        })
    }
}
