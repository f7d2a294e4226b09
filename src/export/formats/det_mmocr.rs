//! Detection labels, MMOCR dialect.
//!
//! A single JSON document with a `metainfo` header and one `data_list`
//! entry per image. Each instance carries the first four points flattened
//! in their stored order, the axis-aligned box over all points, and an
//! `ignore` flag mirroring `difficult`.

use serde::Serialize;

use crate::constants::DET_LABEL_FILE;
use crate::export::dataset::ExportDataset;
use crate::export::error::ExportError;
use crate::export::formats::crops::check_source;
use crate::export::traits::{
    DatasetExporter, ExportResult, ExportWarning, RenderedExport, WarningKind,
};
use crate::geometry;
use crate::model::{MIN_SHAPE_POINTS, ShapeRecord};

/// Detection exporter writing `det_label.json` as an MMOCR `TextDetDataset`.
pub struct DetMmocrExporter;

#[derive(Debug, Serialize)]
struct DetDocument {
    metainfo: DetMetainfo,
    data_list: Vec<DetSample>,
}

#[derive(Debug, Serialize)]
struct DetMetainfo {
    dataset_type: &'static str,
    task_name: &'static str,
    category: Vec<DetCategory>,
}

#[derive(Debug, Serialize)]
struct DetCategory {
    id: u32,
    name: &'static str,
}

#[derive(Debug, Serialize)]
struct DetSample {
    instances: Vec<DetInstance>,
    img_path: String,
    height: u32,
    width: u32,
    seg_map: String,
}

#[derive(Debug, Serialize)]
struct DetInstance {
    polygon: Vec<i32>,
    bbox: [f64; 4],
    bbox_label: u32,
    ignore: bool,
}

impl DetInstance {
    fn from_record(record: &ShapeRecord) -> Option<Self> {
        if record.points.len() < MIN_SHAPE_POINTS {
            return None;
        }
        let [min_x, min_y, max_x, max_y] = geometry::bounding_box(&record.points)?;
        let polygon = record.points[..MIN_SHAPE_POINTS]
            .iter()
            .flat_map(|p| [p.x, p.y])
            .collect();
        Some(Self {
            polygon,
            bbox: [
                f64::from(min_x),
                f64::from(min_y),
                f64::from(max_x),
                f64::from(max_y),
            ],
            bbox_label: 0,
            ignore: record.difficult,
        })
    }
}

impl DatasetExporter for DetMmocrExporter {
    fn id(&self) -> &'static str {
        "det-mm"
    }

    fn display_name(&self) -> &'static str {
        "Detection labels (MMOCR)"
    }

    fn output_file(&self) -> &'static str {
        DET_LABEL_FILE
    }

    fn render(&self, dataset: &ExportDataset) -> Result<RenderedExport, ExportError> {
        let mut result = ExportResult::new();
        let mut data_list = Vec::new();

        for entry in dataset.entries() {
            if !check_source(entry, &mut result) {
                continue;
            }
            let (width, height) = match image::image_dimensions(&entry.image_path) {
                Ok(dims) => dims,
                Err(e) => {
                    result.add_warning(
                        ExportWarning::new(WarningKind::UnreadableImage, e.to_string())
                            .with_image(&entry.key),
                    );
                    continue;
                }
            };

            let mut instances = Vec::with_capacity(entry.shapes.len());
            for (index, shape) in entry.shapes.iter().enumerate() {
                match DetInstance::from_record(shape) {
                    Some(instance) => instances.push(instance),
                    None => result.add_warning(
                        ExportWarning::new(
                            WarningKind::DegenerateGeometry,
                            format!("only {} points", shape.points.len()),
                        )
                        .with_image(&entry.key)
                        .with_shape(index),
                    ),
                }
            }

            result.images_exported += 1;
            result.annotations_exported += instances.len();
            data_list.push(DetSample {
                instances,
                img_path: entry.key.file_name().to_string(),
                height,
                width,
                seg_map: format!("{}.txt", entry.key.file_stem()),
            });
        }

        let document = DetDocument {
            metainfo: DetMetainfo {
                dataset_type: "TextDetDataset",
                task_name: "textdet",
                category: vec![DetCategory { id: 0, name: "text" }],
            },
            data_list,
        };

        Ok(RenderedExport {
            contents: serde_json::to_vec(&document)?,
            crops: Vec::new(),
            result,
        })
    }
}
