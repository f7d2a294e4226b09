//! Key-information-extraction labels.
//!
//! Reads the shape list of each image from the raw label text rather than
//! the parsed records: the text is split into its top-level `{...}` objects
//! and each object is parsed on its own, so a line that lost its array
//! brackets still exports. Difficult shapes are dropped entirely and the
//! `None` key class becomes `other`.

use serde::Serialize;

use crate::constants::{KEY_CLS_NONE, KEY_CLS_OTHER, KIE_LABEL_FILE};
use crate::export::dataset::{DatasetEntry, ExportDataset};
use crate::export::error::ExportError;
use crate::export::formats::crops::check_source;
use crate::export::traits::{DatasetExporter, ExportResult, RenderedExport};
use crate::model::{Point, ShapeRecord};
use crate::store::StoreError;
use crate::store::label_file::normalize_literals;

/// KIE exporter writing `kie_label.json` as tab-separated lines.
pub struct KieExporter;

#[derive(Debug, Serialize)]
struct KieAnnotation {
    transcription: String,
    label: String,
    points: Vec<Point>,
    id: usize,
    linking: Vec<[usize; 2]>,
}

/// Split text into its top-level `{...}` objects.
///
/// Braces inside string literals are ignored. Text outside any object
/// (brackets, commas, whitespace) is dropped. An unterminated trailing
/// object is returned as is so that parsing it reports the error.
pub fn split_objects(raw: &str) -> Vec<&str> {
    let mut objects = Vec::new();
    let mut depth = 0usize;
    let mut start = None;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, c) in raw.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => {
                if depth == 0 {
                    start = Some(idx);
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    if let Some(begin) = start.take() {
                        objects.push(&raw[begin..=idx]);
                    }
                }
            }
            _ => {}
        }
    }

    if let Some(begin) = start {
        objects.push(&raw[begin..]);
    }
    objects
}

fn kie_annotations(
    entry: &DatasetEntry,
    dataset: &ExportDataset,
) -> Result<Vec<KieAnnotation>, ExportError> {
    let mut annotations = Vec::new();
    for (seq, object) in split_objects(&entry.raw_shapes).into_iter().enumerate() {
        let record: ShapeRecord = serde_json::from_str(&normalize_literals(object))
            .map_err(|e| StoreError::malformed(dataset.label_path(), entry.line, e.to_string()))?;
        if record.difficult {
            continue;
        }

        let label = if record.key_cls == KEY_CLS_NONE {
            KEY_CLS_OTHER.to_string()
        } else {
            record.key_cls
        };
        annotations.push(KieAnnotation {
            transcription: record.transcription,
            label,
            points: record.points,
            id: seq,
            linking: Vec::new(),
        });
    }
    Ok(annotations)
}

impl DatasetExporter for KieExporter {
    fn id(&self) -> &'static str {
        "kie"
    }

    fn display_name(&self) -> &'static str {
        "Key information extraction"
    }

    fn output_file(&self) -> &'static str {
        KIE_LABEL_FILE
    }

    fn render(&self, dataset: &ExportDataset) -> Result<RenderedExport, ExportError> {
        let mut result = ExportResult::new();
        let mut contents = String::new();

        for entry in dataset.entries() {
            if !check_source(entry, &mut result) {
                continue;
            }
            let annotations = kie_annotations(entry, dataset)?;

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
