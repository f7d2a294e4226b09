//! Tests for the MMOCR detection exporter.

use super::{TestProject, rect};
use crate::export::formats::DetMmocrExporter;
use crate::model::{Point, ShapeRecord};

#[test]
fn test_det_mm_document() {
    let mut project = TestProject::new();
    let image = project.add_image("1.jpg", 40, 30);
    project.confirm(
        &image,
        vec![
            rect("X", 2, 3, 10, 5),
            rect("Y", 20, 10, 4, 4).with_difficult(true),
        ],
    );

    let result = project.export(&DetMmocrExporter);
    assert_eq!(result.annotations_exported, 2);

    let doc: serde_json::Value = serde_json::from_str(&project.read("det_label.json")).unwrap();
    assert_eq!(doc["metainfo"]["dataset_type"], "TextDetDataset");
    assert_eq!(doc["metainfo"]["task_name"], "textdet");
    assert_eq!(doc["metainfo"]["category"][0]["name"], "text");

    let sample = &doc["data_list"][0];
    assert_eq!(sample["img_path"], "1.jpg");
    assert_eq!(sample["width"], 40);
    assert_eq!(sample["height"], 30);
    assert_eq!(sample["seg_map"], "1.txt");

    let first = &sample["instances"][0];
    assert_eq!(first["polygon"], serde_json::json!([2, 3, 12, 3, 12, 8, 2, 8]));
    assert_eq!(first["bbox"], serde_json::json!([2.0, 3.0, 12.0, 8.0]));
    assert_eq!(first["bbox_label"], 0);
    assert_eq!(first["ignore"], false);
    assert_eq!(sample["instances"][1]["ignore"], true);
}

#[test]
fn test_det_mm_polygon_keeps_point_order_and_full_bbox() {
    let mut project = TestProject::new();
    let image = project.add_image("1.jpg", 64, 64);
    let points = vec![
        Point::new(30, 5),
        Point::new(5, 5),
        Point::new(5, 20),
        Point::new(30, 20),
        Point::new(50, 40),
    ];
    project.confirm(&image, vec![ShapeRecord::new("poly", points)]);

    project.export(&DetMmocrExporter);

    let doc: serde_json::Value = serde_json::from_str(&project.read("det_label.json")).unwrap();
    let instance = &doc["data_list"][0]["instances"][0];
    assert_eq!(
        instance["polygon"],
        serde_json::json!([30, 5, 5, 5, 5, 20, 30, 20])
    );
    assert_eq!(instance["bbox"], serde_json::json!([5.0, 5.0, 50.0, 40.0]));
}

#[test]
fn test_det_mm_rerun_is_byte_identical() {
    let mut project = TestProject::new();
    for name in ["1.jpg", "2.jpg"] {
        let image = project.add_image(name, 24, 16);
        project.confirm(
            &image,
            vec![
                rect("ünï", 1, 1, 5, 5),
                rect("###", 8, 2, 6, 6).with_difficult(true),
            ],
        );
    }

    project.export(&DetMmocrExporter);
    let first = std::fs::read(project.project.join("det_label.json")).unwrap();
    project.export(&DetMmocrExporter);
    assert_eq!(
        std::fs::read(project.project.join("det_label.json")).unwrap(),
        first
    );
}
