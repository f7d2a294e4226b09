//! Tests for the line-dialect recognition exporter.

use super::{TestProject, collinear, rect};
use crate::export::formats::{RecPaddleExporter, export_single_image};
use crate::export::{DatasetExporter, ExportOptions, WarningKind};

#[test]
fn test_rec_metadata() {
    let exporter = RecPaddleExporter;
    assert_eq!(exporter.id(), "rec");
    assert_eq!(exporter.output_file(), "rec_label.txt");
}

#[test]
fn test_rec_skips_degenerate_and_difficult() {
    let mut project = TestProject::new();
    let image = project.add_image("1.jpg", 100, 60);
    project.confirm(
        &image,
        vec![
            rect("hello", 10, 10, 40, 20),
            collinear("bad"),
            rect("hidden", 60, 10, 20, 20).with_difficult(true),
            rect("world", 10, 35, 60, 20),
        ],
    );

    let result = project.export(&RecPaddleExporter);

    assert_eq!(
        project.read("rec_label.txt"),
        "crop_img/1_crop_0.jpg\thello\ncrop_img/1_crop_3.jpg\tworld\n"
    );
    assert_eq!(result.annotations_exported, 2);

    let degenerate: Vec<_> = result.warnings_of(WarningKind::DegenerateGeometry).collect();
    assert_eq!(degenerate.len(), 1);
    assert_eq!(degenerate[0].shape_index, Some(1));
    assert_eq!(degenerate[0].image.as_ref().unwrap().as_str(), "a/1.jpg");

    let crop = image::open(project.project.join("crop_img/1_crop_0.jpg")).unwrap();
    assert_eq!((crop.width(), crop.height()), (40, 20));
    assert!(!project.project.join("crop_img/1_crop_1.jpg").exists());
    assert!(!project.project.join("crop_img/1_crop_2.jpg").exists());
}

#[test]
fn test_rec_polygon_is_reduced() {
    let mut project = TestProject::new();
    let image = project.add_image("1.jpg", 120, 60);
    let polygon = crate::model::ShapeRecord::new(
        "poly",
        [(10, 10), (50, 10), (90, 10), (90, 30), (50, 30), (10, 30)]
            .into_iter()
            .map(crate::model::Point::from)
            .collect(),
    );
    project.confirm(&image, vec![polygon]);

    let result = project.export(&RecPaddleExporter);

    assert_eq!(result.annotations_exported, 1);
    let crop = image::open(project.project.join("crop_img/1_crop_0.jpg")).unwrap();
    assert_eq!((crop.width(), crop.height()), (80, 20));
}

#[test]
fn test_rec_unreadable_image_continues() {
    let mut project = TestProject::new();
    let broken = project.project.join("0.jpg");
    std::fs::write(&broken, b"not an image").unwrap();
    project.confirm(&broken, vec![rect("lost", 0, 0, 5, 5)]);
    let good = project.add_image("1.jpg", 40, 40);
    project.confirm(&good, vec![rect("kept", 5, 5, 20, 10)]);

    let result = project.export(&RecPaddleExporter);

    assert_eq!(result.warnings_of(WarningKind::UnreadableImage).count(), 1);
    assert_eq!(project.read("rec_label.txt"), "crop_img/1_crop_0.jpg\tkept\n");
}

#[test]
fn test_rec_rerun_is_byte_identical() {
    let mut project = TestProject::new();
    let image = project.add_image("1.jpg", 50, 50);
    project.confirm(&image, vec![rect("a", 5, 5, 30, 12)]);

    project.export(&RecPaddleExporter);
    let label = project.read("rec_label.txt");
    let crop = std::fs::read(project.project.join("crop_img/1_crop_0.jpg")).unwrap();

    project.export(&RecPaddleExporter);
    assert_eq!(project.read("rec_label.txt"), label);
    assert_eq!(
        std::fs::read(project.project.join("crop_img/1_crop_0.jpg")).unwrap(),
        crop
    );
}

#[test]
fn test_single_image_export() {
    let mut project = TestProject::new();
    let image = project.add_image("scan.jpg", 60, 40);
    project.confirm(
        &image,
        vec![rect("top", 5, 5, 40, 10), rect("bottom", 5, 20, 40, 10)],
    );

    let result = export_single_image(&project.store, &image, &ExportOptions::new()).unwrap();

    assert_eq!(result.annotations_exported, 2);
    assert_eq!(
        project.read("rec_gt_scan.txt"),
        "scan_0.jpg\ttop\nscan_1.jpg\tbottom\n"
    );
    assert!(project.project.join("crop_img/scan_1.jpg").exists());
}
