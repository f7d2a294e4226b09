//! Trait definitions for dataset exporters.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::constants::CROP_DIR;
use crate::export::dataset::ExportDataset;
use crate::export::error::ExportError;
use crate::model::ImageKey;
use crate::utils::write_atomic;

/// Trait for dataset exporters.
///
/// Each output format (detection, recognition, KIE, in both dialects)
/// implements [`render`](DatasetExporter::render), which computes the whole
/// output in memory. The provided [`export`](DatasetExporter::export) only
/// touches the filesystem once rendering has succeeded.
pub trait DatasetExporter: Send + Sync {
    /// Unique identifier for this exporter (e.g., "det", "rec-mm").
    fn id(&self) -> &'static str;

    /// Human-readable name for display.
    fn display_name(&self) -> &'static str;

    /// Name of the label file written into the output directory.
    fn output_file(&self) -> &'static str;

    /// Render the label file and any crop images.
    fn render(&self, dataset: &ExportDataset) -> Result<RenderedExport, ExportError>;

    /// Render and write the export.
    ///
    /// Crops go to `crop_img/` under the output directory, then the label
    /// file replaces any previous one atomically.
    fn export(
        &self,
        dataset: &ExportDataset,
        options: &ExportOptions,
    ) -> Result<ExportResult, ExportError> {
        let output_dir = options
            .output_dir
            .clone()
            .unwrap_or_else(|| dataset.project_dir().to_path_buf());
        log::info!("Exporting {} to {:?}", self.display_name(), output_dir);

        let rendered = self.render(dataset)?;
        let result = rendered.write(&output_dir, self.output_file())?;
        result.log_summary(self.id());
        Ok(result)
    }
}

/// Options for export operations.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Directory receiving the output. Defaults to the project directory.
    pub output_dir: Option<PathBuf>,
}

impl ExportOptions {
    /// Create new export options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Write the output somewhere other than the project directory.
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }
}

/// A rectified, encoded crop ready to be written.
#[derive(Debug, Clone)]
pub struct EncodedCrop {
    /// File name inside `crop_img/`.
    pub file_name: String,
    /// JPEG bytes.
    pub bytes: Vec<u8>,
}

/// Everything an export produces, still in memory.
#[derive(Debug, Default)]
pub struct RenderedExport {
    /// Label file contents.
    pub contents: Vec<u8>,
    /// Crop images, in output order.
    pub crops: Vec<EncodedCrop>,
    /// Counts and warnings gathered while rendering.
    pub result: ExportResult,
}

impl RenderedExport {
    /// Write crops and the label file into `output_dir`.
    pub fn write(&self, output_dir: &Path, file_name: &str) -> Result<ExportResult, ExportError> {
        let mut result = ExportResult {
            images_exported: self.result.images_exported,
            annotations_exported: self.result.annotations_exported,
            warnings: self.result.warnings.clone(),
            files_created: Vec::new(),
        };

        if !self.crops.is_empty() {
            let crop_dir = output_dir.join(CROP_DIR);
            std::fs::create_dir_all(&crop_dir)?;
            for crop in &self.crops {
                let path = crop_dir.join(&crop.file_name);
                write_atomic(&path, &crop.bytes)?;
                result.files_created.push(path);
            }
        }

        let path = output_dir.join(file_name);
        write_atomic(&path, &self.contents)?;
        result.files_created.push(path);
        Ok(result)
    }
}

/// Result of an export operation.
#[derive(Debug, Clone, Default)]
pub struct ExportResult {
    /// Number of images that contributed to the output.
    pub images_exported: usize,

    /// Number of shapes (or crops) written.
    pub annotations_exported: usize,

    /// Per-item problems; each skipped image or shape is listed once.
    pub warnings: Vec<ExportWarning>,

    /// Files created during export.
    pub files_created: Vec<PathBuf>,
}

impl ExportResult {
    /// Create a new export result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a warning to the result.
    pub fn add_warning(&mut self, warning: ExportWarning) {
        log::warn!("{}", warning);
        self.warnings.push(warning);
    }

    /// Check if there were any warnings.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Warnings of one kind.
    pub fn warnings_of(&self, kind: WarningKind) -> impl Iterator<Item = &ExportWarning> {
        self.warnings.iter().filter(move |w| w.kind == kind)
    }

    /// Log the consolidated report.
    pub fn log_summary(&self, exporter: &str) {
        log::info!(
            "[{}] Exported {} images with {} annotations ({} warnings)",
            exporter,
            self.images_exported,
            self.annotations_exported,
            self.warnings.len()
        );
    }
}

/// Why an item was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// The shape could not be reduced or rectified into a crop.
    DegenerateGeometry,
    /// The image file no longer exists.
    MissingSourceImage,
    /// The image file exists but could not be decoded.
    UnreadableImage,
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::DegenerateGeometry => "degenerate geometry",
            Self::MissingSourceImage => "missing source image",
            Self::UnreadableImage => "unreadable image",
        })
    }
}

/// A skipped image or shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportWarning {
    pub kind: WarningKind,

    /// Image this warning relates to (if applicable).
    pub image: Option<ImageKey>,

    /// Index of the shape within its image (if applicable).
    pub shape_index: Option<usize>,

    /// Human-readable detail.
    pub message: String,
}

impl ExportWarning {
    /// Create a new warning.
    pub fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            image: None,
            shape_index: None,
            message: message.into(),
        }
    }

    /// Set the image this warning relates to.
    pub fn with_image(mut self, key: &ImageKey) -> Self {
        self.image = Some(key.clone());
        self
    }

    /// Set the shape this warning relates to.
    pub fn with_shape(mut self, index: usize) -> Self {
        self.shape_index = Some(index);
        self
    }
}

impl fmt::Display for ExportWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(image) = &self.image {
            write!(f, " in {}", image)?;
        }
        if let Some(index) = self.shape_index {
            write!(f, " (shape {})", index)?;
        }
        write!(f, ": {}", self.message)
    }
}
