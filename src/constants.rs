//! Global constants for ocrlabel

/// Manual label file written at the root of every project directory.
pub const LABEL_FILE: &str = "Label.txt";

/// Auto-recognition cache file.
pub const CACHE_FILE: &str = "Cache.cach";

/// Per-image completion state file.
pub const FILE_STATE_FILE: &str = "fileState.txt";

/// Detection dataset output (both dialects share the file name).
pub const DET_LABEL_FILE: &str = "det_label.json";

/// Recognition dataset output, line dialect.
pub const REC_LABEL_FILE: &str = "rec_label.txt";

/// Recognition dataset output, MMOCR dialect.
pub const REC_LABEL_JSON_FILE: &str = "rec_label.json";

/// Key-information-extraction dataset output.
pub const KIE_LABEL_FILE: &str = "kie_label.json";

/// Subdirectory holding rectified recognition crops.
pub const CROP_DIR: &str = "crop_img";

/// Transcription written for difficult regions in detection exports.
pub const DIFFICULT_TRANSCRIPTION: &str = "###";

/// Key class used when KIE labelling is disabled or unset.
pub const KEY_CLS_NONE: &str = "None";

/// Key class that replaces [`KEY_CLS_NONE`] in KIE exports.
pub const KEY_CLS_OTHER: &str = "other";

/// Transcription given to boxes the recognizer could not read.
pub const DEFAULT_NO_LABEL_TEXT: &str = "TEMPORARY";

/// Confirmed images between two backup checkpoints.
pub const DEFAULT_AUTO_SAVE_EVERY: u32 = 5;

/// Crops at least this much taller than wide are treated as vertical text.
pub const VERTICAL_CROP_RATIO: f32 = 1.5;

/// Quads whose absolute area is below this many square pixels cannot be rectified.
pub const MIN_RECTIFY_AREA: f32 = 1.0;

/// Image file extensions picked up when scanning a project directory.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tiff", "tif", "webp"];
