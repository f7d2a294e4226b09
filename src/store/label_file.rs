//! Line-oriented label file codec.
//!
//! `Label.txt` and `Cache.cach` share one format: one image per line,
//! `<ImageKey>\t<JSON array of shape objects>`. Files written by older tools
//! may spell booleans as `True`/`False`; those are normalized before parsing.
//! Everything this crate writes is strict JSON.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::Path;

use crate::model::{ImageKey, ShapeRecord};
use crate::store::error::StoreError;

/// Shapes per image, ordered by key for deterministic output.
pub type LabelMap = BTreeMap<ImageKey, Vec<ShapeRecord>>;

/// One raw line of a label file, with the shape list left unparsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLabelLine {
    /// 1-based line number in the file.
    pub line: usize,
    pub key: ImageKey,
    /// The JSON text after the tab, trimmed.
    pub shapes_json: String,
}

/// Rewrite capitalized boolean literals outside of string literals.
pub fn normalize_literals(raw: &str) -> Cow<'_, str> {
    if !raw.contains("True") && !raw.contains("False") {
        return Cow::Borrowed(raw);
    }

    let mut out = String::with_capacity(raw.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut word = String::new();

    let flush = |word: &mut String, out: &mut String| {
        match word.as_str() {
            "True" => out.push_str("true"),
            "False" => out.push_str("false"),
            other => out.push_str(other),
        }
        word.clear();
    };

    for c in raw.chars() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        if c.is_alphanumeric() || c == '_' {
            word.push(c);
            continue;
        }

        flush(&mut word, &mut out);
        if c == '"' {
            in_string = true;
        }
        out.push(c);
    }
    flush(&mut word, &mut out);

    Cow::Owned(out)
}

/// Parse the JSON part of a label line.
pub fn parse_shapes(raw: &str) -> Result<Vec<ShapeRecord>, serde_json::Error> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&normalize_literals(raw))
}

/// Split file content into raw lines without parsing the shape lists.
pub fn split_raw_lines(path: &Path, content: &str) -> Result<Vec<RawLabelLine>, StoreError> {
    let mut lines = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;
        if line.trim().is_empty() {
            continue;
        }

        let (raw_key, shapes_json) = line
            .split_once('\t')
            .ok_or_else(|| StoreError::malformed(path, line_no, "missing tab separator"))?;
        let key = ImageKey::parse(raw_key).ok_or_else(|| {
            StoreError::malformed(path, line_no, format!("invalid image key '{}'", raw_key))
        })?;

        lines.push(RawLabelLine {
            line: line_no,
            key,
            shapes_json: shapes_json.trim().to_string(),
        });
    }
    Ok(lines)
}

/// Parse a whole label file.
///
/// Any malformed line fails the entire parse. Duplicate keys keep the
/// last occurrence.
pub fn parse_label_file(path: &Path, content: &str) -> Result<LabelMap, StoreError> {
    let mut labels = LabelMap::new();
    for raw in split_raw_lines(path, content)? {
        let shapes = parse_shapes(&raw.shapes_json)
            .map_err(|e| StoreError::malformed(path, raw.line, e.to_string()))?;
        labels.insert(raw.key, shapes);
    }
    Ok(labels)
}

/// Read a label file from disk; a missing file is an empty store.
pub fn read_label_file(path: &Path) -> Result<LabelMap, StoreError> {
    if !path.exists() {
        log::debug!("No label file at {:?}, starting empty", path);
        return Ok(LabelMap::new());
    }
    let content = std::fs::read_to_string(path)?;
    parse_label_file(path, &content)
}

/// Format one `key\tjson` line (without the trailing newline).
pub fn format_label_line(
    key: &ImageKey,
    shapes: &[ShapeRecord],
) -> Result<String, serde_json::Error> {
    Ok(format!("{}\t{}", key, serde_json::to_string(shapes)?))
}

/// Render entries into file content.
pub fn render_label_file<'a>(
    entries: impl IntoIterator<Item = (&'a ImageKey, &'a Vec<ShapeRecord>)>,
) -> Result<String, serde_json::Error> {
    let mut content = String::new();
    for (key, shapes) in entries {
        content.push_str(&format_label_line(key, shapes)?);
        content.push('\n');
    }
    Ok(content)
}
