//! Image record keys joining all label stores.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Stable `<parent-folder>/<file-name>` identifier for an image.
///
/// Derived from a path by taking its last two components, splitting on both
/// `/` and `\` so that keys written on one platform match on another.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageKey(String);

impl ImageKey {
    /// Derive the key for a path string.
    ///
    /// Returns `None` when the path has no parent folder component.
    pub fn from_path_str(path: &str) -> Option<Self> {
        let mut parts = path
            .split(['/', '\\'])
            .filter(|part| !part.is_empty())
            .rev();
        let file = parts.next()?;
        let folder = parts.next()?;
        Some(Self(format!("{}/{}", folder, file)))
    }

    /// Derive the key for a filesystem path.
    pub fn from_path(path: &Path) -> Option<Self> {
        Self::from_path_str(&path.to_string_lossy())
    }

    /// Wrap a key string read from a label file, normalizing separators.
    pub fn parse(raw: &str) -> Option<Self> {
        Self::from_path_str(raw.trim())
    }

    /// The key as written to label files.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Folder component of the key.
    pub fn folder(&self) -> &str {
        self.0.split_once('/').map_or("", |(folder, _)| folder)
    }

    /// File name component of the key.
    pub fn file_name(&self) -> &str {
        self.0.split_once('/').map_or(self.0.as_str(), |(_, file)| file)
    }

    /// File name without its extension.
    pub fn file_stem(&self) -> &str {
        let name = self.file_name();
        match name.rfind('.') {
            Some(0) | None => name,
            Some(idx) => &name[..idx],
        }
    }
}

impl fmt::Display for ImageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_from_unix_path() {
        let key = ImageKey::from_path_str("/data/project/a/1.jpg").unwrap();
        assert_eq!(key.as_str(), "a/1.jpg");
        assert_eq!(key.folder(), "a");
        assert_eq!(key.file_name(), "1.jpg");
        assert_eq!(key.file_stem(), "1");
    }

    #[test]
    fn test_key_from_windows_path() {
        let key = ImageKey::from_path_str(r"C:\data\project\a\1.jpg").unwrap();
        assert_eq!(key.as_str(), "a/1.jpg");
    }

    #[test]
    fn test_key_mixed_separators_match() {
        let unix = ImageKey::from_path_str("x/imgs/scan.png").unwrap();
        let windows = ImageKey::from_path_str(r"x\imgs\scan.png").unwrap();
        assert_eq!(unix, windows);
    }

    #[test]
    fn test_key_requires_folder() {
        assert!(ImageKey::from_path_str("lonely.jpg").is_none());
        assert!(ImageKey::from_path_str("").is_none());
    }

    #[test]
    fn test_file_stem_keeps_inner_dots() {
        let key = ImageKey::from_path_str("a/scan.v2.jpg").unwrap();
        assert_eq!(key.file_stem(), "scan.v2");
    }
}
