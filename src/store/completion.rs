//! Completion (file state) set: images the user explicitly confirmed.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::model::ImageKey;
use crate::store::error::StoreError;

/// Paths of images the user has manually saved.
///
/// Only completed images are written to the manual label file and only
/// completed images are exported. Paths are also indexed by [`ImageKey`]
/// so key lookups during export do not scan the whole set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionSet {
    paths: BTreeSet<PathBuf>,
    by_key: BTreeMap<ImageKey, BTreeSet<PathBuf>>,
}

impl CompletionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `path\t<state>` lines. A line without a state is still a completed path.
    pub fn parse(content: &str) -> Self {
        let mut set = Self::new();
        content
            .lines()
            .map(|line| line.split_once('\t').map_or(line, |(path, _)| path).trim())
            .filter(|path| !path.is_empty())
            .for_each(|path| {
                set.insert(path);
            });
        set
    }

    /// Read from disk; a missing file is an empty set.
    pub fn read(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            log::debug!("No file state at {:?}, starting empty", path);
            return Ok(Self::new());
        }
        Ok(Self::parse(&std::fs::read_to_string(path)?))
    }

    /// Render as `path\t1` lines.
    pub fn render(&self) -> String {
        self.paths
            .iter()
            .map(|p| format!("{}\t1\n", p.display()))
            .collect()
    }

    /// Mark a path complete. Returns true if it was not already.
    pub fn insert(&mut self, path: impl Into<PathBuf>) -> bool {
        let path = path.into();
        if let Some(key) = ImageKey::from_path(&path) {
            self.by_key.entry(key).or_default().insert(path.clone());
        }
        self.paths.insert(path)
    }

    pub fn remove(&mut self, path: &Path) -> bool {
        if let Some(key) = ImageKey::from_path(path) {
            if let Some(paths) = self.by_key.get_mut(&key) {
                paths.remove(path);
                if paths.is_empty() {
                    self.by_key.remove(&key);
                }
            }
        }
        self.paths.remove(path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    /// Whether any completed path maps to `key`.
    pub fn contains_key(&self, key: &ImageKey) -> bool {
        self.by_key.contains_key(key)
    }

    /// First completed path, in path order, that maps to `key`.
    pub fn path_for_key(&self, key: &ImageKey) -> Option<&Path> {
        self.by_key
            .get(key)
            .and_then(|paths| paths.first())
            .map(PathBuf::as_path)
    }

    /// Keys of every completed path.
    pub fn keys(&self) -> BTreeSet<ImageKey> {
        self.by_key.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter().map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_render() {
        let set = CompletionSet::parse("/data/a/2.jpg\t1\n/data/a/1.jpg\t1\n\n");
        assert_eq!(set.len(), 2);
        assert_eq!(set.render(), "/data/a/1.jpg\t1\n/data/a/2.jpg\t1\n");
    }

    #[test]
    fn test_line_without_state() {
        let set = CompletionSet::parse("/data/a/1.jpg\n");
        assert!(set.contains(Path::new("/data/a/1.jpg")));
    }

    #[test]
    fn test_key_lookup() {
        let mut set = CompletionSet::new();
        set.insert("/data/a/1.jpg");
        let key = ImageKey::parse("a/1.jpg").unwrap();
        assert!(set.contains_key(&key));
        assert_eq!(set.path_for_key(&key), Some(Path::new("/data/a/1.jpg")));
        assert!(!set.contains_key(&ImageKey::parse("a/2.jpg").unwrap()));
    }

    #[test]
    fn test_key_index_follows_removal() {
        let mut set = CompletionSet::new();
        set.insert("/data/b/a/1.jpg");
        set.insert("/data/a/1.jpg");
        let key = ImageKey::parse("a/1.jpg").unwrap();
        assert_eq!(set.path_for_key(&key), Some(Path::new("/data/a/1.jpg")));

        assert!(set.remove(Path::new("/data/a/1.jpg")));
        assert_eq!(set.path_for_key(&key), Some(Path::new("/data/b/a/1.jpg")));

        assert!(set.remove(Path::new("/data/b/a/1.jpg")));
        assert!(!set.contains_key(&key));
        assert!(set.keys().is_empty());
        assert!(set.is_empty());
    }
}
