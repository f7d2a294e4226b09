//! Per-project label store: manual labels, recognition cache and completion.

use std::path::{Path, PathBuf};

use crate::constants::{CACHE_FILE, FILE_STATE_FILE, LABEL_FILE};
use crate::model::{ImageKey, ShapeRecord};
use crate::store::auto_save::{AutoSaveManager, AutoSavePolicy};
use crate::store::completion::CompletionSet;
use crate::store::error::StoreError;
use crate::store::label_file::{self, LabelMap};
use crate::utils::write_atomic;

/// Who produced the shapes passed to [`LabelStore::put`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    /// The user confirmed the image. Writes manual labels and marks it complete.
    Manual,
    /// Batch recognition output. Writes the cache only.
    Auto,
}

/// Result of a [`LabelStore::put`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PutOutcome {
    /// Number of shapes stored.
    pub stored: usize,
    /// Whether an auto-save checkpoint was written.
    pub checkpoint: bool,
}

/// All label state for one open project directory.
///
/// Opening another directory means building a new store; nothing carries over.
#[derive(Debug)]
pub struct LabelStore {
    project_dir: PathBuf,
    manual: LabelMap,
    cache: LabelMap,
    completion: CompletionSet,
    auto_save: AutoSaveManager,
}

impl LabelStore {
    /// Empty store rooted at `project_dir`. Nothing is read from disk.
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        Self {
            project_dir: project_dir.into(),
            manual: LabelMap::new(),
            cache: LabelMap::new(),
            completion: CompletionSet::new(),
            auto_save: AutoSaveManager::default(),
        }
    }

    /// Read the manual label, cache and completion files without merging.
    ///
    /// Missing files yield empty stores. A malformed line in either label
    /// file fails the whole load.
    pub fn load(project_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let mut store = Self::new(project_dir);
        store.manual = label_file::read_label_file(&store.label_path())?;
        store.cache = label_file::read_label_file(&store.cache_path())?;
        store.completion = CompletionSet::read(&store.file_state_path())?;
        log::info!(
            "Loaded {:?}: {} manual, {} cached, {} completed",
            store.project_dir,
            store.manual.len(),
            store.cache.len(),
            store.completion.len()
        );
        Ok(store)
    }

    /// Load and merge in one step, as done when a project is opened.
    pub fn open(project_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let mut store = Self::load(project_dir)?;
        store.merge();
        Ok(store)
    }

    /// Use the given checkpoint policy.
    pub fn with_auto_save(mut self, policy: AutoSavePolicy) -> Self {
        self.auto_save = AutoSaveManager::new(policy);
        self
    }

    /// Fill gaps in the manual labels from the cache.
    ///
    /// Existing manual entries are never overwritten. Returns the number of
    /// entries copied over.
    pub fn merge(&mut self) -> usize {
        let mut filled = 0;
        for (key, shapes) in &self.cache {
            if !self.manual.contains_key(key) {
                self.manual.insert(key.clone(), shapes.clone());
                filled += 1;
            }
        }
        log::debug!("Merged {} cached entries into manual labels", filled);
        filled
    }

    /// Store shapes for an image.
    ///
    /// In [`SaveMode::Manual`] the image is marked complete and the save
    /// counts towards the next auto-save checkpoint. In [`SaveMode::Auto`]
    /// shapes without a transcription are dropped and only the cache changes.
    pub fn put(
        &mut self,
        image_path: &Path,
        shapes: Vec<ShapeRecord>,
        mode: SaveMode,
    ) -> Result<PutOutcome, StoreError> {
        let key = ImageKey::from_path(image_path).ok_or_else(|| StoreError::InvalidImagePath {
            path: image_path.to_path_buf(),
        })?;

        match mode {
            SaveMode::Manual => {
                let stored = shapes.len();
                self.manual.insert(key, shapes);
                self.completion.insert(image_path);
                let checkpoint = self.auto_save.record_save();
                if checkpoint {
                    self.checkpoint()?;
                }
                Ok(PutOutcome { stored, checkpoint })
            }
            SaveMode::Auto => {
                let shapes: Vec<ShapeRecord> = shapes
                    .into_iter()
                    .filter(|s| !s.transcription.is_empty())
                    .collect();
                let stored = shapes.len();
                self.cache.insert(key, shapes);
                Ok(PutOutcome {
                    stored,
                    checkpoint: false,
                })
            }
        }
    }

    /// Forget an image in every store.
    pub fn remove(&mut self, image_path: &Path) -> bool {
        let mut removed = self.completion.remove(image_path);
        if let Some(key) = ImageKey::from_path(image_path) {
            removed |= self.manual.remove(&key).is_some();
            removed |= self.cache.remove(&key).is_some();
        }
        removed
    }

    /// Shapes to show for an image: manual labels, falling back to the cache.
    pub fn shapes_for(&self, key: &ImageKey) -> Option<&[ShapeRecord]> {
        self.manual
            .get(key)
            .or_else(|| self.cache.get(key))
            .map(Vec::as_slice)
    }

    /// Whether the image at `path` has been confirmed.
    pub fn is_complete(&self, image_path: &Path) -> bool {
        self.completion.contains(image_path)
    }

    /// Write the manual label file.
    ///
    /// Only completed images with at least one shape are written, and the
    /// file is fully replaced, so keys of deleted or unconfirmed images
    /// never linger. Returns the number of lines written.
    pub fn save_manual(&self) -> Result<usize, StoreError> {
        let completed = self.completion.keys();
        let entries: Vec<_> = self
            .manual
            .iter()
            .filter(|(key, shapes)| completed.contains(*key) && !shapes.is_empty())
            .collect();
        let content = label_file::render_label_file(entries.iter().copied())?;
        write_atomic(&self.label_path(), content.as_bytes())?;
        log::debug!("Wrote {} entries to {:?}", entries.len(), self.label_path());
        Ok(entries.len())
    }

    /// Fully rewrite the cache file.
    pub fn save_cache(&self) -> Result<(), StoreError> {
        let content = label_file::render_label_file(&self.cache)?;
        write_atomic(&self.cache_path(), content.as_bytes())?;
        log::debug!("Wrote {} entries to {:?}", self.cache.len(), self.cache_path());
        Ok(())
    }

    /// Write the completion file.
    pub fn save_completion(&self) -> Result<(), StoreError> {
        write_atomic(&self.file_state_path(), self.completion.render().as_bytes())?;
        log::debug!(
            "Wrote {} completed images to {:?}",
            self.completion.len(),
            self.file_state_path()
        );
        Ok(())
    }

    /// Persist everything and restart the auto-save interval.
    pub fn save_all(&mut self) -> Result<(), StoreError> {
        self.checkpoint()?;
        self.auto_save.reset();
        Ok(())
    }

    fn checkpoint(&self) -> Result<(), StoreError> {
        self.save_completion()?;
        self.save_manual()?;
        self.save_cache()?;
        log::info!("Auto-save checkpoint written to {:?}", self.project_dir);
        Ok(())
    }

    /// Where the image for `key` lives on disk.
    ///
    /// Prefers the completed path recorded for the key, otherwise the key
    /// is resolved against the parent of the project directory.
    pub fn image_path_for(&self, key: &ImageKey) -> PathBuf {
        if let Some(path) = self.completion.path_for_key(key) {
            return path.to_path_buf();
        }
        match self.project_dir.parent() {
            Some(parent) => parent.join(key.folder()).join(key.file_name()),
            None => self.project_dir.join(key.file_name()),
        }
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    pub fn label_path(&self) -> PathBuf {
        self.project_dir.join(LABEL_FILE)
    }

    pub fn cache_path(&self) -> PathBuf {
        self.project_dir.join(CACHE_FILE)
    }

    pub fn file_state_path(&self) -> PathBuf {
        self.project_dir.join(FILE_STATE_FILE)
    }

    pub fn manual(&self) -> &LabelMap {
        &self.manual
    }

    pub fn cache(&self) -> &LabelMap {
        &self.cache
    }

    pub fn completion(&self) -> &CompletionSet {
        &self.completion
    }

    pub fn auto_save_mut(&mut self) -> &mut AutoSaveManager {
        &mut self.auto_save
    }
}
