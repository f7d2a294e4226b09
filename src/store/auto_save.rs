//! Auto-save checkpointing driven by the manual save count.
//!
//! Every Nth confirmed image triggers a checkpoint that persists the
//! completion set and the recognition cache. There is no timer; the
//! checkpoint is decided synchronously inside the save call.

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_AUTO_SAVE_EVERY;

/// How often checkpoints happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutoSavePolicy {
    /// Checkpoint every [`DEFAULT_AUTO_SAVE_EVERY`] confirmed images.
    #[default]
    Backup,
    /// Checkpoint after every confirmed image.
    Aggressive,
}

impl AutoSavePolicy {
    /// Number of manual saves between two checkpoints.
    pub fn every(self) -> u32 {
        match self {
            Self::Backup => DEFAULT_AUTO_SAVE_EVERY,
            Self::Aggressive => 1,
        }
    }
}

/// Counts manual saves and reports when a checkpoint is due.
#[derive(Debug, Clone)]
pub struct AutoSaveManager {
    /// Saves between checkpoints.
    every: u32,

    /// Saves since the last checkpoint.
    pending: u32,

    /// Whether checkpoints are enabled.
    enabled: bool,
}

impl AutoSaveManager {
    /// Create a manager for the given policy.
    pub fn new(policy: AutoSavePolicy) -> Self {
        Self {
            every: policy.every(),
            pending: 0,
            enabled: true,
        }
    }

    /// Create a manager that never checkpoints.
    pub fn disabled() -> Self {
        let mut manager = Self::new(AutoSavePolicy::default());
        manager.enabled = false;
        manager
    }

    /// Override the checkpoint interval. Zero is treated as one.
    pub fn with_every(mut self, every: u32) -> Self {
        self.every = every.max(1);
        self
    }

    /// Switch policy; the pending count is kept.
    pub fn set_policy(&mut self, policy: AutoSavePolicy) {
        self.every = policy.every();
        log::debug!("Auto-save: checkpoint every {} saves", self.every);
    }

    /// Record one successful manual save.
    ///
    /// Returns true when this save completes an interval and a checkpoint
    /// should be written now.
    pub fn record_save(&mut self) -> bool {
        if !self.enabled {
            return false;
        }
        self.pending += 1;
        log::trace!("Auto-save: {}/{} saves pending", self.pending, self.every);
        if self.pending >= self.every {
            self.pending = 0;
            log::trace!("Auto-save: checkpoint due");
            return true;
        }
        false
    }

    /// Saves recorded since the last checkpoint.
    pub fn pending(&self) -> u32 {
        self.pending
    }

    pub fn every(&self) -> u32 {
        self.every
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        log::debug!("Auto-save: enabled = {}", enabled);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Forget pending saves (e.g. after an explicit save-all).
    pub fn reset(&mut self) {
        self.pending = 0;
    }
}

impl Default for AutoSaveManager {
    fn default() -> Self {
        Self::new(AutoSavePolicy::default())
    }
}
