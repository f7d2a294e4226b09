//! Label persistence for one project directory.
//!
//! Three stores live side by side in the project directory:
//!
//! - **Manual labels** (`Label.txt`): shapes the user confirmed.
//! - **Recognition cache** (`Cache.cach`): batch recognition output that has
//!   not been confirmed yet.
//! - **Completion** (`fileState.txt`): paths of confirmed images.
//!
//! The manual and cache files share the `key\tjson` line format handled by
//! [`label_file`]. On open the cache fills gaps in the manual labels but
//! never overrides them.

mod auto_save;
mod completion;
mod error;
pub mod label_file;
mod label_store;
mod locked;

pub use auto_save::{AutoSaveManager, AutoSavePolicy};
pub use completion::CompletionSet;
pub use error::StoreError;
pub use label_file::{LabelMap, RawLabelLine};
pub use label_store::{LabelStore, PutOutcome, SaveMode};
pub use locked::LockedShapes;
