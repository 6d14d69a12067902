//! Reconcile two versions of a directory tree into a replayable patch set,
//! and apply that patch set to a fresh baseline with tolerance for upstream
//! line drift.

pub mod classify;
pub mod commands;
pub mod differ;
pub mod engine;
pub mod error;
pub mod patch;
pub mod utils;

pub use classify::{Classification, Classifier, DiffType, DiffTypeProvider};
pub use differ::diff_trees;
pub use engine::apply::MatchMode;
pub use error::{DiffError, PatchError};
pub use patch::{PatchReport, patch_tree};
