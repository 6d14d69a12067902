pub mod apply;
pub mod diff;
pub mod document;

pub use apply::{HunkOutcome, MatchMode, apply_hunks};
pub use diff::diff_lines;
pub use document::{Hunk, HunkLine, PatchDocument};
