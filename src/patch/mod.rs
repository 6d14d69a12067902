pub mod applier;
pub mod file_patcher;
pub mod report;

/// Extension marking a patch document inside a patch set.
pub const PATCH_EXTENSION: &str = ".patch";
/// Manifest of paths removed from the modified tree.
pub const REMOVED_FILES_LIST: &str = "removed_files.list";

pub use applier::patch_tree;
pub use file_patcher::FilePatcher;
pub use report::{FilePatchResult, PatchReport, ReportAggregator};
