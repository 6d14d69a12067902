use std::path::Path;

use crate::engine::apply::MatchMode;
use crate::error::PatchError;
use crate::patch::{PatchReport, patch_tree};

pub fn run(
    original: &Path,
    patches: &Path,
    output: &Path,
    mode: MatchMode,
) -> Result<PatchReport, PatchError> {
    patch_tree(original, patches, output, mode)
}
