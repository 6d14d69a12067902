use std::path::Path;

use crate::classify::Classifier;
use crate::differ::diff_trees;
use crate::error::DiffError;

pub fn run(original: &Path, modified: &Path, patches: &Path) -> Result<(), DiffError> {
    let classifier = Classifier::with_defaults();
    diff_trees(original, modified, patches, &classifier)
}
