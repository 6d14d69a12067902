use std::io;
use std::path::{Path, PathBuf};

use crate::engine::apply::{HunkOutcome, MatchMode, apply_hunks};
use crate::engine::document::PatchDocument;
use crate::patch::report::FilePatchResult;
use crate::utils::{paths, text};

/// Applies one patch document to one file. The original is read from under
/// the original root, the patched result is written under the output root.
pub struct FilePatcher {
    document: PatchDocument,
    original_root: PathBuf,
    output_root: PathBuf,
    original_lines: Option<Vec<String>>,
    result_lines: Option<Vec<String>>,
    outcomes: Vec<HunkOutcome>,
}

impl FilePatcher {
    pub fn new(document: PatchDocument, original_root: &Path, output_root: &Path) -> Self {
        FilePatcher {
            document,
            original_root: original_root.to_path_buf(),
            output_root: output_root.to_path_buf(),
            original_lines: None,
            result_lines: None,
            outcomes: Vec::new(),
        }
    }

    pub fn load(
        patch_path: &Path,
        original_root: &Path,
        output_root: &Path,
    ) -> io::Result<FilePatcher> {
        let document = PatchDocument::load(patch_path)?;
        Ok(FilePatcher::new(document, original_root, output_root))
    }

    pub fn document(&self) -> &PatchDocument {
        &self.document
    }

    pub fn original_path(&self) -> PathBuf {
        self.original_root.join(&self.document.original_path)
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_root.join(&self.document.modified_path)
    }

    /// Hunk outcomes of the last [`FilePatcher::patch`] call.
    pub fn outcomes(&self) -> &[HunkOutcome] {
        &self.outcomes
    }

    /// Apply the document's hunks under the given mode. The original file
    /// is read once; repeated calls reuse the loaded lines.
    pub fn patch(&mut self, mode: MatchMode) -> io::Result<()> {
        let original_lines = match self.original_lines.take() {
            Some(lines) => lines,
            None => text::read_lines(&self.original_path())?,
        };

        let (result_lines, outcomes) = apply_hunks(&original_lines, &self.document.hunks, mode);
        self.original_lines = Some(original_lines);
        self.result_lines = Some(result_lines);
        self.outcomes = outcomes;
        Ok(())
    }

    /// Write the patched lines to the output path.
    ///
    /// # Panics
    ///
    /// Panics if called before [`FilePatcher::patch`]; there is no result
    /// to write yet.
    pub fn save(&self) -> io::Result<()> {
        let result_lines = self
            .result_lines
            .as_ref()
            .expect("patch must run before save");
        let output_path = self.output_path();
        paths::create_parent_directory(&output_path)?;
        text::write_lines(&output_path, result_lines)
    }

    /// Snapshot of this patcher's outcome for the report.
    pub fn result(&self) -> FilePatchResult {
        FilePatchResult {
            original_path: self.document.original_path.clone(),
            modified_path: self.document.modified_path.clone(),
            hunks: self.outcomes.clone(),
        }
    }
}
