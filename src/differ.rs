use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::classify::{Classification, Classifier, DiffType};
use crate::engine::diff::diff_lines;
use crate::engine::document::PatchDocument;
use crate::error::DiffError;
use crate::patch::{PATCH_EXTENSION, REMOVED_FILES_LIST};
use crate::utils::parallel::{self, Action};
use crate::utils::{hash, paths, text};

enum Work {
    NewFile,
    Text,
    Binary,
}

/// Regenerate the patch set capturing the delta from `original_dir` to
/// `modified_dir`.
///
/// Every file under `modified_dir` is classified and diffed through a
/// bounded-parallel batch; after the batch completes, stale patch-set
/// entries are pruned, the removed-file manifest is rewritten, and empty
/// directories under `modified_dir` are removed.
///
/// Classification runs before any work is scheduled, so an undetermined
/// file aborts the run without touching the patch set. Tree mutation is
/// not transactional: an aborted batch leaves a partially regenerated
/// patch set behind.
pub fn diff_trees(
    original_dir: &Path,
    modified_dir: &Path,
    patches_dir: &Path,
    classifier: &Classifier,
) -> Result<(), DiffError> {
    if !original_dir.is_dir() {
        return Err(DiffError::MissingInput(original_dir.to_path_buf()));
    }
    if !modified_dir.is_dir() {
        return Err(DiffError::MissingInput(modified_dir.to_path_buf()));
    }
    fs::create_dir_all(patches_dir).map_err(|source| DiffError::Io {
        path: patches_dir.to_path_buf(),
        source,
    })?;

    let modified_files =
        paths::enumerate_source_files(modified_dir).map_err(|source| DiffError::Io {
            path: modified_dir.to_path_buf(),
            source,
        })?;

    // Classify everything up front; an undetermined diff type is a
    // configuration bug and must fail before any action runs.
    let mut work: Vec<(&PathBuf, &String, Work)> = Vec::new();
    for (full_path, relative_path) in &modified_files {
        if !original_dir.join(relative_path).is_file() {
            work.push((full_path, relative_path, Work::NewFile));
            continue;
        }
        match classifier.classify(relative_path) {
            Some(Classification::Ignore) => debug!(path = %relative_path, "ignored"),
            Some(Classification::Diff(DiffType::Text)) => {
                work.push((full_path, relative_path, Work::Text));
            }
            Some(Classification::Diff(DiffType::Binary)) => {
                work.push((full_path, relative_path, Work::Binary));
            }
            None => return Err(DiffError::UndeterminedDiffType(relative_path.clone())),
        }
    }

    let mut actions = Vec::with_capacity(work.len());
    for (full_path, relative_path, kind) in work {
        match kind {
            Work::NewFile => actions.push(Action::new(relative_path.clone(), move || {
                copy_new_file(patches_dir, full_path, relative_path)
            })),
            Work::Text => actions.push(Action::new(relative_path.clone(), move || {
                diff_text_file(original_dir, modified_dir, patches_dir, relative_path)
            })),
            Work::Binary => actions.push(Action::new(relative_path.clone(), move || {
                diff_binary_file(original_dir, patches_dir, full_path, relative_path)
            })),
        }
    }

    info!(
        files = modified_files.len(),
        actions = actions.len(),
        "diffing trees"
    );
    parallel::execute(actions).map_err(|e| DiffError::Action {
        path: e.label,
        source: e.source,
    })?;

    prune_stale_entries(modified_dir, patches_dir)?;
    write_removed_files(original_dir, modified_dir, patches_dir)?;

    paths::delete_empty_directories(modified_dir).map_err(|source| DiffError::Io {
        path: modified_dir.to_path_buf(),
        source,
    })?;

    Ok(())
}

fn document_path(patches_dir: &Path, relative_path: &str) -> PathBuf {
    patches_dir.join(format!("{}{}", relative_path, PATCH_EXTENSION))
}

fn copy_new_file(patches_dir: &Path, full_path: &Path, relative_path: &str) -> io::Result<()> {
    paths::remove_if_exists(&document_path(patches_dir, relative_path))?;
    paths::copy_file(full_path, &patches_dir.join(relative_path))
}

fn diff_text_file(
    original_dir: &Path,
    modified_dir: &Path,
    patches_dir: &Path,
    relative_path: &str,
) -> io::Result<()> {
    let original_lines = text::read_lines(&original_dir.join(relative_path))?;
    let modified_lines = text::read_lines(&modified_dir.join(relative_path))?;

    let hunks = diff_lines(&original_lines, &modified_lines);
    let document_path = document_path(patches_dir, relative_path);
    if hunks.is_empty() {
        paths::remove_if_exists(&document_path)?;
    } else {
        let document = PatchDocument::new(relative_path, relative_path, hunks);
        paths::create_parent_directory(&document_path)?;
        document.save(&document_path)?;
    }
    // A path never carries both a document and a raw copy.
    paths::remove_if_exists(&patches_dir.join(relative_path))
}

fn diff_binary_file(
    original_dir: &Path,
    patches_dir: &Path,
    full_path: &Path,
    relative_path: &str,
) -> io::Result<()> {
    let original_path = original_dir.join(relative_path);
    let original_size = fs::metadata(&original_path)?.len();
    let modified_size = fs::metadata(full_path)?.len();

    // Sizes first; content digests only when they agree.
    let changed = original_size != modified_size
        || hash::file_digest(&original_path)? != hash::file_digest(full_path)?;

    paths::remove_if_exists(&document_path(patches_dir, relative_path))?;
    if changed {
        paths::copy_file(full_path, &patches_dir.join(relative_path))
    } else {
        paths::remove_if_exists(&patches_dir.join(relative_path))
    }
}

// Drop patch-set entries whose target no longer exists under the modified
// tree: documents for reverted or deleted files, raw copies likewise.
fn prune_stale_entries(modified_dir: &Path, patches_dir: &Path) -> Result<(), DiffError> {
    let entries = paths::enumerate_files(patches_dir).map_err(|source| DiffError::Io {
        path: patches_dir.to_path_buf(),
        source,
    })?;
    for (full_path, relative_path) in entries {
        if relative_path == REMOVED_FILES_LIST {
            continue;
        }
        let target = relative_path
            .strip_suffix(PATCH_EXTENSION)
            .unwrap_or(&relative_path);
        if !modified_dir.join(target).is_file() {
            debug!(path = %relative_path, "pruning stale patch-set entry");
            fs::remove_file(&full_path).map_err(|source| DiffError::Io {
                path: full_path.clone(),
                source,
            })?;
        }
    }
    paths::delete_empty_directories(patches_dir).map_err(|source| DiffError::Io {
        path: patches_dir.to_path_buf(),
        source,
    })
}

fn write_removed_files(
    original_dir: &Path,
    modified_dir: &Path,
    patches_dir: &Path,
) -> Result<(), DiffError> {
    let original_files =
        paths::enumerate_source_files(original_dir).map_err(|source| DiffError::Io {
            path: original_dir.to_path_buf(),
            source,
        })?;
    let removed: Vec<String> = original_files
        .into_iter()
        .filter(|(_, relative_path)| !modified_dir.join(relative_path).is_file())
        .map(|(_, relative_path)| relative_path)
        .collect();

    let manifest_path = patches_dir.join(REMOVED_FILES_LIST);
    let result = if removed.is_empty() {
        paths::remove_if_exists(&manifest_path)
    } else {
        info!(count = removed.len(), "recording removed files");
        fs::write(&manifest_path, removed.join("\n") + "\n")
    };
    result.map_err(|source| DiffError::Io {
        path: manifest_path,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::apply::MatchMode;
    use crate::patch::patch_tree;
    use tempfile::tempdir;

    fn owned(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|s| s.to_string()).collect()
    }

    struct Trees {
        _guard: tempfile::TempDir,
        original: PathBuf,
        modified: PathBuf,
        patches: PathBuf,
        output: PathBuf,
    }

    fn trees() -> Trees {
        let guard = tempdir().unwrap();
        let original = guard.path().join("original");
        let modified = guard.path().join("modified");
        let patches = guard.path().join("patches");
        let output = guard.path().join("output");
        fs::create_dir_all(&original).unwrap();
        fs::create_dir_all(&modified).unwrap();
        Trees {
            _guard: guard,
            original,
            modified,
            patches,
            output,
        }
    }

    fn diff(t: &Trees) {
        diff_trees(&t.original, &t.modified, &t.patches, &Classifier::with_defaults()).unwrap();
    }

    #[test]
    fn end_to_end_example() {
        let t = trees();
        text::write_lines(&t.original.join("foo.txt"), &owned(&["a", "b", "c"])).unwrap();
        text::write_lines(&t.modified.join("foo.txt"), &owned(&["a", "B", "c"])).unwrap();
        text::write_lines(&t.modified.join("bar.txt"), &owned(&["x"])).unwrap();

        diff(&t);

        let document = PatchDocument::load(&t.patches.join("foo.txt.patch")).unwrap();
        assert_eq!(document.hunks.len(), 1);
        assert!(t.patches.join("bar.txt").is_file());
        assert!(!t.patches.join("bar.txt.patch").exists());
        assert!(!t.patches.join(REMOVED_FILES_LIST).exists());

        let report = patch_tree(&t.original, &t.patches, &t.output, MatchMode::Exact).unwrap();

        assert_eq!(
            text::read_lines(&t.output.join("foo.txt")).unwrap(),
            owned(&["a", "B", "c"])
        );
        assert_eq!(text::read_lines(&t.output.join("bar.txt")).unwrap(), owned(&["x"]));
        assert_eq!(report.successes, 1);
        assert_eq!(report.failures, 0);
        assert_eq!(report.warnings, 0);
    }

    #[test]
    fn removal_example() {
        let t = trees();
        text::write_lines(&t.original.join("foo.txt"), &owned(&["same"])).unwrap();
        text::write_lines(&t.original.join("baz.txt"), &owned(&["bye"])).unwrap();
        text::write_lines(&t.modified.join("foo.txt"), &owned(&["same"])).unwrap();

        diff(&t);

        let manifest = fs::read_to_string(t.patches.join(REMOVED_FILES_LIST)).unwrap();
        assert_eq!(manifest, "baz.txt\n");
        assert!(!t.patches.join("foo.txt.patch").exists());

        patch_tree(&t.original, &t.patches, &t.output, MatchMode::Exact).unwrap();

        assert!(t.output.join("foo.txt").is_file());
        assert!(!t.output.join("baz.txt").exists());
    }

    #[test]
    fn unchanged_files_produce_no_artifacts() {
        let t = trees();
        text::write_lines(&t.original.join("same.txt"), &owned(&["x", "y"])).unwrap();
        text::write_lines(&t.modified.join("same.txt"), &owned(&["x", "y"])).unwrap();
        fs::write(t.original.join("same.png"), b"\x89PNG").unwrap();
        fs::write(t.modified.join("same.png"), b"\x89PNG").unwrap();

        diff(&t);

        assert!(paths::enumerate_files(&t.patches).unwrap().is_empty());
    }

    #[test]
    fn new_files_are_raw_copies_even_with_text_extensions() {
        let t = trees();
        text::write_lines(&t.modified.join("brand_new.txt"), &owned(&["fresh"])).unwrap();

        diff(&t);

        assert!(t.patches.join("brand_new.txt").is_file());
        assert!(!t.patches.join("brand_new.txt.patch").exists());
    }

    #[test]
    fn binary_change_copies_file() {
        let t = trees();
        fs::write(t.original.join("data.bin"), b"aaaa").unwrap();
        fs::write(t.modified.join("data.bin"), b"bbbb").unwrap();

        diff(&t);

        assert_eq!(fs::read(t.patches.join("data.bin")).unwrap(), b"bbbb");
    }

    #[test]
    fn binary_same_size_different_content_is_detected() {
        let t = trees();
        fs::write(t.original.join("data.bin"), b"aaaa").unwrap();
        fs::write(t.modified.join("data.bin"), b"aaab").unwrap();

        diff(&t);

        assert_eq!(fs::read(t.patches.join("data.bin")).unwrap(), b"aaab");
    }

    #[test]
    fn rerunning_diff_is_byte_identical() {
        let t = trees();
        text::write_lines(&t.original.join("a.txt"), &owned(&["1", "2", "3"])).unwrap();
        text::write_lines(&t.modified.join("a.txt"), &owned(&["1", "two", "3"])).unwrap();
        text::write_lines(&t.original.join("gone.txt"), &owned(&["g"])).unwrap();
        fs::write(t.modified.join("new.bin"), b"\x00\x01").unwrap();

        diff(&t);
        let first: Vec<(String, Vec<u8>)> = paths::enumerate_files(&t.patches)
            .unwrap()
            .into_iter()
            .map(|(full, rel)| (rel, fs::read(full).unwrap()))
            .collect();

        diff(&t);
        let second: Vec<(String, Vec<u8>)> = paths::enumerate_files(&t.patches)
            .unwrap()
            .into_iter()
            .map(|(full, rel)| (rel, fs::read(full).unwrap()))
            .collect();

        assert_eq!(first, second);
    }

    #[test]
    fn stale_documents_are_pruned_when_file_disappears() {
        let t = trees();
        text::write_lines(&t.original.join("a.txt"), &owned(&["1"])).unwrap();
        text::write_lines(&t.modified.join("a.txt"), &owned(&["one"])).unwrap();

        diff(&t);
        assert!(t.patches.join("a.txt.patch").is_file());

        // The hand edit is dropped entirely.
        fs::remove_file(t.modified.join("a.txt")).unwrap();
        diff(&t);

        assert!(!t.patches.join("a.txt.patch").exists());
        let manifest = fs::read_to_string(t.patches.join(REMOVED_FILES_LIST)).unwrap();
        assert_eq!(manifest, "a.txt\n");
    }

    #[test]
    fn stale_documents_are_pruned_when_edit_is_reverted() {
        let t = trees();
        text::write_lines(&t.original.join("a.txt"), &owned(&["1"])).unwrap();
        text::write_lines(&t.modified.join("a.txt"), &owned(&["one"])).unwrap();

        diff(&t);
        assert!(t.patches.join("a.txt.patch").is_file());

        text::write_lines(&t.modified.join("a.txt"), &owned(&["1"])).unwrap();
        diff(&t);

        assert!(!t.patches.join("a.txt.patch").exists());
        assert!(!t.patches.join(REMOVED_FILES_LIST).exists());
    }

    #[test]
    fn raw_copy_is_replaced_by_document_when_baseline_catches_up() {
        let t = trees();
        // First run: the file is brand new, so it lands as a raw copy.
        text::write_lines(&t.modified.join("a.txt"), &owned(&["mine"])).unwrap();
        diff(&t);
        assert!(t.patches.join("a.txt").is_file());

        // Next baseline ships the file; the hand edit is now a text diff.
        text::write_lines(&t.original.join("a.txt"), &owned(&["upstream"])).unwrap();
        diff(&t);

        assert!(t.patches.join("a.txt.patch").is_file());
        assert!(!t.patches.join("a.txt").exists());
    }

    #[test]
    fn manifest_disappears_when_no_files_are_removed() {
        let t = trees();
        text::write_lines(&t.original.join("gone.txt"), &owned(&["g"])).unwrap();
        diff(&t);
        assert!(t.patches.join(REMOVED_FILES_LIST).is_file());

        text::write_lines(&t.modified.join("gone.txt"), &owned(&["g"])).unwrap();
        diff(&t);

        assert!(!t.patches.join(REMOVED_FILES_LIST).exists());
    }

    #[test]
    fn empty_directories_under_modified_are_pruned() {
        let t = trees();
        fs::create_dir_all(t.modified.join("was/emptied")).unwrap();
        text::write_lines(&t.modified.join("kept.txt"), &owned(&["k"])).unwrap();

        diff(&t);

        assert!(!t.modified.join("was").exists());
        assert!(t.modified.join("kept.txt").is_file());
    }

    #[test]
    fn undetermined_classification_aborts_before_any_writes() {
        let t = trees();
        text::write_lines(&t.original.join("a.txt"), &owned(&["1"])).unwrap();
        text::write_lines(&t.modified.join("a.txt"), &owned(&["one"])).unwrap();
        fs::write(t.original.join("odd.mystery"), b"?").unwrap();
        fs::write(t.modified.join("odd.mystery"), b"!").unwrap();

        let result = diff_trees(
            &t.original,
            &t.modified,
            &t.patches,
            &Classifier::with_defaults(),
        );

        match result {
            Err(DiffError::UndeterminedDiffType(path)) => assert_eq!(path, "odd.mystery"),
            other => panic!("expected undetermined diff type, got {:?}", other),
        }
        // Fail-fast: no diff action ran.
        assert!(paths::enumerate_files(&t.patches).unwrap().is_empty());
    }

    #[test]
    fn missing_inputs_are_rejected() {
        let t = trees();
        let missing = t.original.join("nope");

        assert!(matches!(
            diff_trees(&missing, &t.modified, &t.patches, &Classifier::with_defaults()),
            Err(DiffError::MissingInput(_))
        ));
        assert!(matches!(
            diff_trees(&t.original, &missing, &t.patches, &Classifier::with_defaults()),
            Err(DiffError::MissingInput(_))
        ));
    }

    #[test]
    fn excluded_directories_never_enter_the_patch_set() {
        let t = trees();
        fs::create_dir_all(t.modified.join(".git")).unwrap();
        fs::write(t.modified.join(".git/config"), b"secret").unwrap();
        text::write_lines(&t.modified.join("real.txt"), &owned(&["r"])).unwrap();

        diff(&t);

        assert!(t.patches.join("real.txt").is_file());
        assert!(!t.patches.join(".git/config").exists());
    }

    #[test]
    fn round_trip_rebuilds_the_modified_tree() {
        let t = trees();

        for root in [&t.original, &t.modified] {
            fs::create_dir_all(root.join("src")).unwrap();
            fs::create_dir_all(root.join("docs")).unwrap();
            fs::create_dir_all(root.join("assets")).unwrap();
        }

        // Baseline: text, binary, a removed file, and a nested unchanged file.
        text::write_lines(&t.original.join("src/app.rs"), &owned(&["fn main() {}", ""]))
            .unwrap();
        text::write_lines(
            &t.original.join("docs/readme.md"),
            &owned(&["# Title", "", "body"]),
        )
        .unwrap();
        fs::write(t.original.join("assets/logo.png"), b"old-bytes").unwrap();
        text::write_lines(&t.original.join("dropped.txt"), &owned(&["going away"])).unwrap();

        // Modified: edited text, changed binary, new file, dropped file.
        text::write_lines(
            &t.modified.join("src/app.rs"),
            &owned(&["fn main() {", "    run();", "}"]),
        )
        .unwrap();
        text::write_lines(
            &t.modified.join("docs/readme.md"),
            &owned(&["# Title", "", "body"]),
        )
        .unwrap();
        fs::write(t.modified.join("assets/logo.png"), b"new-bytes!").unwrap();
        text::write_lines(&t.modified.join("src/extra.rs"), &owned(&["pub fn extra() {}"]))
            .unwrap();

        diff(&t);
        let report = patch_tree(&t.original, &t.patches, &t.output, MatchMode::Exact).unwrap();

        assert!(report.is_clean());
        // The rebuilt tree matches the modified tree exactly.
        let rebuilt = paths::enumerate_source_files(&t.output).unwrap();
        let expected = paths::enumerate_source_files(&t.modified).unwrap();
        let rebuilt_relative: Vec<&String> = rebuilt.iter().map(|(_, r)| r).collect();
        let expected_relative: Vec<&String> = expected.iter().map(|(_, r)| r).collect();
        assert_eq!(rebuilt_relative, expected_relative);
        for (full, relative) in &expected {
            assert_eq!(
                fs::read(t.output.join(relative)).unwrap(),
                fs::read(full).unwrap(),
                "content mismatch for {}",
                relative
            );
        }
    }
}
