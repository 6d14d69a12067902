use std::collections::HashSet;
use std::fs;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::engine::apply::MatchMode;
use crate::error::PatchError;
use crate::patch::file_patcher::FilePatcher;
use crate::patch::report::{PatchReport, ReportAggregator};
use crate::patch::{PATCH_EXTENSION, REMOVED_FILES_LIST};
use crate::utils::parallel::{self, Action};
use crate::utils::paths;

/// Rebuild the modified tree: apply a patch set against `original_dir`,
/// producing `output_dir` and a report of every hunk placement.
///
/// Three groups of bounded-parallel work run as sequential barriers —
/// patch applications, patch-set raw copies, then baseline copies. Their
/// target paths are disjoint by construction: a baseline copy is only
/// scheduled for paths no patch-set entry claims. Afterwards, stale files
/// under `output_dir` (anything this run did not produce) are pruned.
///
/// Tree mutation is not transactional: if a group aborts, `output_dir` may
/// hold a mix of rebuilt and leftover paths.
pub fn patch_tree(
    original_dir: &Path,
    patches_dir: &Path,
    output_dir: &Path,
    mode: MatchMode,
) -> Result<PatchReport, PatchError> {
    if !original_dir.is_dir() {
        return Err(PatchError::MissingInput(original_dir.to_path_buf()));
    }
    if !patches_dir.is_dir() {
        return Err(PatchError::MissingInput(patches_dir.to_path_buf()));
    }
    fs::create_dir_all(output_dir).map_err(|source| PatchError::Io {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let removed = load_removed_files(patches_dir)?;
    let patch_entries = paths::enumerate_files(patches_dir).map_err(|source| PatchError::Io {
        path: patches_dir.to_path_buf(),
        source,
    })?;
    let original_files =
        paths::enumerate_source_files(original_dir).map_err(|source| PatchError::Io {
            path: original_dir.to_path_buf(),
            source,
        })?;

    let aggregator = ReportAggregator::new();
    let mut produced: HashSet<String> = HashSet::new();

    let mut patch_actions = Vec::new();
    let mut copy_actions = Vec::new();
    for (full_path, relative_path) in &patch_entries {
        if let Some(target) = relative_path.strip_suffix(PATCH_EXTENSION) {
            produced.insert(target.to_string());
            let aggregator = &aggregator;
            patch_actions.push(Action::new(relative_path.clone(), move || {
                let mut patcher = FilePatcher::load(full_path, original_dir, output_dir)?;
                patcher.patch(mode)?;
                patcher.save()?;
                aggregator.add(patcher.result());
                Ok(())
            }));
        } else if relative_path != REMOVED_FILES_LIST {
            produced.insert(relative_path.clone());
            copy_actions.push(Action::new(relative_path.clone(), move || {
                paths::copy_file(full_path, &output_dir.join(relative_path))
            }));
        }
    }

    let mut baseline_actions = Vec::new();
    for (full_path, relative_path) in &original_files {
        if removed.contains(relative_path) || produced.contains(relative_path) {
            continue;
        }
        produced.insert(relative_path.clone());
        baseline_actions.push(Action::new(relative_path.clone(), move || {
            paths::copy_file(full_path, &output_dir.join(relative_path))
        }));
    }

    info!(
        patches = patch_actions.len(),
        copies = copy_actions.len(),
        baseline = baseline_actions.len(),
        skipped = removed.len(),
        "applying patch set"
    );

    parallel::execute(patch_actions).map_err(action_error)?;
    parallel::execute(copy_actions).map_err(action_error)?;
    parallel::execute(baseline_actions).map_err(action_error)?;

    prune_stale_outputs(output_dir, &produced);

    Ok(aggregator.compile())
}

fn action_error(error: parallel::ActionError) -> PatchError {
    PatchError::Action {
        path: error.label,
        source: error.source,
    }
}

fn load_removed_files(patches_dir: &Path) -> Result<HashSet<String>, PatchError> {
    let manifest_path = patches_dir.join(REMOVED_FILES_LIST);
    if !manifest_path.is_file() {
        return Ok(HashSet::new());
    }
    let content = fs::read_to_string(&manifest_path).map_err(|source| PatchError::Io {
        path: manifest_path.clone(),
        source,
    })?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}

// Failures here are surfaced as warnings only; they never override the
// primary outcome of the run.
fn prune_stale_outputs(output_dir: &Path, produced: &HashSet<String>) {
    let entries = match paths::enumerate_source_files(output_dir) {
        Ok(entries) => entries,
        Err(error) => {
            warn!(path = %output_dir.display(), %error, "skipping stale-output pruning");
            return;
        }
    };
    for (full_path, relative_path) in entries {
        if produced.contains(&relative_path) {
            continue;
        }
        debug!(path = %relative_path, "removing stale output");
        if let Err(error) = fs::remove_file(&full_path) {
            warn!(path = %relative_path, %error, "failed to remove stale output");
        }
    }
    if let Err(error) = paths::delete_empty_directories(output_dir) {
        warn!(path = %output_dir.display(), %error, "failed to prune empty directories");
    }
}
