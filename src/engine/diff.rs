use similar::{Algorithm, DiffOp, capture_diff_slices, group_diff_ops};

use super::document::{Hunk, HunkLine};

/// Context lines captured on each side of a change.
pub const CONTEXT_LINES: usize = 3;

/// Diff two line sequences into hunks. Identical inputs produce no hunks;
/// applying the result in exact mode reproduces `modified`.
pub fn diff_lines(original: &[String], modified: &[String]) -> Vec<Hunk> {
    let ops = capture_diff_slices(Algorithm::Myers, original, modified);
    group_diff_ops(ops, CONTEXT_LINES)
        .into_iter()
        .filter_map(|group| hunk_from_group(&group, original, modified))
        .collect()
}

fn hunk_from_group(group: &[DiffOp], original: &[String], modified: &[String]) -> Option<Hunk> {
    let first = group.first()?;
    let original_start = first.old_range().start;
    let modified_start = first.new_range().start;

    let mut lines = Vec::new();
    for op in group {
        match *op {
            DiffOp::Equal { old_index, len, .. } => {
                for line in &original[old_index..old_index + len] {
                    lines.push(HunkLine::Context(line.clone()));
                }
            }
            DiffOp::Delete {
                old_index, old_len, ..
            } => {
                for line in &original[old_index..old_index + old_len] {
                    lines.push(HunkLine::Removed(line.clone()));
                }
            }
            DiffOp::Insert {
                new_index, new_len, ..
            } => {
                for line in &modified[new_index..new_index + new_len] {
                    lines.push(HunkLine::Added(line.clone()));
                }
            }
            DiffOp::Replace {
                old_index,
                old_len,
                new_index,
                new_len,
            } => {
                for line in &original[old_index..old_index + old_len] {
                    lines.push(HunkLine::Removed(line.clone()));
                }
                for line in &modified[new_index..new_index + new_len] {
                    lines.push(HunkLine::Added(line.clone()));
                }
            }
        }
    }

    Some(Hunk {
        original_start,
        modified_start,
        lines,
    })
}
