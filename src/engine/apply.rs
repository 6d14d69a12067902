use serde::Serialize;

use super::document::{Hunk, HunkLine};

/// Escalating tolerance for relocating a hunk in a drifted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    Exact,
    Offset,
    Fuzzy,
}

/// How far from the recorded position offset search will look, in lines.
pub const OFFSET_SEARCH_RADIUS: usize = 128;

/// Mismatched context lines tolerated per candidate position in fuzzy mode.
pub const FUZZY_CONTEXT_TOLERANCE: usize = 2;

/// The result of placing one hunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HunkOutcome {
    pub header: String,
    pub success: bool,
    /// Mode that actually placed the hunk; `None` on failure. A hunk that
    /// lands on its recorded position reports `Exact` even under a more
    /// permissive requested mode.
    pub mode: Option<MatchMode>,
    pub offset_warning: bool,
    pub summary: String,
}

struct PatternLine<'a> {
    text: &'a str,
    is_context: bool,
}

struct Located {
    position: usize,
    mismatches: usize,
}

/// Apply hunks in document order. Each placed hunk shifts the positions of
/// the ones after it by its net line delta; a failed hunk shifts nothing
/// and the rest still run.
pub fn apply_hunks(
    original: &[String],
    hunks: &[Hunk],
    mode: MatchMode,
) -> (Vec<String>, Vec<HunkOutcome>) {
    let mut result: Vec<String> = original.to_vec();
    let mut outcomes = Vec::with_capacity(hunks.len());
    let mut delta = 0isize;

    for hunk in hunks {
        let pattern = pattern_of(hunk);
        let limit = result.len().saturating_sub(pattern.len()) as isize;
        let anchor = hunk.original_start as isize + delta;
        let target = anchor.clamp(0, limit.max(0)) as usize;

        let radius = match mode {
            MatchMode::Exact => 0,
            MatchMode::Offset | MatchMode::Fuzzy => OFFSET_SEARCH_RADIUS,
        };
        let mut located = find_match(&result, &pattern, target, radius, 0);
        if located.is_none() && mode == MatchMode::Fuzzy {
            located = find_match(
                &result,
                &pattern,
                target,
                OFFSET_SEARCH_RADIUS,
                FUZZY_CONTEXT_TOLERANCE,
            );
        }

        match located {
            Some(found) => {
                let relocated = found.position != target;
                let used = if found.mismatches > 0 {
                    MatchMode::Fuzzy
                } else if relocated {
                    MatchMode::Offset
                } else {
                    MatchMode::Exact
                };
                let replacement = splice_replacement(hunk, &result, found.position);
                let removed_len = pattern.len();
                let added_len = replacement.len();
                result.splice(found.position..found.position + removed_len, replacement);
                delta += added_len as isize - removed_len as isize;

                let summary = match used {
                    MatchMode::Exact => {
                        format!("applied exactly at line {}", found.position + 1)
                    }
                    MatchMode::Offset => format!(
                        "applied at line {} (offset {:+})",
                        found.position + 1,
                        found.position as isize - target as isize
                    ),
                    MatchMode::Fuzzy => format!(
                        "applied at line {} with {} mismatched context line(s)",
                        found.position + 1,
                        found.mismatches
                    ),
                };
                outcomes.push(HunkOutcome {
                    header: hunk.header(),
                    success: true,
                    mode: Some(used),
                    offset_warning: relocated,
                    summary,
                });
            }
            None => {
                let summary = match mode {
                    MatchMode::Exact => format!("no match at line {}", target + 1),
                    MatchMode::Offset | MatchMode::Fuzzy => format!(
                        "no match within {} lines of line {}",
                        OFFSET_SEARCH_RADIUS,
                        target + 1
                    ),
                };
                outcomes.push(HunkOutcome {
                    header: hunk.header(),
                    success: false,
                    mode: None,
                    offset_warning: false,
                    summary,
                });
            }
        }
    }

    (result, outcomes)
}

fn pattern_of(hunk: &Hunk) -> Vec<PatternLine<'_>> {
    hunk.lines
        .iter()
        .filter_map(|line| match line {
            HunkLine::Context(text) => Some(PatternLine {
                text: text.as_str(),
                is_context: true,
            }),
            HunkLine::Removed(text) => Some(PatternLine {
                text: text.as_str(),
                is_context: false,
            }),
            HunkLine::Added(_) => None,
        })
        .collect()
}

// Symmetric expanding search: the target first, then distance 1 below and
// above, then distance 2, out to the radius.
fn find_match(
    lines: &[String],
    pattern: &[PatternLine<'_>],
    target: usize,
    radius: usize,
    tolerance: usize,
) -> Option<Located> {
    if pattern.is_empty() {
        return Some(Located {
            position: target,
            mismatches: 0,
        });
    }
    if pattern.len() > lines.len() {
        return None;
    }
    let max_position = lines.len() - pattern.len();

    let mut candidates = vec![target];
    for distance in 1..=radius {
        if distance <= target {
            candidates.push(target - distance);
        }
        if target + distance <= max_position {
            candidates.push(target + distance);
        }
    }

    for position in candidates {
        if let Some(mismatches) = matches_at(lines, pattern, position, tolerance) {
            return Some(Located {
                position,
                mismatches,
            });
        }
    }
    None
}

// Removed lines must always match; context lines may miss up to the
// tolerance. Returns the mismatch count on a match.
fn matches_at(
    lines: &[String],
    pattern: &[PatternLine<'_>],
    position: usize,
    tolerance: usize,
) -> Option<usize> {
    let mut mismatches = 0;
    for (index, expected) in pattern.iter().enumerate() {
        if lines[position + index] != expected.text {
            if !expected.is_context {
                return None;
            }
            mismatches += 1;
            if mismatches > tolerance {
                return None;
            }
        }
    }
    Some(mismatches)
}

// The replacement keeps the file's actual context lines, so a fuzzy match
// never clobbers drifted context with the hunk's stale copy.
fn splice_replacement(hunk: &Hunk, lines: &[String], position: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut offset = 0;
    for line in &hunk.lines {
        match line {
            HunkLine::Context(_) => {
                out.push(lines[position + offset].clone());
                offset += 1;
            }
            HunkLine::Removed(_) => {
                offset += 1;
            }
            HunkLine::Added(text) => out.push(text.clone()),
        }
    }
    out
}
