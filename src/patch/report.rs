use std::fs;
use std::io;
use std::path::Path;
use std::sync::Mutex;

use serde::Serialize;

use crate::engine::apply::{HunkOutcome, MatchMode};

/// Per-file outcome detail: the document's paths plus one record per hunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilePatchResult {
    pub original_path: String,
    pub modified_path: String,
    pub hunks: Vec<HunkOutcome>,
}

/// The finalized report of a patch operation. Counts are per hunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchReport {
    pub successes: usize,
    pub failures: usize,
    pub warnings: usize,
    pub exacts: usize,
    pub offsets: usize,
    pub fuzzies: usize,
    pub files: Vec<FilePatchResult>,
}

impl PatchReport {
    pub fn is_clean(&self) -> bool {
        self.failures == 0
    }

    pub fn save(&self, path: &Path) -> io::Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(path, content)
    }
}

/// Thread-safe append-only collection of per-file outcomes, reduced to a
/// [`PatchReport`] once all appenders are done. `compile` takes the
/// aggregator by value, so further appends are impossible by construction.
#[derive(Default)]
pub struct ReportAggregator {
    results: Mutex<Vec<FilePatchResult>>,
}

impl ReportAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, result: FilePatchResult) {
        self.results
            .lock()
            .expect("report aggregator mutex poisoned")
            .push(result);
    }

    pub fn compile(self) -> PatchReport {
        let mut files = self
            .results
            .into_inner()
            .expect("report aggregator mutex poisoned");
        // Appenders finish in arbitrary order; sorting keeps reports
        // identical across runs.
        files.sort_by(|a, b| a.original_path.cmp(&b.original_path));

        let mut report = PatchReport {
            successes: 0,
            failures: 0,
            warnings: 0,
            exacts: 0,
            offsets: 0,
            fuzzies: 0,
            files,
        };
        for file in &report.files {
            for hunk in &file.hunks {
                if hunk.success {
                    report.successes += 1;
                } else {
                    report.failures += 1;
                }
                if hunk.offset_warning {
                    report.warnings += 1;
                }
                match hunk.mode {
                    Some(MatchMode::Exact) => report.exacts += 1,
                    Some(MatchMode::Offset) => report.offsets += 1,
                    Some(MatchMode::Fuzzy) => report.fuzzies += 1,
                    None => {}
                }
            }
        }
        report
    }
}
