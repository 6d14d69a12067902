use std::fmt;
use std::io;
use std::path::PathBuf;

/// Error type for the diff operation.
#[derive(Debug)]
pub enum DiffError {
    /// Required input directory absent; nothing was scheduled.
    MissingInput(PathBuf),
    /// The classifier chain reached no decision for a file; the run aborts
    /// before any diff action is scheduled.
    UndeterminedDiffType(String),
    /// I/O failure while enumerating trees or finalizing the patch set.
    Io { path: PathBuf, source: io::Error },
    /// A scheduled diff action failed; remaining actions were abandoned.
    Action { path: String, source: io::Error },
}

impl fmt::Display for DiffError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffError::MissingInput(path) => {
                write!(f, "required directory not found: '{}'", path.display())
            }
            DiffError::UndeterminedDiffType(path) => {
                write!(f, "no diff type determined for '{}'", path)
            }
            DiffError::Io { path, source } => {
                write!(f, "io failure at '{}': {}", path.display(), source)
            }
            DiffError::Action { path, source } => {
                write!(f, "diff failed for '{}': {}", path, source)
            }
        }
    }
}

impl std::error::Error for DiffError {}

/// Error type for the patch operation. Per-hunk placement failures are not
/// errors; they surface in the report.
#[derive(Debug)]
pub enum PatchError {
    /// Required input directory absent; nothing was scheduled.
    MissingInput(PathBuf),
    /// I/O failure while loading the manifest or enumerating trees.
    Io { path: PathBuf, source: io::Error },
    /// A scheduled patch or copy action failed; remaining actions in its
    /// group were abandoned.
    Action { path: String, source: io::Error },
}

impl fmt::Display for PatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchError::MissingInput(path) => {
                write!(f, "required directory not found: '{}'", path.display())
            }
            PatchError::Io { path, source } => {
                write!(f, "io failure at '{}': {}", path.display(), source)
            }
            PatchError::Action { path, source } => {
                write!(f, "patching failed for '{}': {}", path, source)
            }
        }
    }
}

impl std::error::Error for PatchError {}
