use std::fmt;
use std::io;

use rayon::prelude::*;

/// A labeled unit of independent side-effecting work.
pub struct Action<'a> {
    label: String,
    run: Box<dyn FnOnce() -> io::Result<()> + Send + 'a>,
}

impl<'a> Action<'a> {
    pub fn new(
        label: impl Into<String>,
        run: impl FnOnce() -> io::Result<()> + Send + 'a,
    ) -> Self {
        Action {
            label: label.into(),
            run: Box::new(run),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

/// Failure of one action in a batch, identifying which one.
#[derive(Debug)]
pub struct ActionError {
    pub label: String,
    pub source: io::Error,
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "action '{}' failed: {}", self.label, self.source)
    }
}

impl std::error::Error for ActionError {}

/// Run a batch of independent actions, bounded by hardware parallelism.
///
/// Order of execution is unspecified. An erroring action stops remaining
/// scheduled work in the batch; actions already running finish, and
/// completed effects are not rolled back.
pub fn execute(actions: Vec<Action<'_>>) -> Result<(), ActionError> {
    actions.into_par_iter().try_for_each(|action| {
        let Action { label, run } = action;
        run().map_err(|source| ActionError { label, source })
    })
}
