//! Job state file provider.
//!
//! The host process writes its current job state to a small JSON file:
//!
//! ```json
//! {"executing": {"job_id": "j1", "workflow_id": "wf-1"}, "pending": null}
//! ```
//!
//! The file is read once per lookup so both entries come from the same
//! write. A missing file means no job is active.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use logrelay_core::error::ContextError;
use logrelay_router::context::{ExecutionSnapshot, ExecutionStateProvider, ExtraData};

/// Execution state provider backed by a JSON file.
#[derive(Debug, Clone)]
pub struct StateFileProvider {
    path: PathBuf,
}

impl StateFileProvider {
    /// Create a provider reading from `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the state file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<ExecutionSnapshot, ContextError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(ExecutionSnapshot::default()),
            Err(e) => {
                return Err(ContextError::Unavailable(format!(
                    "{}: {e}",
                    self.path.display()
                )));
            }
        };
        if content.trim().is_empty() {
            return Ok(ExecutionSnapshot::default());
        }
        serde_json::from_str(&content)
            .map_err(|e| ContextError::Malformed(format!("{}: {e}", self.path.display())))
    }
}

impl ExecutionStateProvider for StateFileProvider {
    fn executing(&self) -> Result<Option<ExtraData>, ContextError> {
        Ok(self.read()?.executing)
    }

    fn pending(&self) -> Result<Option<ExtraData>, ContextError> {
        Ok(self.read()?.pending)
    }

    fn snapshot(&self) -> Result<ExecutionSnapshot, ContextError> {
        self.read()
    }
}
