//! Execution parameters: how built-in tools behave.
//!
//! [`ExecutionParams`] groups the static knobs shared by tool
//! implementations: where relative paths resolve, how long external
//! processes and requests may run, and how much output is returned to the
//! model. These are application-layer concerns, not policy.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Tool execution parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionParams {
    /// Base for relative paths; the process working directory when unset.
    pub working_dir: Option<PathBuf>,
    /// Default timeout for `run_command`, overridable per call.
    pub command_timeout: Duration,
    /// Default timeout for `web_fetch`, overridable per call.
    pub fetch_timeout: Duration,
    /// Upper bound on text returned to the model from one call.
    pub max_output_bytes: usize,
}

impl Default for ExecutionParams {
    fn default() -> Self {
        Self {
            working_dir: None,
            command_timeout: Duration::from_secs(120),
            fetch_timeout: Duration::from_secs(30),
            max_output_bytes: 100_000,
        }
    }
}

impl ExecutionParams {
    // ==================== Builder Methods ====================

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_max_output_bytes(mut self, max: usize) -> Self {
        self.max_output_bytes = max;
        self
    }

    /// Resolve `path` against the working directory.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        let candidate = Path::new(path);
        match &self.working_dir {
            Some(base) if candidate.is_relative() => base.join(candidate),
            _ => candidate.to_path_buf(),
        }
    }
}
