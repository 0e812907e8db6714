//! Tools configuration from TOML (`[tools]` section)
//!
//! ```toml
//! [tools]
//! working_dir = "/path/to/project"
//! command_timeout_secs = 300
//! fetch_timeout_secs = 15
//! max_output_bytes = 50000
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use warden_application::ExecutionParams;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileToolsConfig {
    /// Base for relative paths (default: process working directory)
    pub working_dir: Option<PathBuf>,
    /// Default `run_command` timeout
    pub command_timeout_secs: u64,
    /// Default `web_fetch` timeout
    pub fetch_timeout_secs: u64,
    /// Cap on text returned to the model per call
    pub max_output_bytes: usize,
}

impl Default for FileToolsConfig {
    fn default() -> Self {
        let defaults = ExecutionParams::default();
        Self {
            working_dir: None,
            command_timeout_secs: defaults.command_timeout.as_secs(),
            fetch_timeout_secs: defaults.fetch_timeout.as_secs(),
            max_output_bytes: defaults.max_output_bytes,
        }
    }
}

impl FileToolsConfig {
    pub fn to_execution_params(&self) -> ExecutionParams {
        let params = ExecutionParams::default()
            .with_command_timeout(Duration::from_secs(self.command_timeout_secs))
            .with_fetch_timeout(Duration::from_secs(self.fetch_timeout_secs))
            .with_max_output_bytes(self.max_output_bytes);

        match &self.working_dir {
            Some(dir) => params.with_working_dir(dir),
            None => params,
        }
    }
}
