//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

mod confirmation;
mod logging;
mod policy;
mod tools;

pub use confirmation::FileConfirmationConfig;
pub use logging::FileLoggingConfig;
pub use policy::FilePolicyConfig;
pub use tools::FileToolsConfig;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use warden_application::{ConfirmationMode, ExecutionParams};
use warden_domain::{PolicyConfig, PolicyConfigError};

/// Configuration validation errors
#[derive(Debug, Error)]
pub enum ConfigValidationError {
    #[error("tools.command_timeout_secs cannot be 0")]
    InvalidCommandTimeout,

    #[error("tools.fetch_timeout_secs cannot be 0")]
    InvalidFetchTimeout,

    #[error("tools.max_output_bytes cannot be 0")]
    InvalidMaxOutput,

    #[error("invalid policy: {0}")]
    Policy(#[from] PolicyConfigError),
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Authorization rules
    pub policy: FilePolicyConfig,
    /// Built-in tool settings
    pub tools: FileToolsConfig,
    /// Who answers `ask` decisions
    pub confirmation: FileConfirmationConfig,
    /// Audit log settings
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.tools.command_timeout_secs == 0 {
            return Err(ConfigValidationError::InvalidCommandTimeout);
        }
        if self.tools.fetch_timeout_secs == 0 {
            return Err(ConfigValidationError::InvalidFetchTimeout);
        }
        if self.tools.max_output_bytes == 0 {
            return Err(ConfigValidationError::InvalidMaxOutput);
        }
        self.policy.to_policy_config().validate()?;
        Ok(())
    }

    /// Validated domain rule set.
    pub fn policy_config(&self) -> Result<PolicyConfig, ConfigValidationError> {
        let config = self.policy.to_policy_config();
        config.validate()?;
        Ok(config)
    }

    pub fn execution_params(&self) -> ExecutionParams {
        self.tools.to_execution_params()
    }

    pub fn confirmation_mode(&self) -> ConfirmationMode {
        self.confirmation.mode
    }
}
