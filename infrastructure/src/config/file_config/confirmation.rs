//! Confirmation configuration from TOML (`[confirmation]` section)

use serde::{Deserialize, Serialize};
use warden_application::ConfirmationMode;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfirmationConfig {
    /// `interactive`, `auto_approve` or `auto_decline`
    pub mode: ConfirmationMode,
}
