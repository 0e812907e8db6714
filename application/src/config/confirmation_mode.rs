//! How `ask` decisions are answered when no one is watching.

use serde::{Deserialize, Serialize};

/// Which responder is attached to the confirmation bus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationMode {
    /// Prompt on the terminal
    #[default]
    Interactive,
    /// Approve every request
    AutoApprove,
    /// Decline every request
    AutoDecline,
}

impl ConfirmationMode {
    pub fn as_str(&self) -> &str {
        match self {
            ConfirmationMode::Interactive => "interactive",
            ConfirmationMode::AutoApprove => "auto_approve",
            ConfirmationMode::AutoDecline => "auto_decline",
        }
    }
}

impl std::fmt::Display for ConfirmationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ConfirmationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "interactive" => Ok(ConfirmationMode::Interactive),
            "auto_approve" | "yes" => Ok(ConfirmationMode::AutoApprove),
            "auto_decline" | "no" => Ok(ConfirmationMode::AutoDecline),
            other => Err(format!("unknown confirmation mode: {}", other)),
        }
    }
}
