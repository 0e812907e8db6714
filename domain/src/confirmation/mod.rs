//! Confirmation subdomain: the payload carried over the confirmation bus.
//!
//! A [`ConfirmationRequest`] knows nothing about how it is presented: the
//! same request can be answered by a terminal prompt, a scripted responder,
//! or a test harness.

use crate::policy::RiskLevel;
use serde::{Deserialize, Serialize};

/// Correlation id for one bus round-trip.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ConfirmationRequestId(u64);

impl ConfirmationRequestId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ConfirmationRequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A pending authorization decision.
///
/// `id` is unassigned (zero) until the bus publishes the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationRequest {
    pub id: ConfirmationRequestId,
    pub tool_name: String,
    pub risk: RiskLevel,
    /// Paths or URLs the call would affect
    pub locations: Vec<String>,
    /// Human-readable description of the proposed call
    pub prompt: String,
}

impl ConfirmationRequest {
    pub fn new(tool_name: impl Into<String>, risk: RiskLevel) -> Self {
        let tool_name = tool_name.into();
        Self {
            id: ConfirmationRequestId::default(),
            prompt: format!("Allow {}?", tool_name),
            tool_name,
            risk,
            locations: Vec::new(),
        }
    }

    pub fn with_locations(mut self, locations: Vec<String>) -> Self {
        self.locations = locations;
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn with_id(mut self, id: ConfirmationRequestId) -> Self {
        self.id = id;
        self
    }
}

/// Answer to a [`ConfirmationRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfirmationDecision {
    Approved,
    Declined,
}

impl ConfirmationDecision {
    pub fn is_approved(&self) -> bool {
        matches!(self, ConfirmationDecision::Approved)
    }

    pub fn from_approved(approved: bool) -> Self {
        if approved {
            ConfirmationDecision::Approved
        } else {
            ConfirmationDecision::Declined
        }
    }
}

impl std::fmt::Display for ConfirmationDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfirmationDecision::Approved => write!(f, "approved"),
            ConfirmationDecision::Declined => write!(f, "declined"),
        }
    }
}
