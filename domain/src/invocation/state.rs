//! Invocation lifecycle state machine.
//!
//! Each [`InvocationLifecycle`] records the states one invocation passes
//! through. Transitions outside the table below are no-ops, so a terminal
//! state can never be re-entered.
//!
//! # State Transitions
//!
//! ```text
//! Created ──> Authorizing ──> Confirming ──> Executing ──> Succeeded
//!    │             │  │            │            │  └──────> Failed
//!    │             │  └────────────┼──────────> │
//!    │             └──> Cancelled <┘            └───────> Cancelled
//!    ├──> Cancelled   (aborted before start)
//!    └──> Failed      (unknown tool)
//! ```

use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Where an invocation is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvocationState {
    Created,
    Authorizing,
    Confirming,
    Executing,
    Succeeded,
    Failed,
    Cancelled,
}

impl InvocationState {
    pub fn as_str(&self) -> &str {
        match self {
            InvocationState::Created => "created",
            InvocationState::Authorizing => "authorizing",
            InvocationState::Confirming => "confirming",
            InvocationState::Executing => "executing",
            InvocationState::Succeeded => "succeeded",
            InvocationState::Failed => "failed",
            InvocationState::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            InvocationState::Succeeded | InvocationState::Failed | InvocationState::Cancelled
        )
    }

    /// Whether `self -> next` is a legal transition.
    pub fn can_transition_to(&self, next: InvocationState) -> bool {
        use InvocationState::*;
        matches!(
            (self, next),
            (Created, Authorizing | Cancelled | Failed)
                | (Authorizing, Confirming | Executing | Cancelled)
                | (Confirming, Executing | Cancelled)
                | (Executing, Succeeded | Failed | Cancelled)
        )
    }
}

impl std::fmt::Display for InvocationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tracks one invocation's current state, history, and elapsed time.
#[derive(Debug, Clone)]
pub struct InvocationLifecycle {
    tool_name: String,
    state: InvocationState,
    history: Vec<InvocationState>,
    started_at: Instant,
}

impl InvocationLifecycle {
    pub fn new(tool_name: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            state: InvocationState::Created,
            history: vec![InvocationState::Created],
            started_at: Instant::now(),
        }
    }

    /// Move to `next` if the transition is legal.
    ///
    /// Returns whether the state changed.
    pub fn advance(&mut self, next: InvocationState) -> bool {
        if !self.state.can_transition_to(next) {
            return false;
        }
        self.state = next;
        self.history.push(next);
        true
    }

    pub fn tool_name(&self) -> &str {
        &self.tool_name
    }

    pub fn state(&self) -> InvocationState {
        self.state
    }

    /// Every state visited, in order, starting with `Created`.
    pub fn history(&self) -> &[InvocationState] {
        &self.history
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.started_at.elapsed().as_millis() as u64
    }
}
