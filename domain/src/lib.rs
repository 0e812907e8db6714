//! Domain layer for warden
//!
//! This crate contains the pure decision logic of the tool execution core.
//! It has no dependencies on async runtimes, I/O, or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Tool
//!
//! A tool is described to the model by a [`ToolSchema`] and called with a
//! [`ToolCall`]. Every call ends in exactly one [`ToolResult`], success or
//! a typed [`ToolError`].
//!
//! ## Policy
//!
//! The [`PolicyEngine`] decides, per call, whether it runs unattended
//! (`allow`), needs confirmation (`ask`), or must not run (`deny`).
//! Rules are evaluated in declaration order; the first match wins.
//!
//! ## Confirmation
//!
//! An `ask` decision becomes a [`ConfirmationRequest`] answered with a
//! [`ConfirmationDecision`]. How the question is put to a human lives
//! outside this crate.
//!
//! ## Invocation
//!
//! [`InvocationLifecycle`] records the states a call passes through:
//! `Created → Authorizing → Confirming → Executing → Succeeded | Failed | Cancelled`.

pub mod confirmation;
pub mod core;
pub mod invocation;
pub mod policy;
pub mod tool;

// Re-export commonly used types
pub use confirmation::{ConfirmationDecision, ConfirmationRequest, ConfirmationRequestId};
pub use core::string::{truncate, truncate_output};
pub use invocation::{InvocationLifecycle, InvocationState};
pub use policy::{
    ConditionOperator, MatchedRule, PolicyAction, PolicyCondition, PolicyConfig,
    PolicyConfigError, PolicyDecision, PolicyDenied, PolicyEngine, PolicyExplanation, PolicyRule,
    RiskLevel, ToolMatcher,
};
pub use tool::{
    DefaultToolValidator, ToolCall, ToolError, ToolErrorKind, ToolKind, ToolParameter,
    ToolResult, ToolResultMetadata, ToolSchema, ToolValidator,
};
