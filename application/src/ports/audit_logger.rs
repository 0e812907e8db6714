//! Port for the structured audit trail.
//!
//! Defines the [`AuditLogger`] trait for recording authorization and
//! execution events (policy decisions, confirmations, completed calls) as
//! machine-readable records.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostics, while this port captures who was allowed to
//! do what, and why.

use serde_json::Value;
use warden_domain::{
    ConfirmationDecision, ConfirmationRequest, InvocationState, PolicyAction, ToolResult,
};

/// A structured audit event.
///
/// Each event has a type string and a JSON payload with event-specific
/// fields. The adapter adds the timestamp.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    /// Event type identifier (e.g., "policy_decision", "tool_completed").
    pub event_type: &'static str,
    pub payload: Value,
}

impl AuditEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }

    /// The policy verdict for a call, before any confirmation.
    pub fn policy_decision(
        tool_name: &str,
        call_id: Option<&str>,
        action: PolicyAction,
        detail: Option<&str>,
    ) -> Self {
        Self::new(
            "policy_decision",
            serde_json::json!({
                "tool": tool_name,
                "call_id": call_id,
                "action": action,
                "detail": detail,
            }),
        )
    }

    /// `request` must already carry its bus id.
    pub fn confirmation_requested(request: &ConfirmationRequest, call_id: Option<&str>) -> Self {
        Self::new(
            "confirmation_requested",
            serde_json::json!({
                "tool": request.tool_name,
                "call_id": call_id,
                "request_id": request.id.value(),
                "risk": request.risk,
                "locations": request.locations,
                "prompt": request.prompt,
            }),
        )
    }

    pub fn confirmation_resolved(
        request: &ConfirmationRequest,
        call_id: Option<&str>,
        decision: ConfirmationDecision,
    ) -> Self {
        Self::new(
            "confirmation_resolved",
            serde_json::json!({
                "tool": request.tool_name,
                "call_id": call_id,
                "request_id": request.id.value(),
                "decision": decision,
            }),
        )
    }

    pub fn tool_completed(
        result: &ToolResult,
        call_id: Option<&str>,
        state: InvocationState,
        duration_ms: u64,
    ) -> Self {
        Self::new(
            "tool_completed",
            serde_json::json!({
                "tool": result.tool_name,
                "call_id": call_id,
                "state": state,
                "error": result.error,
                "duration_ms": duration_ms,
            }),
        )
    }
}

/// Port for recording audit events.
///
/// `log` is synchronous and infallible so that a broken log file never
/// interrupts a tool call; adapters swallow their own write failures.
pub trait AuditLogger: Send + Sync {
    fn log(&self, event: AuditEvent);
}

/// No-op implementation for tests and when auditing is disabled.
pub struct NoAuditLogger;

impl AuditLogger for NoAuditLogger {
    fn log(&self, _event: AuditEvent) {}
}
