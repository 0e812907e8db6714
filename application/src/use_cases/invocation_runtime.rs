//! Invocation runtime use case.
//!
//! Drives one tool call through its lifecycle and always ends in a
//! [`ToolResult`]. Nothing a tool does, panics included, escapes this
//! boundary:
//!
//! ```text
//! Created ─▶ Authorizing ─┬─ deny ────────────────────────▶ Cancelled (PolicyDenied)
//!                         ├─ ask ─▶ Confirming ─┬─ decline ─▶ Cancelled (CancelledError)
//!                         │                     └─ approve ─┐
//!                         └─ allow ─────────────────────────┴▶ Executing ─▶ Succeeded | Failed | Cancelled
//! ```
//!
//! Policy denial surfaces exactly like any execution failure: a result
//! whose `error.kind` is [`ToolErrorKind::PolicyDenied`]. The agent loop has
//! one handling path for every outcome.
//!
//! Invocations are independent. [`run_batch`](InvocationRuntime::run_batch)
//! polls them concurrently and returns reports in submission order; no
//! ordering is promised for when the underlying effects happen.

use crate::ports::audit_logger::{AuditEvent, AuditLogger, NoAuditLogger};
use crate::ports::tool::{OutputSink, ToolContext, ToolInvocation};
use crate::tool_registry::ToolRegistry;
use crate::use_cases::shared::{check_cancelled, panic_message};
use futures::FutureExt;
use futures::future::join_all;
use serde::Serialize;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use warden_domain::{
    InvocationLifecycle, InvocationState, PolicyAction, ToolCall, ToolError, ToolErrorKind,
    ToolResult,
};

/// Everything known about one finished invocation.
#[derive(Debug, Clone, Serialize)]
pub struct InvocationReport {
    pub tool_name: String,
    /// Provider call id, echoed from the call
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_id: Option<String>,
    /// Terminal state
    pub state: InvocationState,
    /// States visited, starting with `Created`
    pub history: Vec<InvocationState>,
    pub duration_ms: u64,
    pub result: ToolResult,
}

impl InvocationReport {
    pub fn is_success(&self) -> bool {
        self.result.is_success()
    }

    /// Relabel a cancellation caused by an overall deadline as a
    /// `TimeoutError`. Any other outcome is returned unchanged.
    ///
    /// The state stays `Cancelled`: the deadline reaches the invocation
    /// through its cancellation token.
    pub fn deadline_exceeded(mut self, deadline: Duration) -> Self {
        if self.state != InvocationState::Cancelled
            || self.result.error_kind() != Some(ToolErrorKind::Cancelled)
        {
            return self;
        }
        let error = ToolError::timeout(format!(
            "{} exceeded the {}s deadline",
            self.tool_name,
            deadline.as_secs()
        ));
        let metadata = std::mem::take(&mut self.result.metadata);
        self.result = ToolResult::failure(&self.tool_name, error);
        self.result.metadata = metadata;
        self
    }
}

/// Use case for running tool calls end to end.
///
/// 1. Resolve the tool by name (unknown names become `ToolNotFoundError`)
/// 2. Ask the invocation whether confirmation is needed (policy + tool kind)
/// 3. If so, publish on the confirmation bus and wait, racing `cancel`
/// 4. Execute, racing `cancel`, catching panics
/// 5. Report the terminal state and result
#[derive(Clone)]
pub struct InvocationRuntime {
    registry: Arc<ToolRegistry>,
    audit_logger: Arc<dyn AuditLogger>,
}

impl InvocationRuntime {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            audit_logger: Arc::new(NoAuditLogger),
        }
    }

    /// Create with an audit logger.
    pub fn with_audit_logger(mut self, logger: Arc<dyn AuditLogger>) -> Self {
        self.audit_logger = logger;
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Resolve `call` against the registry and run it.
    pub async fn run_call(
        &self,
        call: ToolCall,
        context: &ToolContext,
        cancel: &CancellationToken,
        on_output: Option<&OutputSink>,
    ) -> InvocationReport {
        let tool = match self.registry.resolve(&call.tool_name) {
            Ok(tool) => tool,
            Err(e) => {
                warn!(tool = %call.tool_name, "{}", e);
                let mut lifecycle = InvocationLifecycle::new(&call.tool_name);
                lifecycle.advance(InvocationState::Failed);
                let result = ToolResult::failure(
                    &call.tool_name,
                    ToolError::tool_not_found(&call.tool_name),
                );
                return self.finish(lifecycle, call.call_id, result);
            }
        };

        let invocation = tool.create_invocation(call, context.clone());
        self.run(invocation, cancel, on_output).await
    }

    /// Run several calls concurrently.
    ///
    /// Reports come back in submission order; each is isolated from its
    /// siblings, so one failure never affects another result.
    pub async fn run_batch(
        &self,
        calls: Vec<ToolCall>,
        context: &ToolContext,
        cancel: &CancellationToken,
    ) -> Vec<InvocationReport> {
        debug!(count = calls.len(), "Running tool batch");
        join_all(
            calls
                .into_iter()
                .map(|call| self.run_call(call, context, cancel, None)),
        )
        .await
    }

    /// Drive an already-bound invocation through its lifecycle.
    pub async fn run(
        &self,
        invocation: Box<dyn ToolInvocation>,
        cancel: &CancellationToken,
        on_output: Option<&OutputSink>,
    ) -> InvocationReport {
        let tool_name = invocation.call().tool_name.clone();
        let call_id = invocation.call().call_id.clone();
        let mut lifecycle = InvocationLifecycle::new(&tool_name);

        if let Err(e) = check_cancelled(cancel, "before execution started") {
            lifecycle.advance(InvocationState::Cancelled);
            return self.finish(lifecycle, call_id, ToolResult::failure(&tool_name, e));
        }

        // ---- Authorizing ----
        lifecycle.advance(InvocationState::Authorizing);
        let confirmation = match invocation.should_confirm_execute(cancel).await {
            Ok(confirmation) => confirmation,
            Err(denied) => {
                info!(tool = %tool_name, matched = %denied.matched, "Blocked by policy");
                self.audit_logger.log(AuditEvent::policy_decision(
                    &tool_name,
                    call_id.as_deref(),
                    PolicyAction::Deny,
                    Some(&denied.to_string()),
                ));
                lifecycle.advance(InvocationState::Cancelled);
                let result =
                    ToolResult::failure(&tool_name, ToolError::policy_denied(denied.to_string()));
                return self.finish(lifecycle, call_id, result);
            }
        };

        // ---- Confirming ----
        if let Some(request) = confirmation {
            self.audit_logger.log(AuditEvent::policy_decision(
                &tool_name,
                call_id.as_deref(),
                PolicyAction::Ask,
                Some(request.risk.as_str()),
            ));
            lifecycle.advance(InvocationState::Confirming);
            let bus = &invocation.context().confirmation_bus;
            let request = bus.stamp(request);
            debug!(
                tool = %tool_name,
                request = %request.id,
                risk = %request.risk,
                "Awaiting confirmation"
            );
            self.audit_logger.log(AuditEvent::confirmation_requested(
                &request,
                call_id.as_deref(),
            ));

            let decision = bus.send(request.clone(), cancel).await;
            self.audit_logger.log(AuditEvent::confirmation_resolved(
                &request,
                call_id.as_deref(),
                decision,
            ));

            if !decision.is_approved() {
                lifecycle.advance(InvocationState::Cancelled);
                let error = match check_cancelled(cancel, "while awaiting confirmation") {
                    Err(e) => e,
                    Ok(()) => ToolError::cancelled(format!(
                        "Execution of {} was declined by user",
                        tool_name
                    )),
                };
                info!(tool = %tool_name, "{}", error.message);
                return self.finish(lifecycle, call_id, ToolResult::failure(&tool_name, error));
            }
        } else {
            self.log_unconfirmed(invocation.as_ref(), call_id.as_deref());
        }

        if let Err(e) = check_cancelled(cancel, "before execution started") {
            lifecycle.advance(InvocationState::Cancelled);
            return self.finish(lifecycle, call_id, ToolResult::failure(&tool_name, e));
        }

        // ---- Executing ----
        lifecycle.advance(InvocationState::Executing);
        debug!(tool = %tool_name, "Executing");
        let execution = AssertUnwindSafe(invocation.execute(cancel, on_output)).catch_unwind();

        let result = tokio::select! {
            biased;
            outcome = execution => match outcome {
                Ok(result) => result,
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    warn!(tool = %tool_name, panic = %message, "Tool panicked");
                    ToolResult::failure(
                        &tool_name,
                        ToolError::execution_failed(format!("Tool panicked: {}", message)),
                    )
                }
            },
            _ = cancel.cancelled() => ToolResult::failure(
                &tool_name,
                ToolError::cancelled("Cancelled during execution"),
            ),
        };

        let terminal = match result.error_kind() {
            None => InvocationState::Succeeded,
            Some(ToolErrorKind::Cancelled) => InvocationState::Cancelled,
            Some(_) => InvocationState::Failed,
        };
        lifecycle.advance(terminal);
        self.finish(lifecycle, call_id, result)
    }

    /// Record the policy verdict for a call that proceeds without asking.
    ///
    /// A read-only tool skips confirmation even when the policy says `ask`;
    /// the record keeps the policy's action and notes the skip.
    fn log_unconfirmed(&self, invocation: &dyn ToolInvocation, call_id: Option<&str>) {
        let call = invocation.call();
        let explanation = invocation
            .context()
            .policy
            .explain(&call.tool_name, &call.arguments);
        let detail = (explanation.action == PolicyAction::Ask && invocation.kind().is_read_only())
            .then_some("read-only tool; confirmation skipped");
        self.audit_logger.log(AuditEvent::policy_decision(
            &call.tool_name,
            call_id,
            explanation.action,
            detail,
        ));
    }

    fn finish(
        &self,
        lifecycle: InvocationLifecycle,
        call_id: Option<String>,
        mut result: ToolResult,
    ) -> InvocationReport {
        let duration_ms = lifecycle.elapsed_ms();
        result.metadata.duration_ms.get_or_insert(duration_ms);

        match result.error() {
            None => debug!(
                tool = %lifecycle.tool_name(),
                duration_ms,
                "Tool call succeeded"
            ),
            Some(e) => debug!(
                tool = %lifecycle.tool_name(),
                state = %lifecycle.state(),
                error = %e,
                "Tool call did not succeed"
            ),
        }
        self.audit_logger.log(AuditEvent::tool_completed(
            &result,
            call_id.as_deref(),
            lifecycle.state(),
            duration_ms,
        ));

        InvocationReport {
            tool_name: lifecycle.tool_name().to_string(),
            call_id,
            state: lifecycle.state(),
            history: lifecycle.history().to_vec(),
            duration_ms,
            result,
        }
    }
}

impl std::fmt::Debug for InvocationRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvocationRuntime")
            .field("registry", &self.registry)
            .finish()
    }
}
