//! Tool contract port
//!
//! Every capability (file edit, shell, fetch, ...) implements the same two
//! traits, so the registry and runtime never special-case a tool:
//!
//! ```text
//! DeclarativeTool ──create_invocation(call, ctx)──▶ Box<dyn ToolInvocation>
//!                                                     │
//!                     should_confirm_execute(cancel) ─┤  policy + kind
//!                                                     │
//!                     execute(cancel, on_output) ─────┘  consumes the box
//! ```
//!
//! `create_invocation` only binds; argument validation happens lazily in
//! `execute` and is reported as a [`ToolResult`] error. `execute` takes the
//! invocation by value, so an instance can run at most once.

use crate::confirmation_bus::ConfirmationBus;
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use warden_domain::{
    ConfirmationRequest, PolicyDecision, PolicyDenied, PolicyEngine, ToolCall, ToolKind,
    ToolResult, ToolSchema,
};

/// Receives partial output while a tool runs.
///
/// Streamed text is for the user only; the model sees the final
/// `llm_content`.
pub type OutputSink = dyn Fn(&str) + Send + Sync;

/// Per-call dependencies, supplied by the caller and never owned by a tool.
///
/// Cloning is cheap: both handles are reference-counted.
#[derive(Debug, Clone)]
pub struct ToolContext {
    pub confirmation_bus: ConfirmationBus,
    pub policy: Arc<PolicyEngine>,
}

impl ToolContext {
    pub fn new(confirmation_bus: ConfirmationBus, policy: Arc<PolicyEngine>) -> Self {
        Self {
            confirmation_bus,
            policy,
        }
    }

    /// Swap in a different policy for subsequent invocations.
    pub fn with_policy(mut self, policy: Arc<PolicyEngine>) -> Self {
        self.policy = policy;
        self
    }
}

/// A registered capability.
///
/// Implementations are immutable once registered; `create_invocation` must
/// not perform I/O.
pub trait DeclarativeTool: Send + Sync {
    /// Model-facing schema
    fn schema(&self) -> &ToolSchema;

    fn kind(&self) -> ToolKind;

    /// Bind a call's arguments and context into a single-use invocation.
    fn create_invocation(&self, call: ToolCall, context: ToolContext) -> Box<dyn ToolInvocation>;

    /// Unique name, taken from the schema
    fn name(&self) -> &str {
        &self.schema().name
    }

    /// Name shown to the user
    fn display_name(&self) -> &str {
        self.name()
    }
}

/// One bound call to a tool.
#[async_trait]
pub trait ToolInvocation: Send + Sync {
    fn call(&self) -> &ToolCall;

    fn kind(&self) -> ToolKind;

    fn context(&self) -> &ToolContext;

    /// Paths or URLs this call would affect.
    fn locations(&self) -> Vec<String> {
        Vec::new()
    }

    /// One-line description of the proposed call, used as the prompt.
    fn description(&self) -> String {
        let call = self.call();
        match self.locations().as_slice() {
            [] => format!("Run {}", call.tool_name),
            locations => format!("Run {} on {}", call.tool_name, locations.join(", ")),
        }
    }

    /// Decide whether a human gate is needed before `execute`.
    ///
    /// - `Err(PolicyDenied)`: the call must not happen, even for read-only kinds
    /// - `Ok(None)`: proceed immediately
    /// - `Ok(Some(request))`: publish `request` on the bus and wait
    async fn should_confirm_execute(
        &self,
        _cancel: &CancellationToken,
    ) -> Result<Option<ConfirmationRequest>, PolicyDenied> {
        let call = self.call();
        let decision = self
            .context()
            .policy
            .evaluate(&call.tool_name, &call.arguments)?;

        if self.kind().is_read_only() {
            return Ok(None);
        }

        match decision {
            PolicyDecision::Allow => Ok(None),
            PolicyDecision::Ask { risk } => Ok(Some(
                ConfirmationRequest::new(&call.tool_name, risk)
                    .with_locations(self.locations())
                    .with_prompt(self.description()),
            )),
        }
    }

    /// Perform the effect.
    ///
    /// Must observe `cancel` and return a `CancelledError` result rather
    /// than panicking when aborted.
    async fn execute(
        self: Box<Self>,
        cancel: &CancellationToken,
        on_output: Option<&OutputSink>,
    ) -> ToolResult;
}
