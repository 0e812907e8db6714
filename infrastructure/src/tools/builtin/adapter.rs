//! Adapts a [`BuiltinTool`] to the application's two-phase tool contract.

use super::BuiltinTool;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use warden_application::{DeclarativeTool, OutputSink, ToolContext, ToolInvocation};
use warden_domain::{
    DefaultToolValidator, ToolCall, ToolError, ToolKind, ToolResult, ToolSchema, ToolValidator,
};

/// Registers a built-in tool under its schema name.
pub struct Builtin<T> {
    tool: Arc<T>,
}

impl<T: BuiltinTool> Builtin<T> {
    pub fn new(tool: T) -> Self {
        Self {
            tool: Arc::new(tool),
        }
    }
}

impl<T: BuiltinTool> DeclarativeTool for Builtin<T> {
    fn schema(&self) -> &ToolSchema {
        self.tool.schema()
    }

    fn kind(&self) -> ToolKind {
        self.tool.kind()
    }

    fn create_invocation(&self, call: ToolCall, context: ToolContext) -> Box<dyn ToolInvocation> {
        Box::new(BuiltinInvocation {
            tool: Arc::clone(&self.tool),
            call,
            context,
        })
    }
}

struct BuiltinInvocation<T> {
    tool: Arc<T>,
    call: ToolCall,
    context: ToolContext,
}

#[async_trait]
impl<T: BuiltinTool> ToolInvocation for BuiltinInvocation<T> {
    fn call(&self) -> &ToolCall {
        &self.call
    }

    fn kind(&self) -> ToolKind {
        self.tool.kind()
    }

    fn context(&self) -> &ToolContext {
        &self.context
    }

    fn locations(&self) -> Vec<String> {
        self.tool.locations(&self.call)
    }

    fn description(&self) -> String {
        self.tool.describe(&self.call)
    }

    async fn execute(
        self: Box<Self>,
        cancel: &CancellationToken,
        on_output: Option<&OutputSink>,
    ) -> ToolResult {
        let name = self.tool.schema().name.clone();

        if let Err(msg) = DefaultToolValidator.validate(&self.call, self.tool.schema()) {
            return ToolResult::failure(name, ToolError::invalid_argument(msg));
        }
        if cancel.is_cancelled() {
            return ToolResult::failure(name, ToolError::cancelled("Cancelled before execution"));
        }

        let start = Instant::now();
        let result = match self.tool.run(&self.call, cancel, on_output).await {
            Ok(result) => result,
            Err(e) => {
                debug!(tool = %name, kind = %e.kind, "Built-in tool failed: {}", e.message);
                ToolResult::failure(name, e)
            }
        };
        result.with_duration(start.elapsed().as_millis() as u64)
    }
}
