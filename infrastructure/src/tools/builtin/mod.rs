//! Built-in tools
//!
//! Each built-in implements [`BuiltinTool`]: a schema, a kind and an async
//! `run` returning `Result<ToolResult, ToolError>`. The [`Builtin`] adapter
//! turns it into a registrable [`DeclarativeTool`], validating arguments
//! lazily and converting errors into failed results.

mod adapter;

pub use adapter::Builtin;

use super::command::RunCommandTool;
use super::file::{EditFileTool, ReadFileTool, WriteFileTool};
use super::search::{GlobSearchTool, GrepSearchTool};
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use warden_application::{DeclarativeTool, ExecutionParams, OutputSink, ToolRegistry};
use warden_domain::{ToolCall, ToolError, ToolKind, ToolResult, ToolSchema};

/// A tool implemented in-process.
#[async_trait]
pub trait BuiltinTool: Send + Sync + 'static {
    fn schema(&self) -> &ToolSchema;

    fn kind(&self) -> ToolKind;

    /// Locations shown when confirming; defaults to the path parameters.
    fn locations(&self, call: &ToolCall) -> Vec<String> {
        self.schema().affected_locations(call)
    }

    /// Confirmation prompt for `call`.
    fn describe(&self, call: &ToolCall) -> String {
        match self.locations(call).as_slice() {
            [] => format!("Run {}", self.schema().name),
            locations => format!("Run {} on {}", self.schema().name, locations.join(", ")),
        }
    }

    /// Perform the effect. Arguments have already been validated.
    async fn run(
        &self,
        call: &ToolCall,
        cancel: &CancellationToken,
        on_output: Option<&OutputSink>,
    ) -> Result<ToolResult, ToolError>;
}

/// Every built-in tool, configured with `params`.
///
/// `web_fetch` is included only with the `web-tools` feature.
pub fn builtin_tools(params: ExecutionParams) -> Vec<Arc<dyn DeclarativeTool>> {
    let params = Arc::new(params);

    #[allow(unused_mut)]
    let mut tools: Vec<Arc<dyn DeclarativeTool>> = vec![
        Arc::new(Builtin::new(ReadFileTool::new(Arc::clone(&params)))),
        Arc::new(Builtin::new(WriteFileTool::new(Arc::clone(&params)))),
        Arc::new(Builtin::new(EditFileTool::new(Arc::clone(&params)))),
        Arc::new(Builtin::new(RunCommandTool::new(Arc::clone(&params)))),
        Arc::new(Builtin::new(GlobSearchTool::new(Arc::clone(&params)))),
        Arc::new(Builtin::new(GrepSearchTool::new(Arc::clone(&params)))),
    ];

    #[cfg(feature = "web-tools")]
    tools.push(Arc::new(Builtin::new(super::web::WebFetchTool::new(
        Arc::clone(&params),
    ))));

    tools
}

/// Register every built-in tool, replacing same-named entries.
pub fn register_builtin_tools(registry: &mut ToolRegistry, params: ExecutionParams) {
    for tool in builtin_tools(params) {
        registry.register(tool);
    }
}

/// Registry holding only the built-in tools.
pub fn builtin_registry(params: ExecutionParams) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    register_builtin_tools(&mut registry, params);
    registry
}
