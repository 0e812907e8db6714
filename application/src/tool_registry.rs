//! Tool Registry
//!
//! The [`ToolRegistry`] is the catalog the agent loop consults twice per
//! turn: once to get the function schemas it sends to the model, and once
//! to resolve the tool the model asked for.
//!
//! # Usage
//!
//! ```ignore
//! let mut registry = ToolRegistry::new();
//! registry.register(Arc::new(ReadFileTool::new(params.clone())));
//! registry.register(Arc::new(WriteFileTool::new(params)));
//!
//! // Sorted by name, stable across calls
//! let schemas = registry.function_schemas();
//!
//! let tool = registry.resolve("read_file")?;
//! let invocation = tool.create_invocation(call, context);
//! ```
//!
//! # Determinism
//!
//! Schemas are always returned sorted by name. The model-facing function
//! list must be identical across calls for prompt caching and reproducible
//! tests.
//!
//! Registration replaces by name and never merges; mutation happens on a
//! single control path (startup), while executions only read.

use crate::ports::tool::DeclarativeTool;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;
use warden_domain::{ToolKind, ToolSchema};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
}

/// Name-keyed catalog of [`DeclarativeTool`]s.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn DeclarativeTool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a tool, replacing any tool with the same name.
    ///
    /// Returns the replaced tool, if any.
    pub fn register(&mut self, tool: Arc<dyn DeclarativeTool>) -> Option<Arc<dyn DeclarativeTool>> {
        let name = tool.name().to_string();
        let replaced = self.tools.insert(name.clone(), tool);
        if replaced.is_some() {
            debug!(tool = %name, "Replaced registered tool");
        } else {
            debug!(tool = %name, "Registered tool");
        }
        replaced
    }

    /// Builder form of [`register`](Self::register)
    pub fn with_tool(mut self, tool: Arc<dyn DeclarativeTool>) -> Self {
        self.register(tool);
        self
    }

    pub fn unregister(&mut self, name: &str) -> Option<Arc<dyn DeclarativeTool>> {
        let removed = self.tools.remove(name);
        if removed.is_some() {
            debug!(tool = %name, "Unregistered tool");
        }
        removed
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn DeclarativeTool>> {
        self.tools.get(name).cloned()
    }

    /// Like [`get`](Self::get), but an unknown name is an error.
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn DeclarativeTool>, RegistryError> {
        self.get(name)
            .ok_or_else(|| RegistryError::UnknownTool(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Registered tools, sorted by name
    pub fn list(&self) -> Vec<Arc<dyn DeclarativeTool>> {
        let mut tools: Vec<_> = self.tools.values().cloned().collect();
        tools.sort_by(|a, b| a.name().cmp(b.name()));
        tools
    }

    /// Schemas of every registered tool, sorted by name.
    pub fn function_schemas(&self) -> Vec<ToolSchema> {
        self.list().iter().map(|t| t.schema().clone()).collect()
    }

    /// Schemas restricted to the given kinds, sorted by name.
    pub fn function_schemas_for(&self, kinds: &[ToolKind]) -> Vec<ToolSchema> {
        self.list()
            .iter()
            .filter(|t| kinds.contains(&t.kind()))
            .map(|t| t.schema().clone())
            .collect()
    }

    /// JSON function-calling definitions for the model, sorted by name.
    pub fn function_schemas_json(&self) -> Vec<serde_json::Value> {
        self.function_schemas()
            .iter()
            .map(ToolSchema::to_function_schema)
            .collect()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}
