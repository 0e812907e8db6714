//! Tool domain module
//!
//! This module defines what a capability looks like to the rest of the
//! system, independent of how it is implemented.
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │ ToolSchema   │───▶│ ToolCall     │───▶│ ToolResult   │
//! │ (model-facing│    │ (bound args) │    │ llm_content  │
//! │  contract)   │    │              │    │ return_display│
//! └──────────────┘    └──────────────┘    │ error?       │
//!                                         └──────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`ToolSchema`] - name, description and parameter specification
//! - [`ToolKind`] - what the tool does to the world; read-only kinds skip confirmation
//! - [`ToolCall`] - the arguments the model supplied
//! - [`ToolResult`] - success or failure, with [`ToolError`] carrying a [`ToolErrorKind`]
//! - [`ToolValidator`] - pure argument validation against a schema
//!
//! The executable side (`DeclarativeTool`, `ToolInvocation`) lives in the
//! application layer, since it is async and needs the confirmation bus.

pub mod entities;
pub mod traits;
pub mod value_objects;

pub use entities::{ToolCall, ToolKind, ToolParameter, ToolSchema};
pub use traits::{DefaultToolValidator, ToolValidator};
pub use value_objects::{ToolError, ToolErrorKind, ToolResult, ToolResultMetadata};
