//! Application layer for warden
//!
//! This crate contains the tool contract, the confirmation bus, the tool
//! registry and the invocation runtime. It depends only on the domain layer.

pub mod config;
pub mod confirmation_bus;
pub mod ports;
pub mod tool_registry;
pub mod use_cases;

// Re-export commonly used types
pub use config::{ConfirmationMode, ExecutionParams};
pub use confirmation_bus::{ConfirmationBus, ConfirmationSubscription};
pub use ports::{
    audit_logger::{AuditEvent, AuditLogger, NoAuditLogger},
    confirmation_responder::{AutoApproveResponder, AutoDeclineResponder, ConfirmationResponder},
    tool::{DeclarativeTool, OutputSink, ToolContext, ToolInvocation},
};
pub use tool_registry::{RegistryError, ToolRegistry};
pub use use_cases::invocation_runtime::{InvocationReport, InvocationRuntime};
