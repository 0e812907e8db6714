//! Infrastructure layer for warden
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: the built-in tools, configuration file
//! loading and the JSONL audit logger.

pub mod config;
pub mod logging;
pub mod tools;

// Re-export commonly used types
pub use config::{
    ConfigError, ConfigLoader, ConfigValidationError, FileConfig, FileConfirmationConfig,
    FileLoggingConfig, FilePolicyConfig, FileToolsConfig,
};
pub use logging::JsonlAuditLogger;
pub use tools::{Builtin, BuiltinTool, builtin_registry, builtin_tools, register_builtin_tools};
