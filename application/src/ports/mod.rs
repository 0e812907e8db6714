//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure and presentation adapters
//! implement.

pub mod audit_logger;
pub mod confirmation_responder;
pub mod tool;
