//! Application-level configuration.
//!
//! - [`ExecutionParams`] - working directory, timeouts and output limits for tools
//! - [`ConfirmationMode`] - which responder answers the confirmation bus

pub mod confirmation_mode;
pub mod execution_params;

pub use confirmation_mode::ConfirmationMode;
pub use execution_params::ExecutionParams;
