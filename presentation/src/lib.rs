//! Presentation layer for warden
//!
//! This crate contains CLI definitions, the terminal confirmation prompt
//! and output formatters.

pub mod cli;
pub mod confirmation;
pub mod output;

// Re-export commonly used types
pub use cli::commands::{CallArgs, Cli, Command, OutputFormat, PolicyCommand, RunArgs};
pub use confirmation::ConsoleConfirmationResponder;
pub use output::ConsoleFormatter;
