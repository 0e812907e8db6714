//! Command-line interface definitions

pub mod args;
pub mod commands;
