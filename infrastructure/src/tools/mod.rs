//! Built-in tool implementations
//!
//! | Tool | Kind | Module |
//! |------|------|--------|
//! | `read_file` | read | [`file`] |
//! | `write_file` | edit | [`file`] |
//! | `edit_file` | edit | [`file`] |
//! | `run_command` | execute | [`command`] |
//! | `glob_search` | search | [`search`] |
//! | `grep_search` | search | [`search`] |
//! | `web_fetch` | fetch | `web` (feature `web-tools`) |
//!
//! Every tool reports failures as a typed [`ToolError`](warden_domain::ToolError)
//! inside its result; none of them panic on bad input.

pub mod builtin;
pub mod command;
pub mod file;
pub mod search;
#[cfg(feature = "web-tools")]
pub mod web;

pub use builtin::{Builtin, BuiltinTool, builtin_registry, builtin_tools, register_builtin_tools};
