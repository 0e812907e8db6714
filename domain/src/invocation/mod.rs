//! Invocation subdomain: the lifecycle of one bound tool call.

pub mod state;

pub use state::{InvocationLifecycle, InvocationState};
