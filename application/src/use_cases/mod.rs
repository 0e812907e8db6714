//! Use cases (application services)

pub mod invocation_runtime;
pub(crate) mod shared;
