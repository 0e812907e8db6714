//! Shared utilities for use cases.

use std::any::Any;
use tokio_util::sync::CancellationToken;
use warden_domain::ToolError;

/// Check if cancellation has been requested.
///
/// Returns a `CancelledError` naming the lifecycle `stage` that was cut short.
pub(crate) fn check_cancelled(token: &CancellationToken, stage: &str) -> Result<(), ToolError> {
    if token.is_cancelled() {
        return Err(ToolError::cancelled(format!("Cancelled {}", stage)));
    }
    Ok(())
}

/// Best-effort text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
