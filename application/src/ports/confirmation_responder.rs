//! Confirmation responder port.
//!
//! A responder answers requests published on the
//! [`ConfirmationBus`](crate::confirmation_bus::ConfirmationBus). Swapping the
//! responder changes how confirmations are answered without touching the
//! policy engine, the registry, or any tool.
//!
//! # Built-in Implementations
//!
//! - [`AutoApproveResponder`] - approves everything (trusted, scripted runs)
//! - [`AutoDeclineResponder`] - declines everything (CI, dry runs)
//!
//! For interactive use, see `ConsoleConfirmationResponder` in the
//! presentation layer.

use async_trait::async_trait;
use warden_domain::{ConfirmationDecision, ConfirmationRequest};

/// Port for answering confirmation requests.
#[async_trait]
pub trait ConfirmationResponder: Send + Sync {
    async fn confirm(&self, request: &ConfirmationRequest) -> ConfirmationDecision;
}

/// Approves every request.
///
/// # Warning
///
/// Every `ask` rule effectively becomes `allow`. `deny` rules still apply,
/// since denial never reaches the bus.
pub struct AutoApproveResponder;

#[async_trait]
impl ConfirmationResponder for AutoApproveResponder {
    async fn confirm(&self, _request: &ConfirmationRequest) -> ConfirmationDecision {
        ConfirmationDecision::Approved
    }
}

/// Declines every request. The safest non-interactive mode.
pub struct AutoDeclineResponder;

#[async_trait]
impl ConfirmationResponder for AutoDeclineResponder {
    async fn confirm(&self, _request: &ConfirmationRequest) -> ConfirmationDecision {
        ConfirmationDecision::Declined
    }
}
