//! Confirmation bus: addressed request/response between invocations and
//! whoever answers confirmation prompts.
//!
//! Many invocations may ask at once; exactly one subscriber answers. Each
//! request gets a unique [`ConfirmationRequestId`] and its own `oneshot`
//! channel, so interleaved answers never cross.
//!
//! ```text
//! invocation A ──request(#1)──┐                 ┌──respond(#2, Declined)
//! invocation B ──request(#2)──┼──▶ subscriber ──┤
//! invocation C ──request(#3)──┘                 └──respond(#1, Approved)
//! ```
//!
//! Safe defaults:
//!
//! - no subscriber attached: the request is declined immediately
//! - the cancellation token fires while waiting: declined
//! - the subscriber goes away with requests outstanding: all are declined

use crate::ports::confirmation_responder::ConfirmationResponder;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};
use warden_domain::{ConfirmationDecision, ConfirmationRequest, ConfirmationRequestId};

type PendingMap = HashMap<ConfirmationRequestId, oneshot::Sender<ConfirmationDecision>>;

struct Subscriber {
    generation: u64,
    sender: mpsc::UnboundedSender<ConfirmationRequest>,
}

struct BusInner {
    next_id: AtomicU64,
    next_generation: AtomicU64,
    pending: Mutex<PendingMap>,
    subscriber: Mutex<Option<Subscriber>>,
}

impl BusInner {
    fn pending(&self) -> MutexGuard<'_, PendingMap> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn subscriber(&self) -> MutexGuard<'_, Option<Subscriber>> {
        self.subscriber.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn respond(&self, id: ConfirmationRequestId, decision: ConfirmationDecision) -> bool {
        let Some(tx) = self.pending().remove(&id) else {
            trace!(request = %id, "Confirmation bus: no pending request");
            return false;
        };
        // The requester may have been cancelled in the meantime
        tx.send(decision).is_ok()
    }

    fn is_current(&self, generation: u64) -> bool {
        self.subscriber()
            .as_ref()
            .is_some_and(|s| s.generation == generation)
    }

    /// Drop every outstanding sender; each waiter resolves to `Declined`.
    fn decline_all(&self) {
        let mut pending = self.pending();
        if !pending.is_empty() {
            debug!(count = pending.len(), "Confirmation bus: declining outstanding requests");
        }
        pending.clear();
    }
}

/// Shared handle to the bus. Clones address the same bus.
#[derive(Clone)]
pub struct ConfirmationBus {
    inner: Arc<BusInner>,
}

impl ConfirmationBus {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BusInner {
                next_id: AtomicU64::new(1),
                next_generation: AtomicU64::new(1),
                pending: Mutex::new(HashMap::new()),
                subscriber: Mutex::new(None),
            }),
        }
    }

    /// Become the single subscriber.
    ///
    /// Replacing an existing subscriber declines its outstanding requests.
    /// Requests already queued for the old subscriber are never delivered.
    pub fn subscribe(&self) -> ConfirmationSubscription {
        let (sender, receiver) = mpsc::unbounded_channel();
        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);

        // Publishing holds this lock too: nothing lands in `pending` between
        // the clear and the swap.
        let mut subscriber = self.inner.subscriber();
        if subscriber.is_some() {
            debug!("Confirmation bus: subscriber replaced");
            self.inner.decline_all();
        }
        *subscriber = Some(Subscriber { generation, sender });
        drop(subscriber);

        ConfirmationSubscription {
            bus: Arc::downgrade(&self.inner),
            receiver,
            generation,
        }
    }

    /// Subscribe with a responder that answers every request.
    ///
    /// Requests are answered one at a time, in arrival order. The task ends
    /// when the bus is dropped or another subscriber takes over.
    pub fn attach_responder(&self, responder: Arc<dyn ConfirmationResponder>) -> JoinHandle<()> {
        let mut subscription = self.subscribe();
        tokio::spawn(async move {
            while let Some(request) = subscription.next().await {
                let decision = responder.confirm(&request).await;
                subscription.respond(request.id, decision);
            }
        })
    }

    pub fn has_subscriber(&self) -> bool {
        self.inner
            .subscriber()
            .as_ref()
            .is_some_and(|s| !s.sender.is_closed())
    }

    /// Number of requests awaiting an answer.
    pub fn pending_count(&self) -> usize {
        self.inner.pending().len()
    }

    /// Answer a request by id. Returns `false` if it is no longer pending.
    pub fn respond(&self, id: ConfirmationRequestId, decision: ConfirmationDecision) -> bool {
        self.inner.respond(id, decision)
    }

    /// Assign a fresh id to `request`, so it can be referenced (e.g. in an
    /// audit record) before [`send`](Self::send) publishes it.
    pub fn stamp(&self, request: ConfirmationRequest) -> ConfirmationRequest {
        let id = ConfirmationRequestId::new(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        request.with_id(id)
    }

    /// Publish a request and wait for its answer.
    ///
    /// Never hangs: resolves to `Declined` when no subscriber is attached,
    /// when `cancel` fires, or when the subscriber disappears.
    pub async fn request(
        &self,
        request: ConfirmationRequest,
        cancel: &CancellationToken,
    ) -> ConfirmationDecision {
        self.send(self.stamp(request), cancel).await
    }

    /// Like [`request`](Self::request) for a request already stamped by
    /// this bus. Unstamped requests get an id here.
    pub async fn send(
        &self,
        request: ConfirmationRequest,
        cancel: &CancellationToken,
    ) -> ConfirmationDecision {
        let request = if request.id == ConfirmationRequestId::default() {
            self.stamp(request)
        } else {
            request
        };
        let id = request.id;
        let (tx, rx) = oneshot::channel();

        if !self.publish(request, tx) {
            debug!(request = %id, "Confirmation bus: not published, declining");
            return ConfirmationDecision::Declined;
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                self.inner.pending().remove(&id);
                debug!(request = %id, "Confirmation bus: cancelled while waiting");
                ConfirmationDecision::Declined
            }
            decision = rx => decision.unwrap_or(ConfirmationDecision::Declined),
        }
    }

    /// Register `tx` and hand the request to the current subscriber, under
    /// the subscriber lock.
    fn publish(
        &self,
        request: ConfirmationRequest,
        tx: oneshot::Sender<ConfirmationDecision>,
    ) -> bool {
        let mut subscriber = self.inner.subscriber();
        let Some(active) = subscriber.as_ref() else {
            return false;
        };
        let id = request.id;
        let mut pending = self.inner.pending();
        if pending.contains_key(&id) {
            warn!(request = %id, "Confirmation bus: request id already pending");
            return false;
        }
        pending.insert(id, tx);
        drop(pending);
        if active.sender.send(request).is_ok() {
            return true;
        }
        // Receiver is gone without having unsubscribed
        self.inner.pending().remove(&id);
        *subscriber = None;
        false
    }
}

impl Default for ConfirmationBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConfirmationBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfirmationBus")
            .field("has_subscriber", &self.has_subscriber())
            .field("pending", &self.pending_count())
            .finish()
    }
}

/// The receiving end held by the active subscriber.
///
/// Dropping it detaches the subscriber and declines its outstanding
/// requests.
pub struct ConfirmationSubscription {
    bus: Weak<BusInner>,
    receiver: mpsc::UnboundedReceiver<ConfirmationRequest>,
    generation: u64,
}

impl ConfirmationSubscription {
    /// Next request to answer, or `None` once the bus is gone or this
    /// subscription was replaced.
    pub async fn next(&mut self) -> Option<ConfirmationRequest> {
        loop {
            let request = self.receiver.recv().await?;
            let bus = self.bus.upgrade()?;
            if !bus.is_current(self.generation) {
                debug!(
                    request = %request.id,
                    "Confirmation bus: subscription replaced, dropping queued request"
                );
                return None;
            }
            if bus.pending().contains_key(&request.id) {
                return Some(request);
            }
            // Cancelled or declined before we got to it
            trace!(request = %request.id, "Confirmation bus: skipping stale request");
        }
    }

    pub fn respond(&self, id: ConfirmationRequestId, decision: ConfirmationDecision) -> bool {
        self.bus
            .upgrade()
            .is_some_and(|bus| bus.respond(id, decision))
    }
}

impl Drop for ConfirmationSubscription {
    fn drop(&mut self) {
        let Some(bus) = self.bus.upgrade() else {
            return;
        };
        let mut subscriber = bus.subscriber();
        if subscriber
            .as_ref()
            .is_some_and(|s| s.generation == self.generation)
        {
            *subscriber = None;
            bus.decline_all();
            debug!("Confirmation bus: subscriber detached");
        }
    }
}
