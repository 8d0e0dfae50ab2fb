//! Application layer containing the lifecycle orchestration.
//!
//! `PaymentEngine` is the entry point. It wires the transaction and refund lifecycles and
//! the administrative override capability to one set of collaborators (repositories,
//! gateway, notifier, clock and minter). Every operation re-reads the entity it works on
//! from storage; nothing is cached between calls.

pub mod admin;
pub mod engine;
pub mod refunds;
pub mod transactions;

use crate::domain::events::LifecycleEvent;
use crate::domain::ports::SharedNotificationSink;
use tracing::warn;

/// Best-effort delivery of lifecycle events.
#[derive(Clone)]
pub(crate) struct EventPublisher {
    sink: SharedNotificationSink,
    enabled: bool,
}

impl EventPublisher {
    pub(crate) fn new(sink: SharedNotificationSink, enabled: bool) -> Self {
        Self { sink, enabled }
    }

    /// Delivery failures are logged and dropped; they never reach the caller.
    pub(crate) async fn publish(&self, event: Option<LifecycleEvent>) {
        if !self.enabled {
            return;
        }
        let Some(event) = event else {
            return;
        };
        let kind = event.kind;
        let transaction_id = event.transaction_id;
        if let Err(e) = self.sink.notify(event).await {
            warn!(?kind, %transaction_id, error = %e, "notification delivery failed");
        }
    }
}
