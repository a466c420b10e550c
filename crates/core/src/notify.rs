//! Invalidation event producer.
//!
//! Successful mutations publish a per-organization [`Invalidation`] so that
//! transports (websocket push, polling fallback) can tell interested clients
//! to re-run their projection. The engine only produces; it never subscribes,
//! and a mutation succeeds even when nobody is listening.

use rota_types::OrganizationId;
use tokio::sync::broadcast;

/// "Schedules or executions for this organization may have changed."
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invalidation {
    pub organization: OrganizationId,
}

/// Sending half of the invalidation channel, cloneable across services.
#[derive(Clone)]
pub struct InvalidationSender {
    tx: broadcast::Sender<Invalidation>,
}

impl InvalidationSender {
    /// Creates a channel with the given buffer capacity and returns the
    /// sending half plus one initial receiver.
    pub fn channel(capacity: usize) -> (Self, broadcast::Receiver<Invalidation>) {
        let (tx, rx) = broadcast::channel(capacity);
        (Self { tx }, rx)
    }

    /// Subscribes a new receiver. Lagging receivers miss events; they must
    /// treat a lag as "re-project everything".
    pub fn subscribe(&self) -> broadcast::Receiver<Invalidation> {
        self.tx.subscribe()
    }

    /// Publishes an invalidation. A missing audience is not an error.
    pub fn publish(&self, organization: OrganizationId) {
        let event = Invalidation { organization };
        if self.tx.send(event).is_err() {
            tracing::debug!(%organization, "invalidation dropped, no subscribers");
        }
    }
}
