//! # Event bus for broadcasting runtime events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] used by the registry and
//! the worker actors to publish lifecycle events without blocking.
//!
//! ## Architecture
//! ```text
//! Publishers (many):                   Subscriber (one):
//!   Worker 0 ──┐
//!   Worker 1 ──┼──────► Bus ───────► registry listener ────► SubscriberSet
//!   Router   ──┤  (broadcast chan)
//!   Registry ──┘
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never waits.
//! - **Bounded capacity**: slow receivers get `RecvError::Lagged(n)` and skip `n` items.
//! - **No persistence**: events are lost if nobody is subscribed at send time.
//! - **Off the hot path**: admission and Overload never publish.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for runtime events.
///
/// Cheap to clone (internally holds an `Arc`-backed sender).
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity (clamped to at least 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all active receivers.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a new receiver that observes subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[tokio::test]
    async fn subscribers_see_events_published_after_subscribe() {
        let bus = Bus::new(0);
        bus.publish(Event::new(EventKind::WorkerStarted));

        let mut rx = bus.subscribe();
        bus.publish(Event::new(EventKind::WorkerStopped).with_shard(1));

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::WorkerStopped);
        assert_eq!(ev.shard, Some(1));
    }
}
