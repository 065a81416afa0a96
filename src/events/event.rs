//! # Runtime events emitted by the registry and worker actors.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Resource events**: registration and removal of resources
//! - **Worker events**: worker lifecycle, panics, call timeouts
//! - **Shutdown events**: teardown within or past the grace period
//!
//! Admission rejections are **not** events: they are counted in
//! [`Stats`](crate::Stats) so the Overload path never touches the bus.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use shardvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::CallTimedOut)
//!     .with_resource("db")
//!     .with_shard(3)
//!     .with_timeout(Duration::from_secs(5));
//!
//! assert_eq!(ev.kind, EventKind::CallTimedOut);
//! assert_eq!(ev.resource.as_deref(), Some("db"));
//! assert_eq!(ev.shard, Some(3));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `resource`: subscriber name
    /// - `reason`: panic info
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `resource`: subscriber name
    /// - `reason`: "full" or "closed"
    SubscriberOverflow,

    // === Resource events ===
    /// Resource registered and its workers spawned.
    ///
    /// Sets:
    /// - `resource`: resource name
    /// - `reason`: `width=<n> total_limit=<n> shard_limit=<n>`
    ResourceCreated,

    /// Resource removed after its workers stopped.
    ///
    /// Sets:
    /// - `resource`: resource name
    ResourceRemoved,

    // === Worker events ===
    /// Worker actor entered its receive loop.
    ///
    /// Sets:
    /// - `resource`, `shard`
    WorkerStarted,

    /// Worker actor left its receive loop (cancelled or mailbox closed).
    ///
    /// Sets:
    /// - `resource`, `shard`
    WorkerStopped,

    /// A worker handler panicked; the worker keeps serving its mailbox.
    ///
    /// Sets:
    /// - `resource`, `shard`
    /// - `reason`: panic info
    WorkerPanicked,

    /// A synchronous call was not answered within its timeout.
    ///
    /// Sets:
    /// - `resource`, `shard`
    /// - `timeout_ms`: the bound that was exceeded
    CallTimedOut,

    // === Shutdown events ===
    /// Teardown requested (resource removal or registry shutdown).
    ///
    /// Sets:
    /// - `resource`: resource name, absent for a registry-wide shutdown
    ShutdownRequested,

    /// All workers stopped within the configured grace period.
    AllStoppedWithin,

    /// Grace period exceeded; some workers did not stop in time.
    ///
    /// Sets:
    /// - `reason`: stuck workers
    GraceExceeded,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Resource (or subscriber) name, if applicable.
    pub resource: Option<Arc<str>>,
    /// Shard index, if applicable.
    pub shard: Option<usize>,
    /// Call timeout in milliseconds (compact).
    pub timeout_ms: Option<u32>,
    /// Human-readable reason (panic info, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            resource: None,
            shard: None,
            timeout_ms: None,
            reason: None,
        }
    }

    /// Attaches a resource name.
    #[inline]
    pub fn with_resource(mut self, resource: impl Into<Arc<str>>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    /// Attaches a shard index.
    #[inline]
    pub fn with_shard(mut self, shard: usize) -> Self {
        self.shard = Some(shard);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a timeout duration (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.timeout_ms = Some(ms);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_resource(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_resource(subscriber)
            .with_reason(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_numbers_increase() {
        let a = Event::new(EventKind::WorkerStarted);
        let b = Event::new(EventKind::WorkerStopped);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn timeout_is_clamped_to_u32_millis() {
        let ev = Event::new(EventKind::CallTimedOut).with_timeout(Duration::from_secs(u64::MAX));
        assert_eq!(ev.timeout_ms, Some(u32::MAX));
    }
}
