//! # LogWriter: events as `tracing` records
//!
//! A subscriber that turns every [`Event`] into one `tracing` record. Install any
//! `tracing` subscriber (e.g. `tracing_subscriber::fmt`) to see them.
//!
//! ## Example output
//! ```text
//! INFO  resource-created resource="db" width=4 total_limit=100 shard_limit=25
//! DEBUG worker-started resource="db" shard=0
//! WARN  call-timed-out resource="db" shard=2 timeout_ms=5000
//! ERROR worker-panicked resource="db" shard=1 info="index out of bounds"
//! WARN  grace-exceeded stuck="db#3"
//! ```

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let resource = e.resource.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("");
        match e.kind {
            EventKind::ResourceCreated => info!(resource, %reason, "resource-created"),
            EventKind::ResourceRemoved => info!(resource, "resource-removed"),
            EventKind::WorkerStarted => debug!(resource, shard = ?e.shard, "worker-started"),
            EventKind::WorkerStopped => debug!(resource, shard = ?e.shard, "worker-stopped"),
            EventKind::WorkerPanicked => {
                error!(resource, shard = ?e.shard, info = reason, "worker-panicked")
            }
            EventKind::CallTimedOut => {
                warn!(resource, shard = ?e.shard, timeout_ms = ?e.timeout_ms, "call-timed-out")
            }
            EventKind::ShutdownRequested => info!(resource, "shutdown-requested"),
            EventKind::AllStoppedWithin => info!("all-stopped-within-grace"),
            EventKind::GraceExceeded => warn!(stuck = reason, "grace-exceeded"),
            EventKind::SubscriberOverflow => {
                warn!(subscriber = resource, reason, "subscriber-overflow")
            }
            EventKind::SubscriberPanicked => {
                error!(subscriber = resource, info = reason, "subscriber-panicked")
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}

#[cfg(all(test, feature = "logging"))]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn writes_every_event_kind() {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let events = [
            Event::new(EventKind::ResourceCreated)
                .with_resource("db")
                .with_reason("width=2 total_limit=10 shard_limit=5"),
            Event::new(EventKind::ResourceRemoved).with_resource("db"),
            Event::new(EventKind::WorkerStarted).with_resource("db").with_shard(0),
            Event::new(EventKind::WorkerStopped).with_resource("db").with_shard(0),
            Event::new(EventKind::WorkerPanicked)
                .with_resource("db")
                .with_shard(1)
                .with_reason("boom"),
            Event::new(EventKind::CallTimedOut)
                .with_resource("db")
                .with_shard(1)
                .with_timeout(Duration::from_secs(5)),
            Event::new(EventKind::ShutdownRequested),
            Event::new(EventKind::AllStoppedWithin),
            Event::new(EventKind::GraceExceeded).with_reason("db#1"),
            Event::subscriber_overflow("metrics", "full"),
            Event::subscriber_panicked("metrics", "boom".to_string()),
        ];

        let writer = LogWriter::new();
        assert_eq!(writer.name(), "LogWriter");
        for ev in &events {
            writer.on_event(ev).await;
        }
    }
}
