//! Worker doubles shared by the router and registry tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::core::Worker;
use crate::events::{Event, EventKind};
use crate::shard::Permit;

/// Instruction understood by [`Scripted`].
pub(crate) enum Op {
    /// Reply with the value.
    Echo(u64),
    /// Keep the permit (and the mailbox) until the sender fires or is dropped.
    Hold(oneshot::Receiver<()>),
    /// Sleep on the tokio clock, then reply 0.
    Sleep(Duration),
    /// Signal entry, then never return.
    Hang(oneshot::Sender<()>),
    Panic,
}

/// Worker that does what each [`Op`] says and counts handled casts.
pub(crate) struct Scripted {
    pub(crate) casts: Arc<AtomicU64>,
}

impl Scripted {
    pub(crate) fn new(casts: &Arc<AtomicU64>) -> Self {
        Self {
            casts: Arc::clone(casts),
        }
    }

    async fn run(op: Op) -> u64 {
        match op {
            Op::Echo(v) => v,
            Op::Hold(rx) => {
                let _ = rx.await;
                0
            }
            Op::Sleep(d) => {
                tokio::time::sleep(d).await;
                0
            }
            Op::Hang(entered) => {
                let _ = entered.send(());
                std::future::pending::<u64>().await
            }
            Op::Panic => panic!("scripted panic"),
        }
    }
}

#[async_trait]
impl Worker for Scripted {
    type Call = Op;
    type Reply = u64;
    type Cast = Op;
    type Item = u64;

    async fn handle_call(&mut self, op: Op, _permit: Option<Permit>) -> u64 {
        Self::run(op).await
    }

    async fn handle_cast(&mut self, op: Op, _permit: Option<Permit>) {
        Self::run(op).await;
        self.casts.fetch_add(1, AtomicOrdering::Relaxed);
    }
}

/// Worker of a different type, for lookup mismatches.
pub(crate) struct Other;

#[async_trait]
impl Worker for Other {
    type Call = ();
    type Reply = ();
    type Cast = ();
    type Item = ();

    async fn handle_call(&mut self, _msg: (), _permit: Option<Permit>) {}
    async fn handle_cast(&mut self, _msg: (), _permit: Option<Permit>) {}
}

/// Drains whatever the receiver already holds.
pub(crate) fn drain(rx: &mut tokio::sync::broadcast::Receiver<Event>) -> Vec<Event> {
    let mut out = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        out.push(ev);
    }
    out
}

/// True if any drained event has the given kind.
pub(crate) fn saw(events: &[Event], kind: EventKind) -> bool {
    events.iter().any(|e| e.kind == kind)
}

