//! # WorkerActor: mailbox loop for one shard.
//!
//! Owns one [`Worker`] instance and the receiving end of its shard's mailbox.
//!
//! ## Architecture
//! ```text
//! Router ──► WorkerHandle::send(Envelope) ──► [unbounded mailbox] ──► WorkerActor::run()
//!
//! run():
//!   ├─► publish WorkerStarted, worker.on_start(ctx)
//!   ├─► loop {
//!   │     select! {
//!   │       token.cancelled()  → break
//!   │       mailbox.recv()     → None → break
//!   │                          → Some(env) → dispatch(env)   (panic isolated)
//!   │     }
//!   │   }
//!   └─► publish WorkerStopped
//! ```
//!
//! ## Rules
//! - Messages are handled **sequentially**, in mailbox order.
//! - Cancellation is checked **between** messages only; a handler that never returns
//!   keeps the actor alive until the registry's grace period aborts it.
//! - A panicking handler publishes `WorkerPanicked`; its permit and reply sender are
//!   dropped during unwinding, so capacity is released and the caller sees `NoReply`.
//! - Envelopes still queued when the actor exits are dropped the same way.

use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::events::{Bus, Event, EventKind};
use crate::panic::panic_message;
use crate::shard::Permit;

use super::worker::{ShardContext, Worker};

/// One message in a worker's mailbox.
pub(crate) enum Envelope<W: Worker> {
    Call {
        msg: W::Call,
        permit: Option<Permit>,
        reply: oneshot::Sender<W::Reply>,
    },
    Cast {
        msg: W::Cast,
        permit: Option<Permit>,
    },
}

/// Sending side of a worker's mailbox.
pub(crate) struct WorkerHandle<W: Worker> {
    tx: mpsc::UnboundedSender<Envelope<W>>,
}

impl<W: Worker> WorkerHandle<W> {
    /// Enqueues an envelope; hands it back if the actor has exited.
    #[inline]
    pub(crate) fn send(&self, env: Envelope<W>) -> Result<(), Envelope<W>> {
        self.tx.send(env).map_err(|e| e.0)
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl<W: Worker> Clone for WorkerHandle<W> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

/// Actor driving one [`Worker`] instance.
pub(crate) struct WorkerActor<W: Worker> {
    worker: W,
    ctx: ShardContext<W::Item>,
    rx: mpsc::UnboundedReceiver<Envelope<W>>,
    bus: Bus,
}

impl<W: Worker> WorkerActor<W> {
    /// Creates the actor and the handle used to reach it.
    pub(crate) fn new(worker: W, ctx: ShardContext<W::Item>, bus: Bus) -> (Self, WorkerHandle<W>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let actor = Self {
            worker,
            ctx,
            rx,
            bus,
        };
        (actor, WorkerHandle { tx })
    }

    /// Runs the mailbox loop until cancelled or every handle is dropped.
    pub(crate) async fn run(mut self, token: CancellationToken) {
        let resource: Arc<str> = Arc::from(self.ctx.resource());
        let shard = self.ctx.shard();

        self.bus.publish(
            Event::new(EventKind::WorkerStarted)
                .with_resource(Arc::clone(&resource))
                .with_shard(shard),
        );
        self.worker.on_start(&self.ctx).await;

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                env = self.rx.recv() => match env {
                    Some(env) => self.dispatch(env).await,
                    None => break,
                },
            }
        }

        self.rx.close();
        tracing::debug!(resource = %resource, shard, "worker stopped");
        self.bus.publish(
            Event::new(EventKind::WorkerStopped)
                .with_resource(resource)
                .with_shard(shard),
        );
    }

    /// Hands one envelope to the worker, isolating panics.
    async fn dispatch(&mut self, env: Envelope<W>) {
        let worker = &mut self.worker;
        let fut = async move {
            match env {
                Envelope::Call { msg, permit, reply } => {
                    let out = worker.handle_call(msg, permit).await;
                    // caller may have timed out already
                    let _ = reply.send(out);
                }
                Envelope::Cast { msg, permit } => worker.handle_cast(msg, permit).await,
            }
        };

        if let Err(payload) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
            let info = panic_message(&*payload);
            tracing::error!(
                resource = self.ctx.resource(),
                shard = self.ctx.shard(),
                %info,
                "worker handler panicked"
            );
            self.bus.publish(
                Event::new(EventKind::WorkerPanicked)
                    .with_resource(self.ctx.resource())
                    .with_shard(self.ctx.shard())
                    .with_reason(info),
            );
        }
    }
}
