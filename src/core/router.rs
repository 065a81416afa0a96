//! # Worker router: client-facing operations on a [`Resource`].
//!
//! | Operation          | Admission | Blocks                 | Returns                          |
//! |--------------------|-----------|------------------------|----------------------------------|
//! | `call`             | yes       | until reply / timeout  | `Reply::{Response, Overload}`    |
//! | `cast`             | yes       | no                     | `Dispatch::{Sent, Overload}`     |
//! | `unbounded_call`   | no        | until reply / timeout  | response                         |
//! | `unbounded_cast`   | no        | no                     | `()`                             |
//! | `save`             | no        | no                     | `()`                             |
//!
//! Every operation takes the caller's [`Affinity`] from the current thread; the
//! `*_at` variants accept an explicit hint. Bounded operations run the admission
//! controller and attach the resulting [`Permit`](crate::Permit) to the message;
//! unbounded operations and `save` go straight to the preferred shard.
//!
//! Overload is a value, not an error. [`RouteError`] is reserved for timeouts and
//! dead workers. Nothing here retries.

use std::time::Duration;

use tokio::sync::oneshot;

use crate::admission::Admission;
use crate::affinity::Affinity;
use crate::error::RouteError;
use crate::events::{Event, EventKind};
use crate::shard::Permit;

use super::actor::Envelope;
use super::resource::Resource;
use super::worker::Worker;

/// Outcome of a bounded synchronous call.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Reply<R> {
    /// The worker's response.
    Response(R),
    /// Every shard was saturated; nothing was sent.
    Overload,
}

impl<R> Reply<R> {
    pub fn is_overload(&self) -> bool {
        matches!(self, Reply::Overload)
    }

    /// The response, if the call was admitted.
    pub fn into_response(self) -> Option<R> {
        match self {
            Reply::Response(r) => Some(r),
            Reply::Overload => None,
        }
    }
}

/// Outcome of a bounded cast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Dispatch {
    /// Enqueued in the worker's mailbox.
    Sent,
    /// Every shard was saturated; nothing was sent.
    Overload,
}

impl Dispatch {
    pub fn is_overload(&self) -> bool {
        matches!(self, Dispatch::Overload)
    }
}

impl<W: Worker> Resource<W> {
    /// Synchronous call bounded by the resource's default timeout (5000 ms unless
    /// configured otherwise).
    pub async fn call(&self, msg: W::Call) -> Result<Reply<W::Reply>, RouteError> {
        self.call_timeout_at(Affinity::current(), msg, self.desc.call_timeout)
            .await
    }

    /// Synchronous call with an explicit timeout.
    pub async fn call_timeout(
        &self,
        msg: W::Call,
        timeout: Duration,
    ) -> Result<Reply<W::Reply>, RouteError> {
        self.call_timeout_at(Affinity::current(), msg, timeout).await
    }

    /// Synchronous call from an explicit affinity hint.
    pub async fn call_timeout_at(
        &self,
        affinity: Affinity,
        msg: W::Call,
        timeout: Duration,
    ) -> Result<Reply<W::Reply>, RouteError> {
        let permit = match self.desc.try_admit(affinity) {
            Admission::Admitted(permit) => permit,
            Admission::Overload => return Ok(Reply::Overload),
        };
        let shard = permit.shard();
        self.exchange(shard, msg, Some(permit), timeout)
            .await
            .map(Reply::Response)
    }

    /// Fire-and-forget message through admission control.
    pub fn cast(&self, msg: W::Cast) -> Result<Dispatch, RouteError> {
        self.cast_at(Affinity::current(), msg)
    }

    /// Fire-and-forget message from an explicit affinity hint.
    pub fn cast_at(&self, affinity: Affinity, msg: W::Cast) -> Result<Dispatch, RouteError> {
        let permit = match self.desc.try_admit(affinity) {
            Admission::Admitted(permit) => permit,
            Admission::Overload => return Ok(Dispatch::Overload),
        };
        let shard = permit.shard();
        self.enqueue(shard, msg, Some(permit)).map(|()| Dispatch::Sent)
    }

    /// Synchronous call that bypasses admission control.
    pub async fn unbounded_call(
        &self,
        msg: W::Call,
        timeout: Duration,
    ) -> Result<W::Reply, RouteError> {
        self.unbounded_call_at(Affinity::current(), msg, timeout)
            .await
    }

    /// Unbounded call from an explicit affinity hint.
    pub async fn unbounded_call_at(
        &self,
        affinity: Affinity,
        msg: W::Call,
        timeout: Duration,
    ) -> Result<W::Reply, RouteError> {
        let shard = self.desc.shards.preferred(affinity);
        self.exchange(shard, msg, None, timeout).await
    }

    /// Fire-and-forget message that bypasses admission control.
    pub fn unbounded_cast(&self, msg: W::Cast) -> Result<(), RouteError> {
        self.unbounded_cast_at(Affinity::current(), msg)
    }

    /// Unbounded cast from an explicit affinity hint.
    pub fn unbounded_cast_at(&self, affinity: Affinity, msg: W::Cast) -> Result<(), RouteError> {
        let shard = self.desc.shards.preferred(affinity);
        self.enqueue(shard, msg, None)
    }

    /// Appends `item` to the storage of the caller's preferred shard.
    pub fn save(&self, item: W::Item) {
        self.save_at(Affinity::current(), item)
    }

    /// Appends `item` to the storage of the shard preferred by `affinity`.
    pub fn save_at(&self, affinity: Affinity, item: W::Item) {
        let shard = self.desc.shards.preferred(affinity);
        self.desc.storage[shard].push(item);
    }

    async fn exchange(
        &self,
        shard: usize,
        msg: W::Call,
        permit: Option<Permit>,
        timeout: Duration,
    ) -> Result<W::Reply, RouteError> {
        let (tx, rx) = oneshot::channel();
        let env = Envelope::Call {
            msg,
            permit,
            reply: tx,
        };
        if self.desc.workers[shard].send(env).is_err() {
            return Err(self.closed(shard));
        }

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(_)) => Err(RouteError::NoReply {
                resource: self.name().to_string(),
                shard,
            }),
            Err(_elapsed) => {
                self.desc.bus.publish(
                    Event::new(EventKind::CallTimedOut)
                        .with_resource(self.name())
                        .with_shard(shard)
                        .with_timeout(timeout),
                );
                Err(RouteError::Timeout { timeout })
            }
        }
    }

    fn enqueue(
        &self,
        shard: usize,
        msg: W::Cast,
        permit: Option<Permit>,
    ) -> Result<(), RouteError> {
        self.desc.workers[shard]
            .send(Envelope::Cast { msg, permit })
            .map_err(|_| self.closed(shard))
    }

    fn closed(&self, shard: usize) -> RouteError {
        RouteError::WorkerClosed {
            resource: self.name().to_string(),
            shard,
        }
    }
}
