//! # Worker abstraction.
//!
//! A resource is served by `width` instances of one [`Worker`] type, one per shard.
//! Each instance lives inside its own actor task and processes its mailbox
//! sequentially, so a worker may keep plain `&mut self` state.
//!
//! Bounded messages (`call` / `cast`) arrive with `Some(`[`Permit`]`)`: the unit of
//! capacity stays reserved on the shard until the permit is released or dropped.
//! A worker that finishes its work inside the handler can simply let the permit
//! drop; one that hands work off (spawns, buffers) moves the permit along with it.
//! Unbounded messages arrive with `None`.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use shardvisor::{Permit, ShardContext, Worker};
//!
//! #[derive(Default)]
//! struct Counter {
//!     total: u64,
//! }
//!
//! #[async_trait]
//! impl Worker for Counter {
//!     type Call = u64;
//!     type Reply = u64;
//!     type Cast = u64;
//!     type Item = u64;
//!
//!     async fn handle_call(&mut self, add: u64, _permit: Option<Permit>) -> u64 {
//!         self.total += add;
//!         self.total
//!     }
//!
//!     async fn handle_cast(&mut self, add: u64, _permit: Option<Permit>) {
//!         self.total += add;
//!     }
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use crate::shard::{Permit, ShardStore};

/// Per-shard state handed to a worker when its actor starts.
pub struct ShardContext<T> {
    resource: Arc<str>,
    shard: usize,
    store: Arc<ShardStore<T>>,
}

impl<T> ShardContext<T> {
    pub(crate) fn new(resource: Arc<str>, shard: usize, store: Arc<ShardStore<T>>) -> Self {
        Self {
            resource,
            shard,
            store,
        }
    }

    /// Name of the resource this worker serves.
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Shard index this worker serves.
    pub fn shard(&self) -> usize {
        self.shard
    }

    /// Storage that `save` appends to for this shard.
    pub fn store(&self) -> &Arc<ShardStore<T>> {
        &self.store
    }
}

impl<T> Clone for ShardContext<T> {
    fn clone(&self) -> Self {
        Self {
            resource: Arc::clone(&self.resource),
            shard: self.shard,
            store: Arc::clone(&self.store),
        }
    }
}

/// Stateful handler serving one shard of a resource.
#[async_trait]
pub trait Worker: Send + 'static {
    /// Request type for synchronous calls.
    type Call: Send + 'static;
    /// Response type for synchronous calls.
    type Reply: Send + 'static;
    /// Message type for fire-and-forget casts.
    type Cast: Send + 'static;
    /// Item type accepted by `save`.
    type Item: Send + 'static;

    /// Called once inside the actor task before the first message.
    async fn on_start(&mut self, _ctx: &ShardContext<Self::Item>) {}

    /// Handles one synchronous request; the return value is sent back to the caller.
    async fn handle_call(&mut self, msg: Self::Call, permit: Option<Permit>) -> Self::Reply;

    /// Handles one fire-and-forget message.
    async fn handle_cast(&mut self, msg: Self::Cast, permit: Option<Permit>);
}
