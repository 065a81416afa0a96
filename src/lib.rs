//! # shardvisor
//!
//! **Shardvisor** is an admission-control layer that protects a fixed pool of stateful
//! worker actors from overload.
//!
//! Callers submit work to a named *resource*. Each resource is split into `width`
//! shards, one worker per shard. A call is either routed to a shard with free
//! capacity or rejected on the spot with `Overload`: there is no queueing, no
//! priority and no retry. Capacity accounting is sharded by caller affinity, so
//! callers on different threads touch different atomics and never contend on a
//! shared lock or counter.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   caller (thread T)
//!        │  Affinity::current() = T's hint
//!        ▼
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │ Resource<W> (typed handle, Arc<ResourceDescriptor>)                  │
//! │                                                                      │
//! │  try_admit(hint):  start = hint mod width                            │
//! │     shard[start] → shard[start+1] → … (wraps once)                   │
//! │        │ admitted(Permit)                     │ all latched          │
//! │        ▼                                      ▼                      │
//! │  workers[shard].send(Envelope + Permit)    stats.rejected += 1       │
//! │                                            return Overload           │
//! └────────┬─────────────────────────────────────────────────────────────┘
//!          ▼
//!   ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!   │ WorkerActor 0│   │ WorkerActor 1│   │ WorkerActor N│   (one mailbox each)
//!   │  Worker impl │   │  Worker impl │   │  Worker impl │
//!   └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!          │ drop(Permit) → count -= 1, clear latch below limit
//!          ▼
//!   ShardTable [ (count, full) × width ]
//! ```
//!
//! ### Shard latch
//! ```text
//! reserve:  CAS { full? → refuse │ count' = count + 1, full' = count >= shard_limit }
//! release:  CAS { count' = count - 1, count' < shard_limit → full' = false }
//! ```
//! The unit that trips the latch is still admitted, so a shard holds at most
//! `shard_limit + 1` units however many callers race on it.
//! `shard_limit = total_limit / width`; the remainder of the division is never usable.
//!
//! ## Features
//! | Area              | Description                                                | Key types / traits                    |
//! |-------------------|------------------------------------------------------------|---------------------------------------|
//! | **Admission**     | Lock-free sharded capacity checks with fallback scan.      | [`try_admit`], [`Admission`]          |
//! | **Routing**       | Bounded and unbounded call/cast, sharded save.             | [`Resource`], [`Reply`], [`Dispatch`] |
//! | **Workers**       | Stateful per-shard handlers behind actor mailboxes.        | [`Worker`], [`Permit`]                |
//! | **Registry**      | Named resources, typed handles, graceful teardown.         | [`Registry`], [`ResourceConfig`]      |
//! | **Subscriber API**| Hook into runtime events (logging, metrics, alerts).       | [`Subscribe`], [`Event`]              |
//! | **Errors**        | Typed errors; Overload is a value, not an error.           | [`RouteError`], [`RegistryError`]     |
//!
//! ## Optional features
//! - `logging`: exports [`LogWriter`], a subscriber that forwards events to `tracing`.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use shardvisor::{Permit, Registry, RegistryConfig, Reply, ResourceConfig, Worker};
//!
//! struct Echo;
//!
//! #[async_trait]
//! impl Worker for Echo {
//!     type Call = String;
//!     type Reply = String;
//!     type Cast = ();
//!     type Item = ();
//!
//!     async fn handle_call(&mut self, msg: String, _permit: Option<Permit>) -> String {
//!         msg
//!     }
//!     async fn handle_cast(&mut self, _msg: (), _permit: Option<Permit>) {}
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = Registry::builder(RegistryConfig::default()).build();
//!     let echo = registry.create_resource("echo", ResourceConfig::new(64).with_workers(4), |_| Echo)?;
//!
//!     match echo.call("hello".to_string()).await? {
//!         Reply::Response(r) => assert_eq!(r, "hello"),
//!         Reply::Overload => println!("busy, try later"),
//!     }
//!
//!     registry.shutdown().await?;
//!     Ok(())
//! }
//! ```
mod admission;
mod affinity;
mod core;
mod error;
mod events;
mod panic;
mod shard;
mod stats;
mod subscribers;

// ---- Public re-exports ----

pub use admission::{Admission, try_admit};
pub use affinity::Affinity;
pub use core::{
    DEFAULT_CALL_TIMEOUT, Dispatch, Registry, RegistryBuilder, RegistryConfig, Reply, Resource,
    ResourceConfig, ShardContext, Worker,
};
pub use error::{RegistryError, RouteError, RuntimeError};
pub use events::{Bus, Event, EventKind};
pub use shard::{Permit, ShardCounter, ShardStore, ShardTable};
pub use stats::Stats;
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a built-in subscriber that logs events through `tracing`.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;

#[cfg(test)]
mod testkit;
