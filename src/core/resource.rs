//! # Resource descriptor and typed handle.
//!
//! A [`ResourceDescriptor`] is built once when a resource is registered and never
//! changes afterwards. It binds the shard table, the worker mailboxes, the per-shard
//! storage and the statistics of one resource, all indexed identically:
//!
//! ```text
//! shard i  ──►  shards[i] (count, full)  ──►  workers[i]  ──►  storage[i]
//! ```
//!
//! [`Resource`] is the cheap, cloneable handle callers keep and route through
//! (see the `router` module for the operations).

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::admission::{self, Admission};
use crate::affinity::Affinity;
use crate::error::RuntimeError;
use crate::events::{Bus, Event, EventKind};
use crate::shard::{ShardStore, ShardTable};
use crate::stats::Stats;

use super::actor::{WorkerActor, WorkerHandle};
use super::config::ResourceConfig;
use super::worker::{ShardContext, Worker};

/// Immutable per-resource record.
pub struct ResourceDescriptor<W: Worker> {
    pub(crate) name: Arc<str>,
    pub(crate) total_limit: u64,
    pub(crate) shards: Arc<ShardTable>,
    pub(crate) workers: Box<[WorkerHandle<W>]>,
    pub(crate) storage: Box<[Arc<ShardStore<W::Item>>]>,
    pub(crate) stats: Arc<Stats>,
    pub(crate) call_timeout: Duration,
    pub(crate) bus: Bus,
}

impl<W: Worker> ResourceDescriptor<W> {
    /// Runs the admission controller against this resource.
    #[inline]
    pub(crate) fn try_admit(&self, affinity: Affinity) -> Admission {
        admission::try_admit(&self.shards, &self.stats, affinity)
    }

    #[inline]
    pub(crate) fn width(&self) -> usize {
        self.workers.len()
    }
}

/// Typed handle to a registered resource.
///
/// A handle does not keep its [`Registry`](crate::Registry) alive. Dropping the last
/// `Arc<Registry>` cancels every worker; handles stay valid afterwards, but routed
/// messages fail with [`RouteError::WorkerClosed`](crate::RouteError::WorkerClosed)
/// (or `NoReply` for a call that was already queued) and
/// [`is_running`](Self::is_running) turns false.
pub struct Resource<W: Worker> {
    pub(crate) desc: Arc<ResourceDescriptor<W>>,
}

impl<W: Worker> Clone for Resource<W> {
    fn clone(&self) -> Self {
        Self {
            desc: Arc::clone(&self.desc),
        }
    }
}

impl<W: Worker> Resource<W> {
    /// Resource name.
    pub fn name(&self) -> &str {
        &self.desc.name
    }

    /// Number of shards (and workers).
    pub fn width(&self) -> usize {
        self.desc.width()
    }

    /// Configured total limit.
    pub fn total_limit(&self) -> u64 {
        self.desc.total_limit
    }

    /// Per-shard limit (`total_limit / width`).
    pub fn shard_limit(&self) -> u64 {
        self.desc.shards.limit()
    }

    /// Default timeout used by [`call`](Self::call).
    pub fn default_call_timeout(&self) -> Duration {
        self.desc.call_timeout
    }

    /// Number of denied admissions since creation.
    pub fn rejected(&self) -> u64 {
        self.desc.stats.rejected()
    }

    /// Statistics recorder of this resource.
    pub fn stats(&self) -> &Arc<Stats> {
        &self.desc.stats
    }

    /// Shard counters of this resource (read access for monitoring and tests).
    pub fn shards(&self) -> &ShardTable {
        &self.desc.shards
    }

    /// Storage of shard `index`; panics if `index >= width`.
    pub fn store(&self, index: usize) -> &Arc<ShardStore<W::Item>> {
        &self.desc.storage[index]
    }

    /// Whether every worker mailbox is still open.
    pub fn is_running(&self) -> bool {
        self.desc.workers.iter().all(|w| !w.is_closed())
    }
}

/// Running actors of one resource, owned by the registry.
pub(crate) struct ResourceRuntime {
    name: Arc<str>,
    token: CancellationToken,
    joins: Mutex<Vec<(usize, JoinHandle<()>)>>,
}

impl ResourceRuntime {
    /// Cancels every worker and waits up to `grace` for them to exit.
    ///
    /// Workers still running at the deadline are aborted and reported as stuck.
    pub(crate) async fn stop(&self, grace: Duration) -> Result<(), RuntimeError> {
        self.token.cancel();
        let joins = std::mem::take(&mut *self.joins.lock());
        let deadline = tokio::time::Instant::now() + grace;

        let mut stuck = Vec::new();
        for (shard, mut join) in joins {
            if tokio::time::timeout_at(deadline, &mut join).await.is_err() {
                join.abort();
                stuck.push(format!("{}#{shard}", self.name));
            }
        }

        if stuck.is_empty() {
            Ok(())
        } else {
            Err(RuntimeError::GraceExceeded { grace, stuck })
        }
    }

    /// Cancels and aborts every worker without waiting.
    pub(crate) fn abort(&self) {
        self.token.cancel();
        for (_, join) in self.joins.lock().drain(..) {
            join.abort();
        }
    }
}

/// Builds the descriptor, spawns one actor per shard and returns both halves.
///
/// Must be called from within a tokio runtime; `cfg` must already be validated.
pub(crate) fn spawn<W, F>(
    name: &str,
    cfg: &ResourceConfig,
    mut factory: F,
    bus: Bus,
    token: CancellationToken,
) -> (Resource<W>, ResourceRuntime)
where
    W: Worker,
    F: FnMut(usize) -> W,
{
    let name: Arc<str> = Arc::from(name);
    let width = cfg.worker_count();
    let shards = Arc::new(ShardTable::new(width, cfg.shard_limit()));

    let mut workers = Vec::with_capacity(width.get());
    let mut storage = Vec::with_capacity(width.get());
    let mut joins = Vec::with_capacity(width.get());

    for shard in 0..width.get() {
        let store = Arc::new(ShardStore::new());
        let ctx = ShardContext::new(Arc::clone(&name), shard, Arc::clone(&store));
        let (actor, handle) = WorkerActor::new(factory(shard), ctx, bus.clone());

        joins.push((shard, tokio::spawn(actor.run(token.clone()))));
        workers.push(handle);
        storage.push(store);
    }

    let desc = ResourceDescriptor {
        name: Arc::clone(&name),
        total_limit: cfg.total_limit,
        shards,
        workers: workers.into_boxed_slice(),
        storage: storage.into_boxed_slice(),
        stats: Arc::new(Stats::new()),
        call_timeout: cfg.call_timeout,
        bus: bus.clone(),
    };

    bus.publish(
        Event::new(EventKind::ResourceCreated)
            .with_resource(Arc::clone(&name))
            .with_reason(format!(
                "width={width} total_limit={} shard_limit={}",
                cfg.total_limit,
                desc.shards.limit()
            )),
    );

    let runtime = ResourceRuntime {
        name,
        token,
        joins: Mutex::new(joins),
    };
    (
        Resource {
            desc: Arc::new(desc),
        },
        runtime,
    )
}
