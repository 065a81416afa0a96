//! # Registry: named resources, typed handles, teardown.
//!
//! The registry is the only place that knows resources by name. Registration hands
//! back a typed [`Resource`] handle which callers keep and route through directly, so
//! the hot path never consults the name map. By-name lookup exists for code that
//! only has the name; it takes a read lock on a read-mostly map.
//!
//! ## Architecture
//! ```text
//! create_resource(name, cfg, factory)
//!     ├─► cfg.validate()
//!     ├─► resource::spawn()  → descriptor + one WorkerActor per shard
//!     ├─► insert Entry { handle (type-erased), stats, shards, runtime }
//!     └─► Resource<W>
//!
//! remove(name) / shutdown()
//!     ├─► publish ShutdownRequested
//!     ├─► runtime.stop(grace)  → cancel token, join or abort workers
//!     └─► publish AllStoppedWithin | GraceExceeded, ResourceRemoved
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;

use crate::error::{RegistryError, RuntimeError};
use crate::events::{Bus, Event, EventKind};
use crate::shard::ShardTable;
use crate::stats::Stats;
use crate::subscribers::SubscriberSet;

use super::config::{RegistryConfig, ResourceConfig};
use super::resource::{self, Resource, ResourceRuntime};
use super::worker::Worker;

/// Registry-side record of one resource.
struct Entry {
    handle: Arc<dyn Any + Send + Sync>,
    stats: Arc<Stats>,
    shards: Arc<ShardTable>,
    runtime: Arc<ResourceRuntime>,
}

/// Owns every resource of an application and their worker actors.
pub struct Registry {
    cfg: RegistryConfig,
    bus: Bus,
    resources: RwLock<HashMap<String, Entry>>,
    runtime_token: CancellationToken,
}

impl Registry {
    pub(crate) fn new_internal(cfg: RegistryConfig, bus: Bus, runtime_token: CancellationToken) -> Self {
        Self {
            cfg,
            bus,
            resources: RwLock::new(HashMap::new()),
            runtime_token,
        }
    }

    /// Global configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.cfg
    }

    /// Event bus shared with every worker.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Registers `name`, spawning `cfg.worker_count()` workers built by `factory`.
    ///
    /// `factory` receives the shard index. Must be called from within a tokio runtime.
    pub fn create_resource<W, F>(
        &self,
        name: impl Into<String>,
        cfg: ResourceConfig,
        factory: F,
    ) -> Result<Resource<W>, RegistryError>
    where
        W: Worker,
        F: FnMut(usize) -> W,
    {
        let name = name.into();
        cfg.validate()
            .map_err(|reason| RegistryError::InvalidConfig {
                name: name.clone(),
                reason,
            })?;
        if self.resources.read().contains_key(&name) {
            return Err(RegistryError::AlreadyExists { name });
        }

        let token = self.runtime_token.child_token();
        let (res, runtime) = resource::spawn(&name, &cfg, factory, self.bus.clone(), token);
        let entry = Entry {
            handle: Arc::clone(&res.desc) as Arc<dyn Any + Send + Sync>,
            stats: Arc::clone(&res.desc.stats),
            shards: Arc::clone(&res.desc.shards),
            runtime: Arc::new(runtime),
        };

        let mut map = self.resources.write();
        if map.contains_key(&name) {
            drop(map);
            // lost a registration race: tear down the workers we just spawned
            entry.runtime.abort();
            return Err(RegistryError::AlreadyExists { name });
        }
        map.insert(name.clone(), entry);
        drop(map);

        tracing::info!(
            resource = %name,
            width = res.width(),
            shard_limit = res.shard_limit(),
            "resource created"
        );
        Ok(res)
    }

    /// Looks up a resource by name and worker type.
    pub fn resource<W: Worker>(&self, name: &str) -> Result<Resource<W>, RegistryError> {
        let handle = {
            let map = self.resources.read();
            let entry = map.get(name).ok_or_else(|| RegistryError::NotFound {
                name: name.to_string(),
            })?;
            Arc::clone(&entry.handle)
        };
        handle
            .downcast::<resource::ResourceDescriptor<W>>()
            .map(|desc| Resource { desc })
            .map_err(|_| RegistryError::TypeMismatch {
                name: name.to_string(),
            })
    }

    /// Number of rejected admissions for `name`.
    pub fn rejected(&self, name: &str) -> Result<u64, RegistryError> {
        self.with_entry(name, |e| e.stats.rejected())
    }

    /// Units currently admitted on `name` across all shards (racy snapshot).
    pub fn in_flight(&self, name: &str) -> Result<u64, RegistryError> {
        self.with_entry(name, |e| e.shards.in_flight())
    }

    /// Sorted names of all registered resources.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.resources.read().keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// True if no resource is registered.
    pub fn is_empty(&self) -> bool {
        self.resources.read().is_empty()
    }

    /// Stops the workers of `name` and unregisters it.
    ///
    /// Handles held by callers stay valid but every routed message now fails with
    /// [`RouteError::WorkerClosed`](crate::RouteError::WorkerClosed).
    pub async fn remove(&self, name: &str) -> Result<(), RuntimeError> {
        let entry = self
            .resources
            .write()
            .remove(name)
            .ok_or_else(|| RegistryError::NotFound {
                name: name.to_string(),
            })?;

        self.bus
            .publish(Event::new(EventKind::ShutdownRequested).with_resource(name));
        let res = entry.runtime.stop(self.cfg.grace).await;
        self.report_grace(&res);
        self.bus
            .publish(Event::new(EventKind::ResourceRemoved).with_resource(name));
        tracing::info!(resource = name, ok = res.is_ok(), "resource removed");
        res
    }

    /// Stops every resource within one grace period and cancels background tasks.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        let entries: Vec<(String, Entry)> = self.resources.write().drain().collect();
        self.bus.publish(Event::new(EventKind::ShutdownRequested));

        let grace = self.cfg.grace;
        let results =
            futures::future::join_all(entries.iter().map(|(_, e)| e.runtime.stop(grace))).await;

        let mut stuck = Vec::new();
        for res in results {
            if let Err(RuntimeError::GraceExceeded { stuck: s, .. }) = res {
                stuck.extend(s);
            }
        }
        let res = if stuck.is_empty() {
            Ok(())
        } else {
            Err(RuntimeError::GraceExceeded { grace, stuck })
        };
        self.report_grace(&res);
        for (name, _) in &entries {
            self.bus
                .publish(Event::new(EventKind::ResourceRemoved).with_resource(name.as_str()));
        }

        self.runtime_token.cancel();
        res
    }

    /// Spawns the bus listener that feeds the subscriber set.
    pub(crate) fn spawn_listener(&self, subs: Arc<SubscriberSet>) {
        let mut rx = self.bus.subscribe();
        let token = self.runtime_token.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    msg = rx.recv() => match msg {
                        Ok(ev) => subs.emit(&ev),
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(n)) => {
                            tracing::warn!(skipped = n, "event listener lagged");
                        }
                    }
                }
            }
            // deliver what is already queued before subscribers go away
            while let Ok(ev) = rx.try_recv() {
                subs.emit(&ev);
            }
            if let Ok(subs) = Arc::try_unwrap(subs) {
                subs.shutdown().await;
            }
        });
    }

    fn with_entry<T>(&self, name: &str, f: impl FnOnce(&Entry) -> T) -> Result<T, RegistryError> {
        self.resources
            .read()
            .get(name)
            .map(f)
            .ok_or_else(|| RegistryError::NotFound {
                name: name.to_string(),
            })
    }

    fn report_grace(&self, res: &Result<(), RuntimeError>) {
        match res {
            Ok(()) => self.bus.publish(Event::new(EventKind::AllStoppedWithin)),
            Err(e) => {
                tracing::warn!(error = %e, "grace period exceeded");
                let stuck = match e {
                    RuntimeError::GraceExceeded { stuck, .. } => stuck.join(","),
                    other => other.as_message(),
                };
                self.bus
                    .publish(Event::new(EventKind::GraceExceeded).with_reason(stuck));
            }
        }
    }
}

impl Drop for Registry {
    fn drop(&mut self) {
        self.runtime_token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicU64;
    use std::time::Duration;

    use tokio::sync::oneshot;

    use super::*;
    use crate::affinity::Affinity;
    use crate::error::RouteError;
    use crate::testkit::{Op, Other, Scripted, drain, saw};

    fn registry(grace: Duration) -> Arc<Registry> {
        Registry::builder(RegistryConfig {
            grace,
            ..RegistryConfig::default()
        })
        .build()
    }

    fn scripted(reg: &Registry, name: &str, total: u64, workers: usize) -> Resource<Scripted> {
        let casts = Arc::new(AtomicU64::new(0));
        reg.create_resource(name, ResourceConfig::new(total).with_workers(workers), |_| {
            Scripted::new(&casts)
        })
        .unwrap()
    }

    #[tokio::test]
    async fn create_then_lookup_shares_the_descriptor() {
        let reg = registry(Duration::from_secs(1));
        let mut rx = reg.bus().subscribe();
        let created = scripted(&reg, "db", 8, 2);
        assert!(saw(&drain(&mut rx), EventKind::ResourceCreated));

        let found = reg.resource::<Scripted>("db").unwrap();
        assert_eq!(found.width(), 2);
        assert_eq!(found.shard_limit(), 4);
        assert_eq!(found.total_limit(), 8);
        assert!(Arc::ptr_eq(found.stats(), created.stats()));

        let (_tx, rx) = oneshot::channel();
        assert!(!created.cast_at(Affinity::from(0), Op::Hold(rx)).unwrap().is_overload());
        assert_eq!(reg.in_flight("db").unwrap(), 1);
        assert_eq!(found.shards().in_flight(), 1);
    }

    #[tokio::test]
    async fn uneven_limit_drops_the_remainder() {
        let reg = registry(Duration::from_secs(1));
        let res = scripted(&reg, "odd", 10, 3);
        assert_eq!(res.shard_limit(), 3);
    }

    #[tokio::test]
    async fn duplicate_name_is_rejected() {
        let reg = registry(Duration::from_secs(1));
        let _first = scripted(&reg, "db", 4, 1);
        let err = reg
            .create_resource("db", ResourceConfig::new(4).with_workers(1), |_| Other)
            .err();
        assert_eq!(
            err,
            Some(RegistryError::AlreadyExists { name: "db".into() })
        );
        assert_eq!(reg.list(), vec!["db".to_string()]);
    }

    #[tokio::test]
    async fn invalid_config_is_rejected_before_spawning() {
        let reg = registry(Duration::from_secs(1));
        let err = reg
            .create_resource("tiny", ResourceConfig::new(1).with_workers(4), |_| Other)
            .err();
        assert!(matches!(err, Some(RegistryError::InvalidConfig { ref name, .. }) if name == "tiny"));
        assert!(reg.is_empty());
    }

    #[tokio::test]
    async fn lookup_errors() {
        let reg = registry(Duration::from_secs(1));
        let _db = scripted(&reg, "db", 4, 1);

        assert!(matches!(
            reg.resource::<Scripted>("missing"),
            Err(RegistryError::NotFound { .. })
        ));
        assert!(matches!(
            reg.resource::<Other>("db"),
            Err(RegistryError::TypeMismatch { .. })
        ));
        assert!(matches!(reg.rejected("missing"), Err(RegistryError::NotFound { .. })));
        assert_eq!(reg.rejected("db"), Ok(0));
    }

    #[tokio::test]
    async fn rejections_are_visible_through_the_registry() {
        let reg = registry(Duration::from_secs(1));
        let res = scripted(&reg, "db", 1, 1);
        let (_a, rx_a) = oneshot::channel();
        let (_b, rx_b) = oneshot::channel();
        assert!(!res.cast_at(Affinity::from(0), Op::Hold(rx_a)).unwrap().is_overload());
        assert!(!res.cast_at(Affinity::from(0), Op::Hold(rx_b)).unwrap().is_overload());
        assert!(res.cast_at(Affinity::from(0), Op::Echo(0)).unwrap().is_overload());
        assert_eq!(reg.rejected("db"), Ok(1));
    }

    #[tokio::test]
    async fn remove_stops_workers_and_frees_the_name() {
        let reg = registry(Duration::from_secs(1));
        let mut rx = reg.bus().subscribe();
        let res = scripted(&reg, "db", 4, 2);

        reg.remove("db").await.unwrap();
        assert!(!res.is_running());
        assert!(reg.is_empty());

        let events = drain(&mut rx);
        for kind in [
            EventKind::ShutdownRequested,
            EventKind::WorkerStopped,
            EventKind::AllStoppedWithin,
            EventKind::ResourceRemoved,
        ] {
            assert!(saw(&events, kind), "missing {kind:?}");
        }

        let again = scripted(&reg, "db", 4, 2);
        assert!(again.is_running());
    }

    #[tokio::test]
    async fn remove_unknown_name_fails() {
        let reg = registry(Duration::from_secs(1));
        let err = reg.remove("ghost").await.unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Registry(RegistryError::NotFound { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn stuck_worker_exceeds_grace_and_is_aborted() {
        let reg = registry(Duration::from_millis(200));
        let mut rx = reg.bus().subscribe();
        let res = scripted(&reg, "slow", 4, 2);

        let (entered, started) = oneshot::channel();
        res.unbounded_cast_at(Affinity::from(1), Op::Hang(entered))
            .unwrap();
        started.await.unwrap();

        let err = reg.remove("slow").await.unwrap_err();
        match err {
            RuntimeError::GraceExceeded { grace, stuck } => {
                assert_eq!(grace, Duration::from_millis(200));
                assert_eq!(stuck, vec!["slow#1".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(saw(&drain(&mut rx), EventKind::GraceExceeded));
    }

    #[tokio::test]
    async fn shutdown_stops_every_resource() {
        let reg = registry(Duration::from_secs(1));
        let a = scripted(&reg, "a", 4, 2);
        let b = scripted(&reg, "b", 4, 1);
        assert_eq!(reg.list(), vec!["a".to_string(), "b".to_string()]);

        reg.shutdown().await.unwrap();
        assert!(reg.is_empty());
        assert!(!a.is_running());
        assert!(!b.is_running());
    }

    #[tokio::test]
    async fn default_call_timeout_comes_from_config() {
        let reg = registry(Duration::from_secs(1));
        let cfg = ResourceConfig::new(4)
            .with_workers(1)
            .with_call_timeout(Duration::from_millis(750));
        let res = reg.create_resource("svc", cfg, |_| Other).unwrap();
        assert_eq!(res.default_call_timeout(), Duration::from_millis(750));
    }

    #[tokio::test]
    async fn dropping_the_registry_closes_outstanding_handles() {
        let reg = registry(Duration::from_secs(1));
        let res = scripted(&reg, "svc", 4, 2);
        assert!(res.is_running());

        drop(reg);
        while res.is_running() {
            tokio::task::yield_now().await;
        }

        let err = res.cast_at(Affinity::from(0), Op::Echo(0)).unwrap_err();
        assert!(matches!(err, RouteError::WorkerClosed { shard: 0, .. }));
        assert_eq!(res.shards().in_flight(), 0);
    }
}
