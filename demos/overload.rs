//! # Example: overload
//!
//! Drives a small resource past its capacity and shows callers being shed.
//!
//! Shows how to:
//! - Implement the [`Worker`] trait with per-shard state.
//! - Register a resource and route bounded calls through it.
//! - Tell `Reply::Overload` apart from routing errors.
//! - Watch lifecycle events through [`LogWriter`].
//!
//! ## Flow
//! ```text
//! 64 tasks ──► Resource::call(Lookup)
//!     ├─► try_admit(affinity) ── admitted ──► Slow worker (shard i) ──► Response
//!     └─► every shard latched ──────────────► Overload (counted in rejected())
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=info cargo run --example overload --features logging
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use shardvisor::{
    LogWriter, Permit, Registry, RegistryConfig, Reply, ResourceConfig, RouteError, ShardContext,
    Worker,
};
use tracing_subscriber::EnvFilter;

/// Pretends to look keys up in a slow backend.
struct Slow {
    shard: usize,
    served: u64,
}

#[async_trait]
impl Worker for Slow {
    type Call = String;
    type Reply = String;
    type Cast = ();
    type Item = String;

    async fn on_start(&mut self, ctx: &ShardContext<String>) {
        tracing::info!(resource = ctx.resource(), shard = ctx.shard(), "backend shard ready");
    }

    async fn handle_call(&mut self, key: String, _permit: Option<Permit>) -> String {
        tokio::time::sleep(Duration::from_millis(50)).await;
        self.served += 1;
        format!("{key}@{}#{}", self.shard, self.served)
    }

    async fn handle_cast(&mut self, _msg: (), _permit: Option<Permit>) {}
}

#[tokio::main(flavor = "multi_thread", worker_threads = 4)]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let registry = Registry::builder(RegistryConfig::default())
        .with_subscriber(Arc::new(LogWriter::new()))
        .build();

    let backend = registry.create_resource(
        "backend",
        ResourceConfig::new(16)
            .with_workers(4)
            .with_call_timeout(Duration::from_secs(2)),
        |shard| Slow { shard, served: 0 },
    )?;

    let mut tasks = Vec::new();
    for i in 0..64 {
        let backend = backend.clone();
        tasks.push(tokio::spawn(async move {
            backend.save(format!("audit:{i}"));
            backend.call(format!("key-{i}")).await
        }));
    }

    let (mut served, mut shed) = (0u64, 0u64);
    for task in tasks {
        match task.await? {
            Ok(Reply::Response(v)) => {
                served += 1;
                tracing::debug!(%v, "served");
            }
            Ok(Reply::Overload) => shed += 1,
            Err(e @ RouteError::Timeout { .. }) => tracing::warn!(error = %e, "slow backend"),
            Err(e) => return Err(e.into()),
        }
    }

    let audited: usize = (0..backend.width()).map(|i| backend.store(i).len()).sum();
    println!(
        "served={served} shed={shed} rejected={} audited={audited}",
        backend.rejected()
    );

    registry.shutdown().await?;
    Ok(())
}
