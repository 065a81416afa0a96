//! # Registry and resource configuration.
//!
//! - [`RegistryConfig`]: settings shared by every resource of a registry.
//! - [`ResourceConfig`]: capacity and worker settings for one resource.
//!
//! ## Sentinel values
//! - `ResourceConfig::workers = 0` → one worker per available CPU
//! - `RegistryConfig::grace = 0s` → do not wait for workers on teardown

use std::num::NonZeroUsize;
use std::time::Duration;

/// Default bound for [`Resource::call`](crate::Resource::call).
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_millis(5000);

/// Global configuration for a [`Registry`](crate::Registry).
#[derive(Clone, Debug)]
pub struct RegistryConfig {
    /// Capacity of the event bus broadcast channel ring buffer (min 1).
    pub bus_capacity: usize,

    /// Maximum time to wait for workers to stop on `remove` / `shutdown`.
    pub grace: Duration,
}

impl Default for RegistryConfig {
    /// Default configuration:
    ///
    /// - `bus_capacity = 1024`
    /// - `grace = 5s`
    fn default() -> Self {
        Self {
            bus_capacity: 1024,
            grace: Duration::from_secs(5),
        }
    }
}

/// Configuration for one resource.
///
/// ## Field semantics
/// - `total_limit`: admitted units across all shards; each shard gets
///   `total_limit / width`, the remainder is never usable
/// - `workers`: shard count (`0` = available parallelism)
/// - `call_timeout`: bound used by the two-argument `call`
#[derive(Clone, Debug)]
pub struct ResourceConfig {
    /// Maximum in-flight units across all shards.
    pub total_limit: u64,

    /// Number of shards / workers.
    ///
    /// - `0` = `std::thread::available_parallelism()` (falls back to 1)
    pub workers: usize,

    /// Default timeout for synchronous calls.
    pub call_timeout: Duration,
}

impl ResourceConfig {
    /// Creates a config with the given total limit and default everything else.
    pub fn new(total_limit: u64) -> Self {
        Self {
            total_limit,
            ..Self::default()
        }
    }

    /// Sets an explicit worker count.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Sets the default call timeout.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Resolves the shard count, replacing the `0` sentinel by the host's parallelism.
    #[inline]
    pub fn worker_count(&self) -> NonZeroUsize {
        match NonZeroUsize::new(self.workers) {
            Some(n) => n,
            None => std::thread::available_parallelism().unwrap_or(NonZeroUsize::MIN),
        }
    }

    /// Per-shard limit for the resolved worker count.
    #[inline]
    pub fn shard_limit(&self) -> u64 {
        self.total_limit / self.worker_count().get() as u64
    }

    /// Checks that the config yields at least one unit of capacity per shard.
    pub fn validate(&self) -> Result<(), String> {
        let width = self.worker_count().get();
        if self.total_limit < width as u64 {
            return Err(format!(
                "total_limit {} is below worker count {width}; per-shard limit would be 0",
                self.total_limit
            ));
        }
        if self.call_timeout.is_zero() {
            return Err("call_timeout must be non-zero".to_string());
        }
        Ok(())
    }
}

impl Default for ResourceConfig {
    /// Default configuration:
    ///
    /// - `total_limit = 1024`
    /// - `workers = 0` (available parallelism)
    /// - `call_timeout = 5000ms`
    fn default() -> Self {
        Self {
            total_limit: 1024,
            workers: 0,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shard_limit_drops_the_remainder() {
        let cfg = ResourceConfig::new(10).with_workers(3);
        assert_eq!(cfg.shard_limit(), 3);
    }

    #[test]
    fn zero_workers_resolves_to_host_parallelism() {
        let cfg = ResourceConfig::new(1 << 20);
        assert!(cfg.worker_count().get() >= 1);
    }

    #[test]
    fn validate_rejects_zero_shard_limit() {
        assert!(ResourceConfig::new(3).with_workers(4).validate().is_err());
        assert!(ResourceConfig::new(4).with_workers(4).validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let cfg = ResourceConfig::new(8)
            .with_workers(2)
            .with_call_timeout(Duration::ZERO);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn default_call_timeout_is_five_seconds() {
        assert_eq!(ResourceConfig::default().call_timeout, Duration::from_millis(5000));
    }
}
