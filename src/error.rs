//! Error types used by the shardvisor runtime and its routing layer.
//!
//! This module defines three error enums:
//!
//! - [`RouteError`] — failures while exchanging a message with a worker.
//! - [`RegistryError`] — invalid registration or lookup of a resource.
//! - [`RuntimeError`] — errors raised while tearing resources down.
//!
//! Overload is deliberately **not** an error: bounded operations return it as a value
//! ([`Reply::Overload`](crate::Reply), [`Dispatch::Overload`](crate::Dispatch)).
//!
//! Every enum provides `as_label` (stable snake_case for logs/metrics) and `as_message`.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced while routing a message to a worker.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// The worker did not answer a synchronous call in time.
    ///
    /// The message may already have been delivered.
    #[error("call timed out after {timeout:?}")]
    Timeout {
        /// The bound that was exceeded.
        timeout: Duration,
    },

    /// The worker's mailbox is closed (resource removed or registry shut down).
    #[error("worker {shard} of resource '{resource}' is closed")]
    WorkerClosed {
        /// Resource name.
        resource: String,
        /// Shard index of the worker.
        shard: usize,
    },

    /// The worker accepted the call but dropped the reply (handler panicked).
    #[error("worker {shard} of resource '{resource}' dropped the reply")]
    NoReply {
        /// Resource name.
        resource: String,
        /// Shard index of the worker.
        shard: usize,
    },
}

impl RouteError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use shardvisor::RouteError;
    /// use std::time::Duration;
    ///
    /// let err = RouteError::Timeout { timeout: Duration::from_secs(5) };
    /// assert_eq!(err.as_label(), "route_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RouteError::Timeout { .. } => "route_timeout",
            RouteError::WorkerClosed { .. } => "route_worker_closed",
            RouteError::NoReply { .. } => "route_no_reply",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RouteError::Timeout { timeout } => format!("timeout: {timeout:?}"),
            RouteError::WorkerClosed { resource, shard } => {
                format!("closed: resource={resource} shard={shard}")
            }
            RouteError::NoReply { resource, shard } => {
                format!("no reply: resource={resource} shard={shard}")
            }
        }
    }

    /// Whether this failure is a timeout (as opposed to a dead worker).
    pub fn is_timeout(&self) -> bool {
        matches!(self, RouteError::Timeout { .. })
    }
}

/// # Errors produced by resource registration and lookup.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A resource with this name is already registered.
    #[error("resource '{name}' already exists")]
    AlreadyExists {
        /// Resource name.
        name: String,
    },

    /// No resource with this name is registered.
    #[error("resource '{name}' not found")]
    NotFound {
        /// Resource name.
        name: String,
    },

    /// The resource exists but was registered with a different worker type.
    #[error("resource '{name}' is served by a different worker type")]
    TypeMismatch {
        /// Resource name.
        name: String,
    },

    /// The resource configuration cannot produce a usable descriptor.
    #[error("invalid config for resource '{name}': {reason}")]
    InvalidConfig {
        /// Resource name.
        name: String,
        /// What is wrong with it.
        reason: String,
    },
}

impl RegistryError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RegistryError::AlreadyExists { .. } => "registry_already_exists",
            RegistryError::NotFound { .. } => "registry_not_found",
            RegistryError::TypeMismatch { .. } => "registry_type_mismatch",
            RegistryError::InvalidConfig { .. } => "registry_invalid_config",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RegistryError::AlreadyExists { name } => format!("duplicate resource: {name}"),
            RegistryError::NotFound { name } => format!("unknown resource: {name}"),
            RegistryError::TypeMismatch { name } => format!("worker type mismatch: {name}"),
            RegistryError::InvalidConfig { name, reason } => {
                format!("invalid config: {name}: {reason}")
            }
        }
    }
}

/// # Errors produced by the runtime itself.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Teardown grace period was exceeded; some workers were still running.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Workers (`resource#shard`) that did not stop in time.
        stuck: Vec<String>,
    },

    /// Tried to remove a resource that is not registered.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use shardvisor::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
            RuntimeError::Registry(e) => e.as_label(),
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::GraceExceeded { grace, stuck } => {
                format!("grace exceeded after {grace:?}; stuck workers={stuck:?}")
            }
            RuntimeError::Registry(e) => e.as_message(),
        }
    }
}
