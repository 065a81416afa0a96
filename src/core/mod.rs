//! Runtime core: resources, workers, routing and the registry that owns them.
//!
//! Internal modules:
//! - [`config`]: registry and resource configuration;
//! - [`worker`]: the [`Worker`] trait implemented by users;
//! - [`actor`]: mailbox loop running one worker per shard;
//! - [`resource`]: immutable descriptor and the typed [`Resource`] handle;
//! - [`router`]: call / cast / unbounded / save operations;
//! - [`registry`]: name → resource map, registration and teardown;
//! - [`builder`]: [`Registry`] construction with subscribers.

mod actor;
mod builder;
mod config;
mod registry;
mod resource;
mod router;
mod worker;

pub use builder::RegistryBuilder;
pub use config::{DEFAULT_CALL_TIMEOUT, RegistryConfig, ResourceConfig};
pub use registry::Registry;
pub use resource::Resource;
pub use router::{Dispatch, Reply};
pub use worker::{ShardContext, Worker};
