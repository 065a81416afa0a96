use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::{
    events::Bus,
    subscribers::{Subscribe, SubscriberSet},
};

use super::{config::RegistryConfig, registry::Registry};

/// Builder for constructing a [`Registry`] with optional subscribers.
pub struct RegistryBuilder {
    cfg: RegistryConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl RegistryBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: RegistryConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive runtime events (resource and worker lifecycle, call
    /// timeouts, teardown) through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Adds one event subscriber.
    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Builds the registry and starts the event listener.
    ///
    /// Must be called from within a tokio runtime.
    pub fn build(self) -> Arc<Registry> {
        let bus = Bus::new(self.cfg.bus_capacity);
        let runtime_token = CancellationToken::new();
        let subs = Arc::new(SubscriberSet::new(self.subscribers, bus.clone()));

        let registry = Arc::new(Registry::new_internal(self.cfg, bus, runtime_token));
        if !subs.is_empty() {
            registry.spawn_listener(subs);
        }
        registry
    }
}

impl Registry {
    /// Starts building a registry with the given configuration.
    pub fn builder(cfg: RegistryConfig) -> RegistryBuilder {
        RegistryBuilder::new(cfg)
    }
}
