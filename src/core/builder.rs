use std::sync::Arc;

use crate::{
    config::ServiceConfig,
    events::Bus,
    subscribers::{LogWriter, Subscribe, SubscriberSet},
};

use super::service::Service;

/// Builder for constructing a [`Service`] with custom subscribers.
pub struct ServiceBuilder {
    cfg: ServiceConfig,
    log_writer: bool,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl ServiceBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: ServiceConfig) -> Self {
        Self {
            cfg,
            log_writer: true,
            subscribers: Vec::new(),
        }
    }

    /// Adds event subscribers next to the default [`LogWriter`].
    ///
    /// Subscribers receive runtime events (worker lifecycle, failures, shutdown)
    /// through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers.extend(subscribers);
        self
    }

    /// Drops the default [`LogWriter`] subscriber.
    pub fn without_log_writer(mut self) -> Self {
        self.log_writer = false;
        self
    }

    /// Builds the service.
    ///
    /// Creates the event bus and spawns the subscriber workers and the bus
    /// forwarder, so it must be called from within a tokio runtime.
    pub fn build(self) -> Service {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());

        let mut subs: Vec<Arc<dyn Subscribe>> = Vec::with_capacity(self.subscribers.len() + 1);
        if self.log_writer {
            subs.push(Arc::new(LogWriter::new()));
        }
        subs.extend(self.subscribers);

        Service::new_internal(self.cfg, bus, SubscriberSet::new(subs))
    }
}
