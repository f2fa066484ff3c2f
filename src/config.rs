//! # Runner and service configuration.
//!
//! Provides [`RunnerConfig`] (one per [`Runner`](crate::Runner)) and
//! [`ServiceConfig`] (one per [`Service`](crate::Service)).
//!
//! Both are supplied directly by the hosting program; nothing here reads files
//! or environment variables.
//!
//! ## Tuning `max_cleanup`
//! A draining worker finishes its current start delay, work invocation and
//! inter-run sleep before it parks. Keep `max_cleanup` above
//! `1s + init_delay + init_delay_jitter + max(work time) + worker_sleep`.

use std::{sync::Arc, time::Duration};

use crate::policies::StartDelay;

/// Immutable schedule and shutdown settings of one runner.
///
/// ## Field semantics
/// - `name`: used in log prefixes as `<name>-runner`
/// - `init_delay`: fixed delay added to the 1s baseline before a worker first runs
/// - `init_delay_jitter`: upper bound of a uniform random addition to the start delay
/// - `max_cleanup`: longest `stop` may wait for workers to park
/// - `worker_sleep`: pause between two invocations of the work function
#[derive(Clone, Debug)]
pub struct RunnerConfig {
    /// Runner name.
    pub name: Arc<str>,
    /// Initial delay before a worker starts (on top of the 1s baseline).
    pub init_delay: Duration,
    /// Jitter bound added to the initial delay.
    pub init_delay_jitter: Duration,
    /// Maximum time workers get to park once the runner is stopping.
    pub max_cleanup: Duration,
    /// Sleep between two runs of the work function.
    pub worker_sleep: Duration,
}

impl RunnerConfig {
    /// Creates a config with the given name and default timings.
    ///
    /// - `init_delay = 0s`
    /// - `init_delay_jitter = 0s`
    /// - `max_cleanup = 30s`
    /// - `worker_sleep = 0s`
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            init_delay: Duration::ZERO,
            init_delay_jitter: Duration::ZERO,
            max_cleanup: Duration::from_secs(30),
            worker_sleep: Duration::ZERO,
        }
    }

    /// Returns a config with updated initial delay and jitter bound.
    pub fn with_init_delay(mut self, delay: Duration, jitter: Duration) -> Self {
        self.init_delay = delay;
        self.init_delay_jitter = jitter;
        self
    }

    /// Returns a config with updated maximum cleanup duration.
    pub fn with_max_cleanup(mut self, max_cleanup: Duration) -> Self {
        self.max_cleanup = max_cleanup;
        self
    }

    /// Returns a config with updated inter-run sleep.
    pub fn with_worker_sleep(mut self, sleep: Duration) -> Self {
        self.worker_sleep = sleep;
        self
    }

    /// Start delay policy derived from `init_delay` and `init_delay_jitter`.
    #[inline]
    pub fn start_delay(&self) -> StartDelay {
        StartDelay::new(self.init_delay, self.init_delay_jitter)
    }

    /// Log prefix of the runner: `<name>-runner`.
    pub fn full_name(&self) -> String {
        format!("{}-runner", self.name)
    }
}

/// Settings of the process-wide service.
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    /// Service name, used in log prefixes as `<name>-service`.
    pub name: Arc<str>,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow subscribers that lag behind more than `bus_capacity` events skip
    /// older items. Minimum value is 1.
    pub bus_capacity: usize,
}

impl ServiceConfig {
    /// Creates a config with the given name and the default bus capacity.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Log prefix of the service: `<name>-service`.
    pub fn full_name(&self) -> String {
        format!("{}-service", self.name)
    }
}

impl Default for ServiceConfig {
    /// - `name = "runvisor"`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            name: Arc::from("runvisor"),
            bus_capacity: 1024,
        }
    }
}
