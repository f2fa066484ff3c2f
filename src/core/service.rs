//! # Service: process-wide owner of runners and the shutdown sequence.
//!
//! The [`Service`] owns the event bus, the forwarder feeding the
//! [`SubscriberSet`](crate::SubscriberSet), the ordered list of installed
//! [`Runner`]s and the interrupt listeners. One instance per process is a
//! caller contract.
//!
//! ## Lifecycle
//! ```text
//! Initializing: Service::new ─► Runner::new(&mut service, ..) ─► start_new_worker(..)
//!                               add_interrupt_listener(..)
//! Running:      run_until(signal, cleanup)
//!                 ├─► runners installed but 0 workers? ─► StartupRejected, Err(NoWorkers)
//!                 └─► await signal
//! ShuttingDown:   ├─► publish ShutdownRequested
//!                 ├─► spawn every interrupt listener (not awaited)
//!                 ├─► runner[n-1].stop().await ... runner[0].stop().await   (LIFO, sequential)
//!                 └─► cleanup()
//! Terminated:     publish ServiceTerminated ─► drain subscribers ─► Ok / Err(Shutdown{failures})
//! ```
//!
//! ## Rules
//! - Runners are stopped strictly in reverse creation order, one at a time.
//! - Listener completion is never awaited; each runs on a detached thread.
//! - Every failed step is kept, in order, in [`ServiceError::Shutdown`].
//! - A runner the host already stopped (`AlreadyStopping`) is not a failure.

use std::{error::Error, future::Future, io, sync::Arc, thread};

use tokio::{sync::broadcast::error::RecvError, task::JoinHandle};

use crate::{
    config::ServiceConfig,
    core::{
        builder::ServiceBuilder,
        runner::Runner,
        shutdown::{self, ShutdownSignal},
    },
    error::{ServiceError, ShutdownFailure},
    events::{Bus, Event, EventKind},
    subscribers::SubscriberSet,
};

/// Callback fired once when shutdown begins.
pub type InterruptListener = Box<dyn FnOnce() + Send + 'static>;

/// Process-wide supervisor of runners.
pub struct Service {
    full_name: Arc<str>,
    bus: Bus,
    forwarder: Option<JoinHandle<()>>,
    runners: Vec<Arc<Runner>>,
    listeners: Vec<InterruptListener>,
}

impl Service {
    /// Creates a service with the default [`LogWriter`](crate::LogWriter) subscriber.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(cfg: ServiceConfig) -> Self {
        ServiceBuilder::new(cfg).build()
    }

    /// Returns a builder for a service with custom subscribers.
    pub fn builder(cfg: ServiceConfig) -> ServiceBuilder {
        ServiceBuilder::new(cfg)
    }

    pub(crate) fn new_internal(cfg: ServiceConfig, bus: Bus, subs: SubscriberSet) -> Self {
        let forwarder = spawn_forwarder(&bus, subs);
        Self {
            full_name: Arc::from(cfg.full_name()),
            bus,
            forwarder: Some(forwarder),
            runners: Vec::new(),
            listeners: Vec::new(),
        }
    }

    /// Registers a callback fired, without waiting for it, when shutdown begins.
    ///
    /// Each listener runs on its own detached thread, in no particular order.
    pub fn add_interrupt_listener<F>(&mut self, listener: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    pub(crate) fn install_runner(&mut self, runner: Arc<Runner>) {
        self.runners.push(runner);
    }

    /// Installed runners, in creation order.
    pub fn runners(&self) -> &[Arc<Runner>] {
        &self.runners
    }

    /// Active workers across all installed runners.
    pub fn total_workers(&self) -> usize {
        self.runners.iter().map(|r| r.active_workers()).sum()
    }

    /// Event bus shared with every runner of this service.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Log prefix of this service: `<name>-service`.
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Runs until SIGINT/SIGTERM, then shuts down without a cleanup step.
    pub async fn run(self) -> Result<(), ServiceError> {
        self.run_with_cleanup(|| Ok::<(), std::convert::Infallible>(()))
            .await
    }

    /// Runs until SIGINT/SIGTERM, then shuts down and calls `cleanup`.
    pub async fn run_with_cleanup<F, E>(self, cleanup: F) -> Result<(), ServiceError>
    where
        F: FnOnce() -> Result<(), E>,
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        self.run_until(shutdown::wait_for_shutdown_signal(), cleanup)
            .await
    }

    /// Like [`run_with_cleanup`](Self::run_with_cleanup), then exits the process.
    ///
    /// Exit status is 0 on a clean shutdown and 1 otherwise. Never returns.
    pub async fn run_and_exit<F, E>(self, cleanup: F)
    where
        F: FnOnce() -> Result<(), E>,
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        let code = match self.run_with_cleanup(cleanup).await {
            Ok(()) => 0,
            Err(e) => e.exit_code(),
        };
        std::process::exit(code)
    }

    /// Runs until `signal` resolves, then performs the shutdown sequence.
    ///
    /// `signal` stands in for the OS termination notification; it is awaited
    /// exactly once, and only after the startup check passed.
    pub async fn run_until<S, F, E>(mut self, signal: S, cleanup: F) -> Result<(), ServiceError>
    where
        S: Future<Output = io::Result<ShutdownSignal>>,
        F: FnOnce() -> Result<(), E>,
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        if let Err(e) = self.check_workers() {
            return self.terminate(Err(e)).await;
        }

        let received = match signal.await {
            Ok(received) => received,
            Err(e) => return self.terminate(Err(ServiceError::Signal(e))).await,
        };

        let failures = self.shutdown(received, cleanup).await;
        if failures.is_empty() {
            self.terminate(Ok(())).await
        } else {
            self.terminate(Err(ServiceError::Shutdown { failures }))
                .await
        }
    }

    /// Fails when runners are installed but none of them has a worker.
    fn check_workers(&self) -> Result<(), ServiceError> {
        if self.runners.is_empty() || self.total_workers() > 0 {
            return Ok(());
        }
        let runners = self.runners.len();
        self.bus.publish(
            Event::new(EventKind::StartupRejected)
                .with_source(self.full_name.clone())
                .with_runners(runners),
        );
        Err(ServiceError::NoWorkers { runners })
    }

    async fn shutdown<F, E>(&mut self, received: ShutdownSignal, cleanup: F) -> Vec<ShutdownFailure>
    where
        F: FnOnce() -> Result<(), E>,
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        self.bus.publish(
            Event::new(EventKind::ShutdownRequested)
                .with_source(self.full_name.clone())
                .with_reason(received.to_string())
                .with_listeners(self.listeners.len())
                .with_runners(self.runners.len()),
        );

        for (i, listener) in self.listeners.drain(..).enumerate() {
            fire_listener(&self.full_name, i, listener);
        }

        let mut failures = Vec::new();
        for runner in self.runners.iter().rev() {
            if let Err(e) = runner.stop().await {
                if e.is_shutdown_failure() {
                    failures.push(ShutdownFailure::Runner(e));
                }
            }
        }

        if let Err(e) = cleanup() {
            let error = e.into().to_string();
            self.bus.publish(
                Event::new(EventKind::CleanupFailed)
                    .with_source(self.full_name.clone())
                    .with_reason(error.clone()),
            );
            failures.push(ShutdownFailure::Cleanup { error });
        }
        failures
    }

    /// Publishes the final event and waits until every subscriber has seen it.
    async fn terminate(
        &mut self,
        outcome: Result<(), ServiceError>,
    ) -> Result<(), ServiceError> {
        let mut ev = Event::new(EventKind::ServiceTerminated).with_source(self.full_name.clone());
        if let Err(e) = &outcome {
            ev = ev.with_reason(e.to_string());
        }
        self.bus.publish(ev);

        if let Some(forwarder) = self.forwarder.take() {
            let _ = forwarder.await;
        }
        outcome
    }
}

/// Runs `listener` on its own detached thread.
///
/// Detached threads do not hold the tokio runtime open, so a slow listener
/// cannot delay runtime teardown after `run_until` returns.
fn fire_listener(service: &str, index: usize, listener: InterruptListener) {
    let spawned = thread::Builder::new()
        .name(format!("{service}-listener-{index}"))
        .spawn(listener);
    if let Err(e) = spawned {
        tracing::error!("{service}: cannot start interrupt listener {index}: {e}");
    }
}

/// Forwards bus events to the subscriber set until the service terminates.
fn spawn_forwarder(bus: &Bus, subs: SubscriberSet) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(ev) => {
                    let last = ev.kind == EventKind::ServiceTerminated;
                    subs.deliver(ev).await;
                    if last {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event forwarder lagged behind the bus");
                }
                Err(RecvError::Closed) => break,
            }
        }
        subs.close().await;
    })
}
