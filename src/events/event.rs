//! # Runtime events emitted by runners, workers and the service.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Worker events**: one worker's schedule (scheduled, started, failed, parked)
//! - **Runner events**: stop requests and their outcome
//! - **Service events**: startup check, signal handling, cleanup, termination
//!
//! The [`Event`] struct carries the emitting component (`source`, already in
//! `<name>-runner` / `<name>-service` form) plus optional metadata.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use runvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::WorkerFailed)
//!     .with_source("db-runner")
//!     .with_worker(3)
//!     .with_reason("boom");
//!
//! assert_eq!(ev.kind, EventKind::WorkerFailed);
//! assert_eq!(ev.source.as_deref(), Some("db-runner"));
//! assert_eq!(ev.reason.as_deref(), Some("boom"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Worker events ===
    /// Worker was counted and will start after its start delay.
    ///
    /// Sets: `source`, `worker`, `delay_ms`
    WorkerScheduled,

    /// Worker finished its start delay and begins looping.
    ///
    /// Sets: `source`, `worker`
    WorkerStarted,

    /// Work function returned an error (or panicked); the loop continues.
    ///
    /// Sets: `source`, `worker`, `reason`
    WorkerFailed,

    /// Worker observed the stopping flag and left the active count.
    ///
    /// Sets: `source`, `worker`, `workers` (remaining active)
    WorkerParked,

    /// Free-text line emitted by application code via [`Runner::log`](crate::Runner::log).
    ///
    /// Sets: `source`, `reason`
    RunnerMessage,

    // === Runner events ===
    /// Runner switched to stopping and waits for its workers.
    ///
    /// Sets: `source`, `workers` (active at the time), `timeout_ms`
    RunnerStopping,

    /// Every worker parked within the cleanup window.
    ///
    /// Sets: `source`
    RunnerStopped,

    /// Cleanup window elapsed with workers still active.
    ///
    /// Sets: `source`, `workers` (still active), `timeout_ms`
    RunnerStopTimeout,

    /// Duplicate stop request ignored.
    ///
    /// Sets: `source`
    RunnerStopIgnored,

    // === Service events ===
    /// Runners are installed but no worker was started; the service refuses to run.
    ///
    /// Sets: `source`, `runners`
    StartupRejected,

    /// Termination signal received; shutdown begins.
    ///
    /// Sets: `source`, `reason` (signal name), `listeners`, `runners`
    ShutdownRequested,

    /// Cleanup function failed.
    ///
    /// Sets: `source`, `reason`
    CleanupFailed,

    /// Last event of a service run; the event pipeline drains after it.
    ///
    /// Sets: `source`, `reason` (failure summary, if any)
    ServiceTerminated,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Emitting component (`<name>-runner`, `<name>-service` or subscriber name).
    pub source: Option<Arc<str>>,
    /// Worker number within its runner (starting from 1).
    pub worker: Option<u64>,
    /// Worker count (active, remaining, ...), depending on kind.
    pub workers: Option<usize>,
    /// Number of installed runners.
    pub runners: Option<usize>,
    /// Number of registered interrupt listeners.
    pub listeners: Option<usize>,
    /// Delay in milliseconds (compact).
    pub delay_ms: Option<u64>,
    /// Timeout in milliseconds (compact).
    pub timeout_ms: Option<u64>,
    /// Human-readable reason (errors, messages, signal names, ...).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            source: None,
            worker: None,
            workers: None,
            runners: None,
            listeners: None,
            delay_ms: None,
            timeout_ms: None,
            reason: None,
        }
    }

    /// Attaches the emitting component.
    #[inline]
    pub fn with_source(mut self, source: impl Into<Arc<str>>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Attaches a worker number.
    #[inline]
    pub fn with_worker(mut self, id: u64) -> Self {
        self.worker = Some(id);
        self
    }

    /// Attaches a worker count.
    #[inline]
    pub fn with_workers(mut self, n: usize) -> Self {
        self.workers = Some(n);
        self
    }

    /// Attaches a runner count.
    #[inline]
    pub fn with_runners(mut self, n: usize) -> Self {
        self.runners = Some(n);
        self
    }

    /// Attaches a listener count.
    #[inline]
    pub fn with_listeners(mut self, n: usize) -> Self {
        self.listeners = Some(n);
        self
    }

    /// Attaches a delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay_ms = Some(millis(d));
        self
    }

    /// Attaches a timeout (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        self.timeout_ms = Some(millis(d));
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Delay as a [`Duration`], if set.
    pub fn delay(&self) -> Option<Duration> {
        self.delay_ms.map(Duration::from_millis)
    }

    /// Timeout as a [`Duration`], if set.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

fn millis(d: Duration) -> u64 {
    d.as_millis().min(u128::from(u64::MAX)) as u64
}
