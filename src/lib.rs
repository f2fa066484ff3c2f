//! # runvisor
//!
//! **Runvisor** is a process-lifetime harness for long-running services that
//! run periodically repeating background workers grouped into named runners.
//!
//! Its job is bounded, ordered shutdown: when the process receives a
//! termination signal, every runner is asked to stop in reverse creation
//! order, each stop waits at most the runner's cleanup window, and the
//! process exits with a status reflecting whether any step failed.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │   Runner r0  │   │   Runner r1  │   │   Runner r2  │
//!     │  (N workers) │   │  (N workers) │   │  (N workers) │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            │ install          │ install          │ install
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Service (process-wide)                                           │
//! │  - runners in creation order                                      │
//! │  - interrupt listeners                                            │
//! │  - Bus (broadcast events) ─► forwarder ─► SubscriberSet           │
//! └───────────────────────────────┬───────────────────────────────────┘
//!                                 ▼
//!                     SIGINT / SIGTERM received
//!                                 │
//!       ┌─────────────────────────┼────────────────────────────┐
//!       ▼                         ▼                            ▼
//!  spawn listeners      r2.stop() ─► r1.stop() ─► r0.stop()   cleanup()
//!  (not awaited)        (sequential, each bounded)            (last)
//! ```
//!
//! ### Worker lifecycle
//! ```text
//! start_new_worker(work) ──► active += 1 (synchronously)
//!
//! sleep(1s + init_delay + random[0, jitter])
//! loop {
//!   ├─► work.spawn(token)      errors are logged, never fatal
//!   ├─► stopping?
//!   │     ├─ yes ─► active -= 1 ─► sleep(max_cleanup) ─► exit
//!   │     └─ no  ─► sleep(worker_sleep) ─► continue
//! }
//! ```
//!
//! ## Features
//! | Area              | Description                                                 | Key types / traits                  |
//! |-------------------|-------------------------------------------------------------|-------------------------------------|
//! | **Runners**       | Pools of identical workers with a bounded, one-shot stop.   | [`Runner`], [`RunnerConfig`]        |
//! | **Service**       | Signal wait, LIFO shutdown, listeners, cleanup, exit code.  | [`Service`], [`ServiceBuilder`]     |
//! | **Work**          | Repeatable units of work as trait objects or closures.      | [`Work`], [`WorkFn`], [`WorkRef`]   |
//! | **Subscriber API**| Hook into lifecycle events (logging, metrics, custom).      | [`Subscribe`], [`LogWriter`]        |
//! | **Errors**        | Typed errors for work, runners and the service.             | [`WorkError`], [`ServiceError`]     |
//!
//! ## Example
//! ```rust,no_run
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use runvisor::{Runner, RunnerConfig, Service, ServiceConfig, WorkError, WorkFn};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut service = Service::new(ServiceConfig::new("api"));
//!
//!     let cfg = RunnerConfig::new("poller")
//!         .with_init_delay(Duration::from_secs(2), Duration::from_secs(3))
//!         .with_worker_sleep(Duration::from_secs(1));
//!     let poller = Runner::new(&mut service, cfg);
//!
//!     for _ in 0..4 {
//!         let runner = poller.clone();
//!         poller.start_new_worker(WorkFn::arc(move |_ctx: CancellationToken| {
//!             let runner = runner.clone();
//!             async move {
//!                 runner.log("polling");
//!                 Ok::<_, WorkError>(())
//!             }
//!         }));
//!     }
//!
//!     service.add_interrupt_listener(|| eprintln!("shutting down"));
//!     service.run_and_exit(|| Ok::<(), std::io::Error>(())).await;
//! }
//! ```
mod config;
mod core;
mod error;
mod events;
mod policies;
mod subscribers;
mod work;

// ---- Public re-exports ----

pub use config::{RunnerConfig, ServiceConfig};
pub use crate::core::{
    InterruptListener, Runner, Service, ServiceBuilder, ShutdownSignal, wait_for_shutdown_signal,
};
pub use error::{RunnerError, ServiceError, ShutdownFailure, WorkError};
pub use events::{Bus, Event, EventKind};
pub use policies::{BASE_START_DELAY, StartDelay};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
pub use work::{BoxWorkFuture, Work, WorkFn, WorkRef};
