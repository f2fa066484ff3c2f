//! Runtime core: runners, workers and the service.
//!
//! The public API from this module is [`Service`] (with [`ServiceBuilder`])
//! and [`Runner`], plus the OS signal helper.
//!
//! Internal modules:
//! - [`runner`]: pool of identical workers with cooperative stop;
//! - [`worker`]: the per-worker run/sleep loop;
//! - [`latch`]: countdown latch used by `Runner::stop`;
//! - [`service`]: owns runners and performs the LIFO shutdown sequence;
//! - [`shutdown`]: cross-platform shutdown signal handling.

mod builder;
mod latch;
mod runner;
mod service;
mod shutdown;
mod worker;

pub use builder::ServiceBuilder;
pub use runner::Runner;
pub use service::{InterruptListener, Service};
pub use shutdown::{ShutdownSignal, wait_for_shutdown_signal};
