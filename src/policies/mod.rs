//! Scheduling policies.
//!
//! ## Contents
//! - [`StartDelay`] how long a new worker waits before its first run
//!   (baseline + initial delay + per-worker jitter)
//!
//! ## Quick wiring
//! ```text
//! RunnerConfig { init_delay, init_delay_jitter, .. }
//!      └─► RunnerConfig::start_delay() ─► StartDelay
//!           └─► core::worker::Worker samples it once per worker
//! ```

mod start_delay;

pub use start_delay::{BASE_START_DELAY, StartDelay};
