//! Event subscribers.
//!
//! ## Architecture
//! ```text
//! Bus ──► Service forwarder ──► SubscriberSet::deliver(Event)
//!                                  ├──► [lane] ─► LogWriter   (tracing output)
//!                                  └──► [lane] ─► custom Subscribe impls
//! ```
//!
//! ## Contents
//! - [`Subscribe`] extension trait
//! - [`SubscriberSet`] lossless fan-out with one bounded lane per subscriber
//! - [`LogWriter`] renders events as `<name>-runner: ...` log lines via `tracing`

mod log;
mod set;
mod subscribe;

pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
