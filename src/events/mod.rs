//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to runtime events emitted by runners, workers and the
//! service.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Runner`, worker loops, `Service`.
//! - **Consumers**: the service forwarder (fans out to `SubscriberSet`), and
//!   anyone holding [`Service::bus`](crate::Service::bus).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
