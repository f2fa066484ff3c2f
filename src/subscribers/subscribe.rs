//! # Subscribe: hook for custom event consumers.
//!
//! Every subscriber gets its own lane in the
//! [`SubscriberSet`](crate::subscribers::SubscriberSet): a bounded queue and a
//! task calling [`Subscribe::on_event`] for each event in publish order.
//! Runners and workers never wait on subscribers. The service forwarder does
//! wait when a lane is full, so events are delayed rather than lost.
//!
//! ```rust
//! use async_trait::async_trait;
//! use runvisor::{Event, EventKind, Subscribe};
//!
//! struct Alerts;
//!
//! #[async_trait]
//! impl Subscribe for Alerts {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::RunnerStopTimeout {
//!             // page someone...
//!         }
//!     }
//!     fn name(&self) -> &'static str { "alerts" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Consumer of service events.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles one event. A panic here is logged and the next event still arrives.
    async fn on_event(&self, event: &Event);

    /// Name used in the service's own log lines about this subscriber.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Bound of this subscriber's lane; delivery waits while it is full.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
