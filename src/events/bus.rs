//! # Event bus shared by a service and its runners.
//!
//! ```text
//!   Worker 1 ──┐
//!   Worker N ──┼──► Bus (broadcast) ──► Service forwarder ──► SubscriberSet
//!   Runner   ──┤
//!   Service  ──┘
//! ```
//!
//! Publishing never blocks and never fails. Events sent while nobody listens
//! are dropped. The ring buffer is shared by all receivers; a receiver that
//! falls more than `capacity` events behind gets `RecvError::Lagged(n)` and
//! resumes from the oldest retained event.

use tokio::sync::broadcast;

use super::event::Event;

/// Cloneable handle to the runtime event channel.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a bus retaining at most `capacity` events (at least 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Sends `ev` to every current receiver.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Returns a receiver for events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}
