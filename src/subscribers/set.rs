//! # SubscriberSet: one delivery lane per subscriber.
//!
//! ```text
//! Service forwarder ──deliver(ev)──┬──► [lane: LogWriter] ─► on_event()
//!                                  └──► [lane: custom]    ─► on_event()
//! ```
//!
//! ## Rules
//! - `deliver` waits for lane space instead of dropping, so every event the
//!   forwarder receives reaches every subscriber. A slow subscriber slows the
//!   forwarder down; if it falls behind the bus, the forwarder logs the lag.
//! - A lane hands events to its subscriber in publish order.
//! - A panicking `on_event` is logged and the lane keeps going.
//! - `close` returns only after every lane handled what was queued.

use std::{panic::AssertUnwindSafe, sync::Arc};

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::{error::panic_info, events::Event};

use super::Subscribe;

/// Queue and task feeding a single subscriber.
struct Lane {
    name: &'static str,
    tx: mpsc::Sender<Arc<Event>>,
    task: JoinHandle<()>,
}

impl Lane {
    fn spawn(sub: Arc<dyn Subscribe>) -> Self {
        let name = sub.name();
        let (tx, rx) = mpsc::channel(sub.queue_capacity().max(1));
        let task = tokio::spawn(run_lane(sub, rx));
        Self { name, tx, task }
    }
}

async fn run_lane(sub: Arc<dyn Subscribe>, mut rx: mpsc::Receiver<Arc<Event>>) {
    while let Some(ev) = rx.recv().await {
        if let Err(payload) = AssertUnwindSafe(sub.on_event(&ev)).catch_unwind().await {
            tracing::error!(
                subscriber = sub.name(),
                "subscriber panicked: {}",
                panic_info(payload.as_ref())
            );
        }
    }
}

/// Lossless fan-out of service events to the installed subscribers.
pub struct SubscriberSet {
    lanes: Vec<Lane>,
}

impl SubscriberSet {
    /// Spawns one lane per subscriber.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>) -> Self {
        Self {
            lanes: subs.into_iter().map(Lane::spawn).collect(),
        }
    }

    /// Queues `ev` on every lane, waiting while a lane is full.
    pub async fn deliver(&self, ev: Event) {
        let ev = Arc::new(ev);
        for lane in &self.lanes {
            if lane.tx.send(Arc::clone(&ev)).await.is_err() {
                tracing::warn!(subscriber = lane.name, "subscriber lane closed, event dropped");
            }
        }
    }

    /// Closes every lane and waits until queued events are handled.
    pub async fn close(self) {
        for Lane { name, tx, task } in self.lanes {
            drop(tx);
            if let Err(e) = task.await {
                tracing::error!(subscriber = name, "subscriber lane failed: {e}");
            }
        }
    }
}
