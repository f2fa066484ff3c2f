//! # Worker: the execution loop bound to one runner.
//!
//! ```text
//! start_new_worker() ──► count in ──► spawn Worker::run()
//!
//! sleep(start delay = 1s + init_delay + random[0, jitter])
//! loop {
//!   ├─► work.spawn(token) (panics caught)
//!   │     └─ Err ──► publish WorkerFailed (never fatal)
//!   ├─► runner stopping?
//!   │     ├─ yes ──► park (count out) ──► sleep(max_cleanup) ──► exit
//!   │     └─ no  ──► sleep(worker_sleep) ──► continue
//! }
//! ```
//!
//! ## Rules
//! - The stopping flag is checked only **after** an invocation; sleeps are
//!   never interrupted.
//! - Parking happens exactly once per worker.
//! - After parking, the task stays alive for the full cleanup window and
//!   then ends.

use std::{panic::AssertUnwindSafe, sync::Arc, time::Duration};

use futures::FutureExt;
use tokio::time;

use crate::{
    core::runner::Runner,
    error::{WorkError, panic_info},
    events::{Event, EventKind},
    work::WorkRef,
};

/// One worker of a [`Runner`].
pub(crate) struct Worker {
    id: u64,
    runner: Arc<Runner>,
    work: WorkRef,
}

impl Worker {
    pub(crate) fn new(id: u64, runner: Arc<Runner>, work: WorkRef) -> Self {
        Self { id, runner, work }
    }

    /// Runs the worker until it parks.
    pub(crate) async fn run(self) {
        let cfg = self.runner.config();
        let delay = cfg.start_delay().sample();
        self.publish(Event::new(EventKind::WorkerScheduled).with_delay(delay));
        time::sleep(delay).await;
        self.publish(Event::new(EventKind::WorkerStarted));

        loop {
            if let Err(e) = self.run_once().await {
                if e.is_reportable() {
                    self.publish(Event::new(EventKind::WorkerFailed).with_reason(e.to_string()));
                }
            }

            if self.runner.is_stopping() {
                let remaining = self.runner.park_worker();
                self.publish(Event::new(EventKind::WorkerParked).with_workers(remaining));
                time::sleep(cfg.max_cleanup).await;
                break;
            }
            pause(cfg.worker_sleep).await;
        }
    }

    /// Invokes the work function once, turning a panic into [`WorkError::Panicked`].
    ///
    /// Both `spawn` and the future it returns run under the unwind guard.
    async fn run_once(&self) -> Result<(), WorkError> {
        let ctx = self.runner.token().clone();
        let invocation = async { self.work.spawn(ctx).await };
        match AssertUnwindSafe(invocation).catch_unwind().await {
            Ok(res) => res,
            Err(payload) => Err(WorkError::Panicked {
                info: panic_info(payload.as_ref()),
            }),
        }
    }

    fn publish(&self, ev: Event) {
        let ev = ev
            .with_source(self.runner.full_name())
            .with_worker(self.id);
        self.runner.bus().publish(ev);
    }
}

/// Inter-run sleep; a zero sleep still yields to the scheduler.
async fn pause(d: Duration) {
    if d.is_zero() {
        tokio::task::yield_now().await;
    } else {
        time::sleep(d).await;
    }
}
