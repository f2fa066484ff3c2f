//! # Example: example_runner
//!
//! A service with many runners doing random busy work.
//!
//! Shows how to:
//! - Wrap a [`Runner`] in a domain type with its own work function.
//! - Start 100 runners with one worker each (or one runner with 100 workers).
//! - Let [`Service::run_and_exit`] handle SIGINT/SIGTERM and the exit code.
//!
//! ## Flow
//! ```text
//! main ──► Service::new()
//!      ├─► ExampleRunner::new(&mut service, "r0") .. "r99"
//!      │     └─► start_new_worker() ──► wait 11s..21s ──► busy work 0..4s, sleep 2s, repeat
//!      └─► run_and_exit()
//!            └─► Ctrl-C ──► stop r99 .. r0 (each waits up to 30s) ──► exit(0)
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=info cargo run --example example_runner
//! ```

use std::{sync::Arc, time::Duration};

use rand::Rng;
use runvisor::{Runner, RunnerConfig, Service, ServiceConfig, WorkError, WorkFn};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Performs a unit of random busy work at a fixed periodicity.
struct ExampleRunner {
    runner: Arc<Runner>,
}

impl ExampleRunner {
    fn new(service: &mut Service, id: &str) -> Self {
        let cfg = RunnerConfig::new(format!("Example[{id}]"))
            // 10s..20s before the first run, on top of the 1s baseline.
            .with_init_delay(Duration::from_secs(10), Duration::from_secs(10))
            // Keep above init delay + jitter + longest run + worker sleep (27s).
            .with_max_cleanup(Duration::from_secs(30))
            .with_worker_sleep(Duration::from_secs(2));
        Self {
            runner: Runner::new(service, cfg),
        }
    }

    fn start_new_worker(&self) {
        let runner = Arc::clone(&self.runner);
        self.runner
            .start_new_worker(WorkFn::arc(move |ctx: CancellationToken| {
                busy_work(Arc::clone(&runner), ctx)
            }));
    }
}

async fn busy_work(runner: Arc<Runner>, ctx: CancellationToken) -> Result<(), WorkError> {
    let run_id = Uuid::new_v4();
    let secs = rand::rng().random_range(0..5u64);
    runner.log(format!(
        "starting busy work which will run for {secs} seconds with id {run_id}"
    ));

    tokio::select! {
        _ = tokio::time::sleep(Duration::from_secs(secs)) => Ok(()),
        _ = ctx.cancelled() => {
            runner.log(format!("busy work {run_id} cut short by shutdown"));
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let mut service = Service::new(ServiceConfig::new("example"));

    for i in 0..100 {
        ExampleRunner::new(&mut service, &format!("r{i}")).start_new_worker();
    }
    service.add_interrupt_listener(|| tracing::info!("interrupt received, draining runners"));

    service
        .run_and_exit(|| -> anyhow::Result<()> {
            tracing::info!("all runners stopped, nothing left to clean up");
            Ok(())
        })
        .await;
}
