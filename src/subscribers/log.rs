//! # LogWriter - event to log line renderer
//!
//! Renders incoming [`Event`]s as free-text lines through [`tracing`], each
//! prefixed with the emitting component. Installed by default on every
//! [`Service`](crate::Service).
//!
//! ## Example output
//! ```text
//! db-runner: starting new worker 1 in 12.4s
//! db-runner: new worker 1 started
//! db-runner: worker 1 failed: connection refused
//! api-service: received SIGTERM signal, alerting 1 interrupt listener(s) and stopping 2 runner(s)
//! db-runner: stopping runner, waiting for 3 worker(s) to park
//! db-runner: worker 1 parked, 2 remaining
//! db-runner: all workers parked
//! api-service: terminating service
//! ```
//!
//! Levels: lifecycle lines are `info`, work failures `warn`, stop timeouts,
//! cleanup failures and the startup check `error`.

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let src = e.source.as_deref().unwrap_or("runvisor");
        let worker = e.worker.unwrap_or_default();
        let reason = e.reason.as_deref().unwrap_or("unknown");

        match e.kind {
            EventKind::WorkerScheduled => {
                tracing::info!(
                    "{src}: starting new worker {worker} in {:?}",
                    e.delay().unwrap_or_default()
                );
            }
            EventKind::WorkerStarted => {
                tracing::info!("{src}: new worker {worker} started");
            }
            EventKind::WorkerFailed => {
                tracing::warn!("{src}: worker {worker} failed: {reason}");
            }
            EventKind::WorkerParked => {
                tracing::info!(
                    "{src}: worker {worker} parked, {} remaining",
                    e.workers.unwrap_or_default()
                );
            }
            EventKind::RunnerMessage => {
                tracing::info!("{src}: {reason}");
            }
            EventKind::RunnerStopping => {
                tracing::info!(
                    "{src}: stopping runner, waiting for {} worker(s) to park",
                    e.workers.unwrap_or_default()
                );
            }
            EventKind::RunnerStopped => {
                tracing::info!("{src}: all workers parked");
            }
            EventKind::RunnerStopTimeout => {
                tracing::error!(
                    "{src}: error stopping runner, {} worker(s) did not park within {:?}",
                    e.workers.unwrap_or_default(),
                    e.timeout().unwrap_or_default()
                );
            }
            EventKind::RunnerStopIgnored => {
                tracing::warn!(
                    "{src}: runner is already in the process of stopping, stop request ignored"
                );
            }
            EventKind::StartupRejected => {
                tracing::error!(
                    "{src}: cannot run service: 0 workers were found across {} runner(s)",
                    e.runners.unwrap_or_default()
                );
            }
            EventKind::ShutdownRequested => {
                tracing::info!(
                    "{src}: received {reason} signal, alerting {} interrupt listener(s) and stopping {} runner(s)",
                    e.listeners.unwrap_or_default(),
                    e.runners.unwrap_or_default()
                );
            }
            EventKind::CleanupFailed => {
                tracing::error!("{src}: cleanup failed: {reason}");
            }
            EventKind::ServiceTerminated => match e.reason.as_deref() {
                Some(failures) => tracing::error!("{src}: terminating service: {failures}"),
                None => tracing::info!("{src}: terminating service"),
            },
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}

#[cfg(test)]
mod tests {
    use std::{
        io,
        sync::{
            Arc, Mutex,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    };

    use tokio_util::sync::CancellationToken;

    use crate::{Runner, RunnerConfig, Service, ServiceConfig, ShutdownSignal, WorkError, WorkFn};

    /// In-memory sink for the fmt layer.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_renders_prefixed_lines_for_a_full_run() {
        let out = Captured::default();
        let sink = out.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || sink.clone())
            .with_ansi(false)
            .without_time()
            .with_target(false)
            .with_max_level(tracing::Level::INFO)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let mut service = Service::new(ServiceConfig::new("api"));
        let runner = Runner::new(
            &mut service,
            RunnerConfig::new("boom").with_worker_sleep(Duration::from_millis(100)),
        );
        let calls = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&calls);
        runner.start_new_worker(WorkFn::arc(move |_ctx: CancellationToken| {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err(WorkError::fail("boom"))
            }
        }));

        let res = service
            .run_until(
                async {
                    tokio::time::sleep(Duration::from_millis(1550)).await;
                    Ok(ShutdownSignal::Terminate)
                },
                || Ok::<(), io::Error>(()),
            )
            .await;
        assert!(res.is_ok());

        let text = out.text();
        let n = calls.load(Ordering::SeqCst);
        assert!(n >= 5, "only {n} runs");
        assert_eq!(text.matches("boom-runner: worker 1 failed: boom").count(), n);
        assert!(text.contains("boom-runner: new worker 1 started"));
        assert!(text.contains(
            "api-service: received SIGTERM signal, alerting 0 interrupt listener(s) and stopping 1 runner(s)"
        ));
        assert!(text.contains("boom-runner: all workers parked"));
        assert!(text.contains("api-service: terminating service"));
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            assert!(
                line.contains("-runner: ") || line.contains("-service: "),
                "unprefixed line: {line}"
            );
        }
    }
}
