//! # Runner: a named group of periodic workers with a bounded stop.
//!
//! A [`Runner`] owns one [`RunnerConfig`] and any number of workers started
//! with [`Runner::start_new_worker`]. It tracks two pieces of shared state,
//! both behind one lock: the stopping flag and the active-worker count.
//!
//! ## States
//! ```text
//! Created ──start_new_worker()──► Active ──stop()──► Stopping ──► Stopped
//!                                                        │
//!                                  all workers parked ───┤ (Ok)
//!                                  max_cleanup elapsed ──┘ (StopTimeout)
//! ```
//!
//! ## Rules
//! - The active count is incremented **synchronously** in `start_new_worker`,
//!   before the worker task exists, so an immediate `stop` always sees it.
//! - A worker decrements the count exactly once, when it parks.
//! - The stopping flag only ever goes `false → true`; a second `stop` returns
//!   [`RunnerError::AlreadyStopping`] without waiting.
//! - `stop` never waits longer than `max_cleanup`.
//! - Work functions run outside the lock and cannot touch the counters.

use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError,
    atomic::{AtomicU64, Ordering},
};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{
    config::RunnerConfig,
    core::{latch::CountdownLatch, service::Service, worker::Worker},
    error::{RunnerError, WorkError},
    events::{Bus, Event, EventKind},
    work::WorkRef,
};

/// Shared mutable state of a runner.
#[derive(Debug, Default)]
struct RunnerState {
    /// Monotonic `false → true`.
    stopping: bool,
    /// Workers counted in and not parked yet.
    active: usize,
}

/// Supervisor of a named group of workers sharing one schedule.
///
/// Created with [`Runner::new`], which installs it into the [`Service`].
///
/// ## Example
/// ```no_run
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
/// use runvisor::{Runner, RunnerConfig, Service, ServiceConfig, WorkError, WorkFn};
///
/// # async fn demo() {
/// let mut service = Service::new(ServiceConfig::new("api"));
/// let runner = Runner::new(
///     &mut service,
///     RunnerConfig::new("cache").with_worker_sleep(Duration::from_secs(5)),
/// );
/// runner.start_new_worker(WorkFn::arc(|_ctx: CancellationToken| async {
///     // refresh the cache...
///     Ok::<_, WorkError>(())
/// }));
/// service.run_and_exit(|| Ok::<_, std::io::Error>(())).await;
/// # }
/// ```
#[derive(Debug)]
pub struct Runner {
    cfg: RunnerConfig,
    full_name: Arc<str>,
    bus: Bus,
    state: Mutex<RunnerState>,
    latch: CountdownLatch,
    token: CancellationToken,
    next_worker: AtomicU64,
}

impl Runner {
    /// Creates a runner and installs it into `service`.
    ///
    /// Installation order is shutdown order reversed: the runner created last
    /// is stopped first. The `&mut` borrow keeps creation on the
    /// initialization path.
    pub fn new(service: &mut Service, cfg: RunnerConfig) -> Arc<Self> {
        let runner = Arc::new(Self {
            full_name: Arc::from(cfg.full_name()),
            cfg,
            bus: service.bus().clone(),
            state: Mutex::new(RunnerState::default()),
            latch: CountdownLatch::new(),
            token: CancellationToken::new(),
            next_worker: AtomicU64::new(1),
        });
        service.install_runner(Arc::clone(&runner));
        runner
    }

    /// Starts a new worker repeatedly invoking `work`.
    ///
    /// The worker is counted before this call returns. It then waits its
    /// start delay (see [`StartDelay`](crate::StartDelay)) and loops:
    /// invoke `work`, log any error, park if the runner is stopping,
    /// otherwise sleep `worker_sleep`.
    ///
    /// Must be called from within a tokio runtime. Dropping the returned
    /// handle detaches the worker.
    pub fn start_new_worker(self: &Arc<Self>, work: WorkRef) -> JoinHandle<()> {
        let id = self.next_worker.fetch_add(1, Ordering::Relaxed);
        self.count_new_worker();

        let worker = Worker::new(id, Arc::clone(self), work);
        tokio::spawn(worker.run())
    }

    /// Moves the runner to stopping and waits for its workers to park.
    ///
    /// Returns:
    /// - `Ok(())` once the active count reaches zero;
    /// - [`RunnerError::StopTimeout`] after `max_cleanup` if it did not;
    /// - [`RunnerError::AlreadyStopping`] immediately if a previous call
    ///   already started stopping.
    ///
    /// The runner's [`CancellationToken`] is cancelled as soon as the flag
    /// flips, so cooperative work functions can return early.
    pub async fn stop(&self) -> Result<(), RunnerError> {
        let active = {
            let mut state = self.lock_state();
            if state.stopping {
                drop(state);
                self.bus.publish(
                    Event::new(EventKind::RunnerStopIgnored).with_source(self.full_name.clone()),
                );
                return Err(RunnerError::AlreadyStopping {
                    runner: self.full_name.clone(),
                });
            }
            state.stopping = true;
            state.active
        };
        self.token.cancel();

        let timeout = self.cfg.max_cleanup;
        self.bus.publish(
            Event::new(EventKind::RunnerStopping)
                .with_source(self.full_name.clone())
                .with_workers(active)
                .with_timeout(timeout),
        );

        match self.latch.wait_zero(timeout).await {
            Ok(()) => {
                self.bus.publish(
                    Event::new(EventKind::RunnerStopped).with_source(self.full_name.clone()),
                );
                Ok(())
            }
            Err(remaining) => {
                self.bus.publish(
                    Event::new(EventKind::RunnerStopTimeout)
                        .with_source(self.full_name.clone())
                        .with_workers(remaining)
                        .with_timeout(timeout),
                );
                Err(RunnerError::StopTimeout {
                    runner: self.full_name.clone(),
                    timeout,
                })
            }
        }
    }

    /// Returns `true` once [`stop`](Self::stop) has been called.
    pub fn is_stopping(&self) -> bool {
        self.lock_state().stopping
    }

    /// Number of workers counted in and not parked yet.
    pub fn active_workers(&self) -> usize {
        self.lock_state().active
    }

    /// Runner configuration.
    pub fn config(&self) -> &RunnerConfig {
        &self.cfg
    }

    /// Log prefix of this runner: `<name>-runner`.
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Emits a free-text log line prefixed with this runner's name.
    pub fn log(&self, message: impl Into<Arc<str>>) {
        self.bus.publish(
            Event::new(EventKind::RunnerMessage)
                .with_source(self.full_name.clone())
                .with_reason(message),
        );
    }

    /// Builds a work failure whose message carries this runner's prefix.
    pub fn error(&self, message: impl std::fmt::Display) -> WorkError {
        WorkError::fail(format!("{}: {message}", self.full_name))
    }

    pub(crate) fn bus(&self) -> &Bus {
        &self.bus
    }

    pub(crate) fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Counts a worker in.
    fn count_new_worker(&self) {
        let mut state = self.lock_state();
        state.active += 1;
        self.latch.set(state.active);
    }

    /// Counts a worker out; returns the remaining active count.
    pub(crate) fn park_worker(&self) -> usize {
        let mut state = self.lock_state();
        state.active = state.active.saturating_sub(1);
        self.latch.set(state.active);
        state.active
    }

    // Critical sections never run user code, so a poisoned lock still holds
    // consistent counters.
    fn lock_state(&self) -> MutexGuard<'_, RunnerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        future,
        sync::{
            Mutex as StdMutex,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    };

    use tokio::time::{self, Instant};

    use super::*;
    use crate::{ServiceConfig, WorkFn, test_util::assert_near};

    fn ok_work() -> WorkRef {
        WorkFn::arc(|_ctx: CancellationToken| async { Ok::<_, WorkError>(()) })
    }

    fn stuck_work() -> WorkRef {
        WorkFn::arc(|_ctx: CancellationToken| future::pending::<Result<(), WorkError>>())
    }

    fn drain(rx: &mut tokio::sync::broadcast::Receiver<Event>) -> Vec<Event> {
        let mut out = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            out.push(ev);
        }
        out
    }

    #[tokio::test(start_paused = true)]
    async fn test_count_is_synchronous() {
        let mut service = Service::new(ServiceConfig::new("t"));
        let runner = Runner::new(&mut service, RunnerConfig::new("sync"));

        runner.start_new_worker(ok_work());
        runner.start_new_worker(ok_work());
        assert_eq!(runner.active_workers(), 2);
        assert!(!runner.is_stopping());
        assert_eq!(service.total_workers(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_right_after_start_waits_for_first_run() {
        let mut service = Service::new(ServiceConfig::new("t"));
        let runner = Runner::new(
            &mut service,
            RunnerConfig::new("early").with_max_cleanup(Duration::from_secs(10)),
        );
        let calls = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&calls);
        runner.start_new_worker(WorkFn::arc(move |_ctx: CancellationToken| {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<_, WorkError>(())
            }
        }));

        let start = Instant::now();
        runner.stop().await.unwrap();
        // The worker still finishes its 1s start delay and one invocation.
        assert_near(start.elapsed(), Duration::from_secs(1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(runner.active_workers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_with_zero_sleep_parks_in_flight_worker() {
        let mut service = Service::new(ServiceConfig::new("t"));
        let runner = Runner::new(&mut service, RunnerConfig::new("busy"));
        let looped = Arc::new(tokio::sync::Notify::new());
        let l = Arc::clone(&looped);
        runner.start_new_worker(WorkFn::arc(move |_ctx: CancellationToken| {
            let l = Arc::clone(&l);
            async move {
                l.notify_one();
                Ok::<_, WorkError>(())
            }
        }));

        // A zero-sleep worker never lets paused time advance; wait on the work itself.
        looped.notified().await;
        looped.notified().await;
        assert_eq!(runner.active_workers(), 1);

        runner.stop().await.unwrap();
        assert!(runner.is_stopping());
        assert_eq!(runner.active_workers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_stop_is_ignored() {
        let mut service = Service::new(ServiceConfig::new("t"));
        let runner = Runner::new(&mut service, RunnerConfig::new("twice"));
        let mut rx = service.bus().subscribe();
        runner.start_new_worker(ok_work());

        assert!(runner.stop().await.is_ok());
        let second = runner.stop().await;
        assert!(matches!(
            second,
            Err(RunnerError::AlreadyStopping { ref runner }) if &**runner == "twice-runner"
        ));
        assert_eq!(runner.active_workers(), 0);

        let parked = drain(&mut rx)
            .iter()
            .filter(|e| e.kind == EventKind::WorkerParked)
            .count();
        assert_eq!(parked, 1, "counter must be decremented exactly once");
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_stop_returns_already_stopping() {
        let mut service = Service::new(ServiceConfig::new("t"));
        let runner = Runner::new(&mut service, RunnerConfig::new("race"));
        runner.start_new_worker(ok_work());

        let start = Instant::now();
        let (first, second) = tokio::join!(runner.stop(), async {
            // Give the first stop a chance to flip the flag.
            tokio::task::yield_now().await;
            let res = runner.stop().await;
            (res, start.elapsed())
        });
        assert!(first.is_ok());
        assert!(matches!(second.0, Err(RunnerError::AlreadyStopping { .. })));
        assert_eq!(second.1, Duration::ZERO, "second stop must not wait");
    }

    #[tokio::test(start_paused = true)]
    async fn test_stuck_work_times_out_after_max_cleanup() {
        let mut service = Service::new(ServiceConfig::new("t"));
        let runner = Runner::new(
            &mut service,
            RunnerConfig::new("stuck").with_max_cleanup(Duration::from_secs(5)),
        );
        let mut rx = service.bus().subscribe();
        runner.start_new_worker(stuck_work());
        time::sleep(Duration::from_secs(2)).await;

        let start = Instant::now();
        let res = runner.stop().await;
        assert_near(start.elapsed(), Duration::from_secs(5));
        match res {
            Err(RunnerError::StopTimeout { runner: name, timeout }) => {
                assert_eq!(&*name, "stuck-runner");
                assert_eq!(timeout, Duration::from_secs(5));
            }
            other => panic!("expected StopTimeout, got {other:?}"),
        }
        assert_eq!(runner.active_workers(), 1);

        let timeout_ev = drain(&mut rx)
            .into_iter()
            .find(|e| e.kind == EventKind::RunnerStopTimeout)
            .unwrap();
        assert_eq!(timeout_ev.workers, Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cooperative_work_sees_cancellation() {
        let mut service = Service::new(ServiceConfig::new("t"));
        let runner = Runner::new(
            &mut service,
            RunnerConfig::new("coop").with_max_cleanup(Duration::from_secs(5)),
        );
        // Would block forever without the token.
        runner.start_new_worker(WorkFn::arc(|ctx: CancellationToken| async move {
            ctx.cancelled().await;
            Err(WorkError::Canceled)
        }));
        time::sleep(Duration::from_secs(2)).await;

        let start = Instant::now();
        runner.stop().await.unwrap();
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_run_within_delay_window() {
        let mut service = Service::new(ServiceConfig::new("t"));
        let d = Duration::from_secs(4);
        let j = Duration::from_secs(3);
        let runner = Runner::new(
            &mut service,
            RunnerConfig::new("timed")
                .with_init_delay(d, j)
                .with_worker_sleep(Duration::from_secs(1)),
        );

        let start = Instant::now();
        let mut firsts = Vec::new();
        for _ in 0..8 {
            let first: Arc<StdMutex<Option<Instant>>> = Arc::new(StdMutex::new(None));
            let f = Arc::clone(&first);
            runner.start_new_worker(WorkFn::arc(move |_ctx: CancellationToken| {
                let f = Arc::clone(&f);
                async move {
                    f.lock().unwrap().get_or_insert_with(Instant::now);
                    Ok::<_, WorkError>(())
                }
            }));
            firsts.push(first);
        }

        time::sleep(Duration::from_secs(1) + d + j + Duration::from_secs(1)).await;
        for first in firsts {
            let at = first.lock().unwrap().expect("worker never ran") - start;
            assert!(at >= Duration::from_secs(1) + d, "ran too early: {at:?}");
            assert!(
                at <= Duration::from_secs(1) + d + j + Duration::from_millis(5),
                "ran too late: {at:?}"
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_work_keeps_looping() {
        let mut service = Service::new(ServiceConfig::new("t"));
        let runner = Runner::new(
            &mut service,
            RunnerConfig::new("boom").with_worker_sleep(Duration::from_millis(100)),
        );
        let mut rx = service.bus().subscribe();
        let calls = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&calls);
        runner.start_new_worker(WorkFn::arc(move |_ctx: CancellationToken| {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err(WorkError::fail("boom"))
            }
        }));

        let mut failures = 0;
        for _ in 0..10 {
            time::sleep(Duration::from_millis(550)).await;
            assert_eq!(runner.active_workers(), 1);
            failures += drain(&mut rx)
                .iter()
                .filter(|e| e.kind == EventKind::WorkerFailed)
                .inspect(|e| assert_eq!(e.reason.as_deref(), Some("boom")))
                .count();
        }

        let n = calls.load(Ordering::SeqCst);
        assert!(n >= 10, "only {n} iterations");
        assert_eq!(failures, n);
        assert!(!runner.is_stopping());
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_work_is_contained() {
        let mut service = Service::new(ServiceConfig::new("t"));
        let runner = Runner::new(
            &mut service,
            RunnerConfig::new("panic").with_worker_sleep(Duration::from_millis(100)),
        );
        let mut rx = service.bus().subscribe();
        runner.start_new_worker(WorkFn::arc(|_ctx: CancellationToken| async {
            if true {
                panic!("kaboom");
            }
            Ok::<_, WorkError>(())
        }));

        time::sleep(Duration::from_millis(1350)).await;
        assert_eq!(runner.active_workers(), 1);
        runner.stop().await.unwrap();

        let panics: Vec<Event> = drain(&mut rx)
            .into_iter()
            .filter(|e| e.kind == EventKind::WorkerFailed)
            .collect();
        assert!(panics.len() >= 2);
        assert!(panics[0].reason.as_deref().unwrap().contains("kaboom"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_panic_before_future_is_contained() {
        let mut service = Service::new(ServiceConfig::new("t"));
        let runner = Runner::new(
            &mut service,
            RunnerConfig::new("syncpanic")
                .with_worker_sleep(Duration::from_millis(100))
                .with_max_cleanup(Duration::from_secs(5)),
        );
        let mut rx = service.bus().subscribe();
        let handle = runner.start_new_worker(WorkFn::arc(|_ctx: CancellationToken| {
            if true {
                panic!("sync part");
            }
            async { Ok::<_, WorkError>(()) }
        }));

        time::sleep(Duration::from_secs(2)).await;
        assert!(!handle.is_finished(), "worker task must survive the panic");
        assert_eq!(runner.active_workers(), 1);

        let start = Instant::now();
        runner.stop().await.unwrap();
        assert!(start.elapsed() < Duration::from_secs(1));
        assert_eq!(runner.active_workers(), 0);

        let failed: Vec<Event> = drain(&mut rx)
            .into_iter()
            .filter(|e| e.kind == EventKind::WorkerFailed)
            .collect();
        assert!(failed.len() >= 2);
        assert!(failed[0].reason.as_deref().unwrap().contains("sync part"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_log_and_error_carry_prefix() {
        let mut service = Service::new(ServiceConfig::new("t"));
        let runner = Runner::new(&mut service, RunnerConfig::new("Example[r0]"));
        let mut rx = service.bus().subscribe();

        runner.log("starting busy work");
        let ev = rx.try_recv().unwrap();
        assert_eq!(ev.kind, EventKind::RunnerMessage);
        assert_eq!(ev.source.as_deref(), Some("Example[r0]-runner"));
        assert_eq!(ev.reason.as_deref(), Some("starting busy work"));

        let err = runner.error(format_args!("lost {} rows", 3));
        assert_eq!(err.to_string(), "Example[r0]-runner: lost 3 rows");
    }
}
