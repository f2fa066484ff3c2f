//! Error types used by the runvisor runtime and work functions.
//!
//! This module defines the error enums of the harness:
//!
//! - [`WorkError`] - errors returned by a single work-function invocation.
//! - [`RunnerError`] - errors returned by [`Runner::stop`](crate::Runner::stop).
//! - [`ServiceError`] - errors that end [`Service::run_until`](crate::Service::run_until).
//! - [`ShutdownFailure`] - one failed step of the shutdown sequence.
//!
//! `WorkError`, `RunnerError` and `ServiceError` expose a stable snake_case
//! `as_label()`; `Display` carries the details.

use std::{sync::Arc, time::Duration};

use thiserror::Error;

/// # Errors produced by a work-function invocation.
///
/// These never leave the worker loop: they are logged and the worker keeps
/// its schedule.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum WorkError {
    /// The invocation failed; the worker will run again after its sleep.
    #[error("{error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The invocation panicked; the panic was caught by the worker loop.
    #[error("work panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },

    /// The work function noticed the stop request and returned early.
    #[error("context cancelled")]
    Canceled,
}

impl WorkError {
    /// Shorthand for [`WorkError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        WorkError::Fail {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use runvisor::WorkError;
    ///
    /// assert_eq!(WorkError::fail("boom").as_label(), "work_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            WorkError::Fail { .. } => "work_failed",
            WorkError::Panicked { .. } => "work_panicked",
            WorkError::Canceled => "work_canceled",
        }
    }

    /// Returns `true` if the error should be reported in the logs.
    ///
    /// [`WorkError::Canceled`] is a graceful early return, not a failure.
    pub fn is_reportable(&self) -> bool {
        !matches!(self, WorkError::Canceled)
    }
}

impl From<String> for WorkError {
    fn from(error: String) -> Self {
        WorkError::Fail { error }
    }
}

impl From<&str> for WorkError {
    fn from(error: &str) -> Self {
        WorkError::Fail {
            error: error.to_string(),
        }
    }
}

/// # Errors produced by [`Runner::stop`](crate::Runner::stop).
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum RunnerError {
    /// A previous `stop` already moved the runner to stopping; this request was ignored.
    #[error("{runner}: runner is already in the process of stopping, stop request ignored")]
    AlreadyStopping {
        /// Full runner name (`<name>-runner`).
        runner: Arc<str>,
    },

    /// Active workers did not park within the maximum cleanup duration.
    #[error("{runner}: workers did not park within {timeout:?}")]
    StopTimeout {
        /// Full runner name (`<name>-runner`).
        runner: Arc<str>,
        /// The configured maximum cleanup duration.
        timeout: Duration,
    },
}

impl RunnerError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use runvisor::RunnerError;
    /// use std::time::Duration;
    ///
    /// let err = RunnerError::StopTimeout { runner: "db-runner".into(), timeout: Duration::from_secs(5) };
    /// assert_eq!(err.as_label(), "runner_stop_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RunnerError::AlreadyStopping { .. } => "runner_already_stopping",
            RunnerError::StopTimeout { .. } => "runner_stop_timeout",
        }
    }

    /// Returns `true` if the error should fail the shutdown sequence.
    ///
    /// Only timeouts count: an ignored duplicate stop changes nothing.
    pub fn is_shutdown_failure(&self) -> bool {
        matches!(self, RunnerError::StopTimeout { .. })
    }
}

/// One failed step of the shutdown sequence.
#[derive(Error, Debug, Clone)]
pub enum ShutdownFailure {
    /// A runner did not stop in time.
    #[error(transparent)]
    Runner(#[from] RunnerError),

    /// The cleanup function passed to `run_with_cleanup` failed.
    #[error("cleanup failed: {error}")]
    Cleanup {
        /// The underlying error message.
        error: String,
    },
}

/// # Errors that end a service run.
///
/// Every variant maps to exit status 1 (see [`ServiceError::exit_code`]).
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Runners are installed but none of them started a worker.
    #[error("cannot run service: 0 workers were found across {runners} runner(s)")]
    NoWorkers {
        /// Number of installed runners.
        runners: usize,
    },

    /// Registering for termination signals failed.
    #[error("cannot wait for termination signal: {0}")]
    Signal(#[from] std::io::Error),

    /// At least one shutdown step failed; all failures are kept in order.
    #[error("shutdown finished with {} failure(s): {}", .failures.len(), join_failures(.failures))]
    Shutdown {
        /// Failures in the order they happened.
        failures: Vec<ShutdownFailure>,
    },
}

impl ServiceError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ServiceError::NoWorkers { .. } => "service_no_workers",
            ServiceError::Signal(_) => "service_signal",
            ServiceError::Shutdown { .. } => "service_shutdown_failed",
        }
    }

    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        1
    }
}

/// Renders a caught panic payload as text.
pub(crate) fn panic_info(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn join_failures(failures: &[ShutdownFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
