//! # Start delay policy for new workers.
//!
//! [`StartDelay`] decides how long a freshly started worker waits before its
//! first run:
//!
//! ```text
//! delay = BASE_START_DELAY + initial + random[0, jitter]
//! ```
//!
//! Every worker draws its own jitter, so many workers started together spread
//! their first runs instead of hitting shared resources at the same instant.

use std::time::Duration;

use rand::Rng;

/// Fixed baseline every worker waits before its first run.
pub const BASE_START_DELAY: Duration = Duration::from_secs(1);

/// Start delay of a worker: baseline + initial delay + uniform jitter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StartDelay {
    /// Fixed delay added to [`BASE_START_DELAY`].
    pub initial: Duration,
    /// Upper bound (inclusive) of the random addition.
    pub jitter: Duration,
}

impl StartDelay {
    /// Creates a start delay policy.
    pub fn new(initial: Duration, jitter: Duration) -> Self {
        Self { initial, jitter }
    }

    /// Earliest possible start delay (`jitter = 0`).
    pub fn min(&self) -> Duration {
        BASE_START_DELAY.saturating_add(self.initial)
    }

    /// Latest possible start delay (`jitter = bound`).
    pub fn max(&self) -> Duration {
        self.min().saturating_add(self.jitter)
    }

    /// Draws a start delay in `[min, max]`, with millisecond resolution.
    pub fn sample(&self) -> Duration {
        self.min().saturating_add(self.random_jitter())
    }

    /// Uniform jitter: random[0, jitter]
    fn random_jitter(&self) -> Duration {
        let ms = self.jitter.as_millis().min(u128::from(u64::MAX)) as u64;
        if ms == 0 {
            return Duration::ZERO;
        }
        let mut rng = rand::rng();
        Duration::from_millis(rng.random_range(0..=ms))
    }
}
