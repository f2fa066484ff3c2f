//! # Countdown latch for "all workers parked".
//!
//! Mirrors a runner's active-worker count into a [`tokio::sync::watch`]
//! channel so `stop` can wait for zero without polling.
//!
//! ## Rules
//! - The runner publishes every count change **while holding its state lock**,
//!   so the latch never observes a stale value after a newer one.
//! - Waiting is bounded by a timeout; an elapsed wait reports the last count.

use std::time::Duration;

use tokio::{sync::watch, time};

/// Unblocks waiters once the published count reaches zero.
#[derive(Debug)]
pub(crate) struct CountdownLatch {
    tx: watch::Sender<usize>,
}

impl CountdownLatch {
    /// Creates a latch with a zero count.
    pub(crate) fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self { tx }
    }

    /// Publishes the current count.
    pub(crate) fn set(&self, count: usize) {
        self.tx.send_replace(count);
    }

    /// Last published count.
    pub(crate) fn count(&self) -> usize {
        *self.tx.borrow()
    }

    /// Waits until the count is zero or `timeout` elapses.
    ///
    /// Returns `Ok(())` on zero, `Err(remaining)` on timeout.
    pub(crate) async fn wait_zero(&self, timeout: Duration) -> Result<(), usize> {
        let mut rx = self.tx.subscribe();
        match time::timeout(timeout, rx.wait_for(|n| *n == 0)).await {
            Ok(Ok(_)) => Ok(()),
            // The sender lives in `self`, so the channel cannot close while we wait.
            Ok(Err(_closed)) => Err(self.count()),
            Err(_elapsed) => Err(self.count()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::test_util::assert_near;

    #[tokio::test(start_paused = true)]
    async fn test_zero_count_returns_immediately() {
        let latch = CountdownLatch::new();
        let start = time::Instant::now();
        assert_eq!(latch.wait_zero(Duration::from_secs(5)).await, Ok(()));
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unblocks_when_count_drops_to_zero() {
        let latch = Arc::new(CountdownLatch::new());
        latch.set(2);

        let l = Arc::clone(&latch);
        tokio::spawn(async move {
            time::sleep(Duration::from_secs(1)).await;
            l.set(1);
            time::sleep(Duration::from_secs(1)).await;
            l.set(0);
        });

        let start = time::Instant::now();
        assert_eq!(latch.wait_zero(Duration::from_secs(10)).await, Ok(()));
        assert_near(start.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_reports_remaining() {
        let latch = CountdownLatch::new();
        latch.set(3);

        let start = time::Instant::now();
        assert_eq!(latch.wait_zero(Duration::from_secs(4)).await, Err(3));
        assert_near(start.elapsed(), Duration::from_secs(4));
    }
}
