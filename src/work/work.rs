//! # Work abstraction.
//!
//! A [`Work`] is invoked again and again by every worker it was started on.
//! Each invocation receives the runner's [`CancellationToken`], which is
//! cancelled when the runner starts stopping. Checking it is optional: the
//! harness never aborts an invocation in flight.

use std::{future::Future, pin::Pin, sync::Arc};

use tokio_util::sync::CancellationToken;

use crate::error::WorkError;

/// Boxed future returned by one invocation of [`Work::spawn`].
pub type BoxWorkFuture = Pin<Box<dyn Future<Output = Result<(), WorkError>> + Send + 'static>>;

/// Shared handle to work, suitable for starting several workers.
pub type WorkRef = Arc<dyn Work>;

/// # Repeatable, cancelable unit of work.
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use runvisor::{BoxWorkFuture, Work, WorkError};
///
/// struct Flush;
///
/// impl Work for Flush {
///     fn spawn(&self, ctx: CancellationToken) -> BoxWorkFuture {
///         Box::pin(async move {
///             if ctx.is_cancelled() {
///                 return Err(WorkError::Canceled);
///             }
///             // flush buffers...
///             Ok(())
///         })
///     }
/// }
/// ```
pub trait Work: Send + Sync + 'static {
    /// Creates the future for one invocation.
    ///
    /// An `Err` is logged by the worker and never stops its loop.
    fn spawn(&self, ctx: CancellationToken) -> BoxWorkFuture;
}
