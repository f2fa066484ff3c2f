//! # Function-backed work (`WorkFn`)
//!
//! [`WorkFn`] wraps a closure `F: Fn(CancellationToken) -> Fut`, producing a fresh
//! future per invocation.
//!
//! ## Concurrency semantics
//! - Every [`Work::spawn`] call creates a **new** future that owns its state.
//! - Workers started from the same `WorkFn` run concurrently; share state
//!   between them explicitly with `Arc<...>` inside the closure.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use runvisor::{WorkFn, WorkRef, WorkError};
//!
//! let w: WorkRef = WorkFn::arc(|ctx: CancellationToken| async move {
//!     if ctx.is_cancelled() {
//!         return Err(WorkError::Canceled);
//!     }
//!     // do work...
//!     Ok::<_, WorkError>(())
//! });
//! # let _ = w;
//! ```

use std::{future::Future, sync::Arc};

use tokio_util::sync::CancellationToken;

use crate::error::WorkError;
use crate::work::work::{BoxWorkFuture, Work};

/// Function-backed work implementation.
#[derive(Debug)]
pub struct WorkFn<F> {
    f: F,
}

impl<F> WorkFn<F> {
    /// Creates new function-backed work.
    ///
    /// Prefer [`WorkFn::arc`] when you immediately need a [`WorkRef`](crate::WorkRef).
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the work and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

impl<F, Fut> Work for WorkFn<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), WorkError>> + Send + 'static,
{
    fn spawn(&self, ctx: CancellationToken) -> BoxWorkFuture {
        Box::pin((self.f)(ctx))
    }
}
