//! # Work abstractions.
//!
//! This module provides the work-function contract consumed by runners:
//! - [`Work`] - trait for one repeatable, cancelable unit of work
//! - [`WorkFn`] - closure-based implementation
//! - [`WorkRef`] - shared reference to work (`Arc<dyn Work>`)

mod work;
mod work_fn;

pub use work::{BoxWorkFuture, Work, WorkRef};
pub use work_fn::WorkFn;
