//! # Function-backed task (`TaskFn`)
//!
//! [`TaskFn`] wraps a closure `F: FnOnce(Reporter, CancellationToken) -> Fut`,
//! turning the common "handle" shape into a [`Task`]. The closure is consumed on
//! the single run, so it may move owned state (clients, request bodies) into the
//! future without `Arc` or `Clone`.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use pollvisor::{Reporter, TaskError, TaskFn, TaskRef};
//!
//! let t: TaskRef<u32> = TaskFn::boxed(|reporter: Reporter, ctx: CancellationToken| async move {
//!     if ctx.is_cancelled() {
//!         return Err(TaskError::Canceled);
//!     }
//!     reporter.update_status("counting");
//!     Ok(42)
//! });
//! # let _ = t;
//! ```

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::tasks::task::{BoxTaskFuture, Task};
use crate::tasks::Reporter;

/// Function-backed task implementation.
#[derive(Debug)]
pub struct TaskFn<F> {
    f: F,
}

impl<F> TaskFn<F> {
    /// Creates a new function-backed task.
    ///
    /// Prefer [`TaskFn::boxed`] when you immediately need a [`TaskRef`](crate::TaskRef).
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the task and returns it boxed, ready to coerce into a `TaskRef<T>`.
    pub fn boxed(f: F) -> Box<Self> {
        Box::new(Self::new(f))
    }
}

impl<T, F, Fut> Task<T> for TaskFn<F>
where
    F: FnOnce(Reporter, CancellationToken) -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, TaskError>> + Send + 'static,
{
    fn run(self: Box<Self>, reporter: Reporter, ctx: CancellationToken) -> BoxTaskFuture<T> {
        let fut = (self.f)(reporter, ctx);
        Box::pin(fut)
    }
}
