//! # Task abstraction.
//!
//! This module defines the [`Task`] trait: a one-shot, cancelable unit of work that
//! receives a [`Reporter`] for progress and a [`CancellationToken`] for the shared
//! cancel signal, and resolves to the value stored in the run's
//! [`Context`](crate::Context).
//!
//! The common handle type is [`TaskRef`], a boxed `dyn Task<T>` the orchestrator
//! owns until it runs it exactly once.

use std::future::Future;
use std::pin::Pin;

use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::tasks::Reporter;

/// Boxed future returned by [`Task::run`].
pub type BoxTaskFuture<T> = Pin<Box<dyn Future<Output = Result<T, TaskError>> + Send + 'static>>;

/// Owned, type-erased task handle.
pub type TaskRef<T> = Box<dyn Task<T>>;

/// # Asynchronous, cancelable, one-shot unit.
///
/// `run` consumes the task: the orchestrator invokes every handle exactly once and
/// never re-invokes it on failure. Retrying belongs inside the handle, usually
/// through a [`RetryPoller`](crate::RetryPoller).
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use pollvisor::{BoxTaskFuture, Reporter, Task, TaskError};
///
/// struct Export {
///     bucket: String,
/// }
///
/// impl Task<String> for Export {
///     fn run(self: Box<Self>, reporter: Reporter, ctx: CancellationToken) -> BoxTaskFuture<String> {
///         Box::pin(async move {
///             if ctx.is_cancelled() {
///                 return Err(TaskError::Canceled);
///             }
///             reporter.update_status(format!("exporting to {}", self.bucket));
///             Ok(format!("s3://{}/export.json", self.bucket))
///         })
///     }
/// }
/// ```
pub trait Task<T>: Send + 'static {
    /// Executes the task until completion or cancellation.
    ///
    /// Implementations should watch `ctx` and return [`TaskError::Canceled`]
    /// promptly once it fires.
    fn run(self: Box<Self>, reporter: Reporter, ctx: CancellationToken) -> BoxTaskFuture<T>;
}

impl<T: 'static> Task<T> for Box<dyn Task<T>> {
    fn run(self: Box<Self>, reporter: Reporter, ctx: CancellationToken) -> BoxTaskFuture<T> {
        (*self).run(reporter, ctx)
    }
}
