//! # Task specification for orchestrated execution.
//!
//! Defines [`TaskSpec`], the bundle the orchestrator registers: the handle, its id,
//! its initial display title and an optional timeout.
//!
//! A spec is usually created implicitly by
//! [`Orchestrator::load_task`](crate::Orchestrator::load_task); build one explicitly
//! with [`TaskSpec::new`] to attach a timeout and pass it to
//! [`Orchestrator::load_spec`](crate::Orchestrator::load_spec).

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::tasks::task::{Task, TaskRef};

/// Specification for running one task under orchestration.
///
/// ## Example
/// ```rust
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
/// use pollvisor::{Reporter, TaskError, TaskFn, TaskSpec};
///
/// let spec = TaskSpec::new(
///     TaskFn::new(|_r: Reporter, _ctx: CancellationToken| async move {
///         Ok::<_, TaskError>("done")
///     }),
///     "Validate skill",
///     "validate",
/// )
/// .with_timeout(Some(Duration::from_secs(300)));
///
/// assert_eq!(spec.id(), "validate");
/// assert_eq!(spec.timeout(), Some(Duration::from_secs(300)));
/// ```
pub struct TaskSpec<T> {
    id: Arc<str>,
    title: String,
    task: TaskRef<T>,
    timeout: Option<Duration>,
}

impl<T: 'static> TaskSpec<T> {
    /// Creates a spec with no timeout of its own.
    ///
    /// ### Parameters
    /// - `task`: Handle to execute once
    /// - `title`: Initial display title
    /// - `id`: Key of this task's entry in the resulting context
    pub fn new(
        task: impl Task<T>,
        title: impl Into<String>,
        id: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            task: Box::new(task),
            timeout: None,
        }
    }
}

impl<T> TaskSpec<T> {
    /// Returns the task id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the initial title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the timeout, if configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Returns a new spec with updated timeout (`None` = inherit from config).
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub(crate) fn into_parts(self) -> (Arc<str>, String, TaskRef<T>, Option<Duration>) {
        (self.id, self.title, self.task, self.timeout)
    }
}

impl<T> fmt::Debug for TaskSpec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskSpec")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
