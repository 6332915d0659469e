//! # Task abstractions and specifications.
//!
//! This module provides the task-side types:
//! - [`Task`] - trait for one-shot async cancelable tasks
//! - [`TaskFn`] - closure-based task implementation
//! - [`TaskRef`] - owned, type-erased task (`Box<dyn Task<T>>`)
//! - [`TaskSpec`] - specification bundling a task with its id, title and timeout
//! - [`Reporter`] - per-task progress channel handed to every running task

mod reporter;
mod spec;
mod task;
mod task_fn;

pub use reporter::Reporter;
pub use spec::TaskSpec;
pub use task::{BoxTaskFuture, Task, TaskRef};
pub use task_fn::TaskFn;
