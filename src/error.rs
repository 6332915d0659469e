//! Error types used by the pollvisor runtime, pollers and tasks.
//!
//! This module defines four error enums, leaves first:
//!
//! - [`ConfigError`]: invalid setup detected before any work runs.
//! - [`PollError`]: outcome of a [`RetryPoller`](crate::RetryPoller) that did not
//!   reach a terminal response.
//! - [`TaskError`]: failure of one orchestrated task.
//! - [`OrchestrationError`]: the aggregate returned by
//!   [`Orchestrator::start`](crate::Orchestrator::start).
//!
//! All of them provide `as_label` (stable snake_case for logs/metrics). Errors are
//! always handed back to the caller; nothing in this crate prints them.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::core::Context;

/// # Configuration errors.
///
/// Raised synchronously, before any operation is called or any task is spawned.
/// Each invalid retry-policy field gets its own variant so the caller can tell
/// which one is wrong.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A required retry-policy field was never set.
    #[error("retry policy field `{field}` is required")]
    Missing {
        /// Name of the missing field.
        field: &'static str,
    },

    /// `base_delay_ms` must be greater than zero.
    #[error("retry policy field `base_delay_ms` must be > 0 (got {value})")]
    InvalidBaseDelay {
        /// The rejected value.
        value: u64,
    },

    /// `growth_factor` must be a finite number greater than zero.
    #[error("retry policy field `growth_factor` must be a finite number > 0 (got {value})")]
    InvalidGrowthFactor {
        /// The rejected value.
        value: f64,
    },

    /// `max_attempts` must be greater than zero.
    #[error("retry policy field `max_attempts` must be > 0 (got {value})")]
    InvalidMaxAttempts {
        /// The rejected value.
        value: u32,
    },

    /// [`Orchestrator::start`](crate::Orchestrator::start) was called with no registered tasks.
    #[error("no tasks registered; nothing to start")]
    NoTasks,
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use pollvisor::ConfigError;
    ///
    /// let err = ConfigError::InvalidMaxAttempts { value: 0 };
    /// assert_eq!(err.as_label(), "config_invalid_max_attempts");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::Missing { .. } => "config_missing_field",
            ConfigError::InvalidBaseDelay { .. } => "config_invalid_base_delay",
            ConfigError::InvalidGrowthFactor { .. } => "config_invalid_growth_factor",
            ConfigError::InvalidMaxAttempts { .. } => "config_invalid_max_attempts",
            ConfigError::NoTasks => "config_no_tasks",
        }
    }

    /// Returns the retry-policy field this error is about, if any.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ConfigError::Missing { field } => Some(field),
            ConfigError::InvalidBaseDelay { .. } => Some("base_delay_ms"),
            ConfigError::InvalidGrowthFactor { .. } => Some("growth_factor"),
            ConfigError::InvalidMaxAttempts { .. } => Some("max_attempts"),
            ConfigError::NoTasks => None,
        }
    }
}

/// # Errors produced by a [`RetryPoller`](crate::RetryPoller).
///
/// `R` is the operation's response type, `E` its error type.
///
/// A terminal response is **not** an error: whether "Complete" or "Failed" is a
/// domain success is the caller's call. The poller only fails when:
/// - the policy is invalid ([`PollError::Config`], zero calls made);
/// - an attempt itself errored ([`PollError::Operation`], never retried);
/// - the response was still "in progress" after the last allowed attempt
///   ([`PollError::Exhausted`], carries that last response);
/// - the shared cancellation signal fired ([`PollError::Canceled`]).
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum PollError<R, E> {
    /// The retry policy was rejected before any call.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The operation failed; polling stopped on that attempt.
    #[error("operation failed on attempt {attempt}: {source}")]
    Operation {
        /// Zero-based attempt index that failed.
        attempt: u32,
        /// The operation's own error.
        source: E,
    },

    /// Every allowed attempt reported "still in progress".
    #[error("still in progress after {attempts} attempts")]
    Exhausted {
        /// Number of operation calls made (`max_attempts + 1`).
        attempts: u32,
        /// Response returned by the final call.
        last_response: R,
    },

    /// Polling was cancelled before the given attempt could run.
    #[error("polling cancelled before attempt {attempt}")]
    Canceled {
        /// Zero-based attempt index that never ran.
        attempt: u32,
    },
}

impl<R, E> PollError<R, E> {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            PollError::Config(_) => "poll_config",
            PollError::Operation { .. } => "poll_operation_failed",
            PollError::Exhausted { .. } => "poll_exhausted",
            PollError::Canceled { .. } => "poll_canceled",
        }
    }

    /// Returns the last response for [`PollError::Exhausted`].
    pub fn last_response(&self) -> Option<&R> {
        match self {
            PollError::Exhausted { last_response, .. } => Some(last_response),
            _ => None,
        }
    }

    /// True if every attempt was spent while the operation stayed in progress.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, PollError::Exhausted { .. })
    }
}

/// # Errors produced by task execution.
///
/// A task's handle returns `Err(TaskError)` to mark the task Failed. The
/// runtime itself produces [`TaskError::Timeout`], [`TaskError::Canceled`] and
/// [`TaskError::Panicked`].
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// Task execution failed.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Task exceeded its timeout.
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    /// Task observed the shared cancellation signal and gave up.
    #[error("context cancelled")]
    Canceled,

    /// Task handle panicked; the panic was contained.
    #[error("task panicked: {info}")]
    Panicked {
        /// Panic payload, when it was a string.
        info: String,
    },
}

impl TaskError {
    /// Shorthand for [`TaskError::Fail`] from anything printable.
    pub fn fail(error: impl fmt::Display) -> Self {
        TaskError::Fail {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use pollvisor::TaskError;
    /// use std::time::Duration;
    ///
    /// let err = TaskError::Timeout { timeout: Duration::from_secs(1) };
    /// assert_eq!(err.as_label(), "task_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fail { .. } => "task_failed",
            TaskError::Timeout { .. } => "task_timeout",
            TaskError::Canceled => "task_canceled",
            TaskError::Panicked { .. } => "task_panicked",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::Fail { error } => format!("error: {error}"),
            TaskError::Timeout { timeout } => format!("timeout: {timeout:?}"),
            TaskError::Canceled => "context cancelled".to_string(),
            TaskError::Panicked { info } => format!("panic: {info}"),
        }
    }
}

impl From<ConfigError> for TaskError {
    fn from(err: ConfigError) -> Self {
        TaskError::fail(err)
    }
}

impl<R, E> From<PollError<R, E>> for TaskError
where
    R: fmt::Debug,
    E: fmt::Display,
{
    fn from(err: PollError<R, E>) -> Self {
        match err {
            PollError::Config(e) => TaskError::fail(e),
            PollError::Operation { attempt, source } => TaskError::Fail {
                error: format!("operation failed on attempt {attempt}: {source}"),
            },
            PollError::Exhausted {
                attempts,
                last_response,
            } => TaskError::Fail {
                error: format!(
                    "still in progress after {attempts} attempts (last response: {last_response:?})"
                ),
            },
            PollError::Canceled { .. } => TaskError::Canceled,
        }
    }
}

/// One failed task inside an [`OrchestrationError::TasksFailed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFailure {
    /// Task id as registered.
    pub id: String,
    /// Task title at the moment it failed.
    pub title: String,
    /// Why it failed.
    pub error: TaskError,
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.id, self.error)
    }
}

/// # Errors returned by [`Orchestrator::start`](crate::Orchestrator::start).
///
/// `T` is the task result type. The failure case keeps every successful result in
/// `partial` so nothing already done is lost.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum OrchestrationError<T> {
    /// Nothing was started.
    #[error("orchestrator misconfigured: {0}")]
    Config(ConfigError),

    /// At least one task failed. Every task still ran to completion.
    #[error("{}", join_failures(.failures))]
    TasksFailed {
        /// Every failed task, in registration order.
        failures: Vec<TaskFailure>,
        /// Results of every task that succeeded.
        partial: Context<T>,
    },
}

impl<T> OrchestrationError<T> {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            OrchestrationError::Config(_) => "orchestration_config",
            OrchestrationError::TasksFailed { .. } => "orchestration_tasks_failed",
        }
    }

    /// Failed tasks, empty for configuration errors.
    pub fn failures(&self) -> &[TaskFailure] {
        match self {
            OrchestrationError::TasksFailed { failures, .. } => failures,
            OrchestrationError::Config(_) => &[],
        }
    }

    /// Results of the tasks that succeeded before the run was declared failed.
    pub fn partial(&self) -> Option<&Context<T>> {
        match self {
            OrchestrationError::TasksFailed { partial, .. } => Some(partial),
            OrchestrationError::Config(_) => None,
        }
    }

    /// Consumes the error and returns the partial context, if any.
    pub fn into_partial(self) -> Option<Context<T>> {
        match self {
            OrchestrationError::TasksFailed { partial, .. } => Some(partial),
            OrchestrationError::Config(_) => None,
        }
    }
}

fn join_failures(failures: &[TaskFailure]) -> String {
    let lines: Vec<String> = failures.iter().map(ToString::to_string).collect();
    format!("{} task(s) failed: {}", failures.len(), lines.join("; "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_name_their_field() {
        assert_eq!(
            ConfigError::InvalidBaseDelay { value: 0 }.field(),
            Some("base_delay_ms")
        );
        assert_eq!(
            ConfigError::InvalidGrowthFactor { value: -1.0 }.field(),
            Some("growth_factor")
        );
        assert_eq!(
            ConfigError::Missing {
                field: "max_attempts"
            }
            .field(),
            Some("max_attempts")
        );
        assert_eq!(ConfigError::NoTasks.field(), None);
    }

    #[test]
    fn exhausted_poll_maps_to_task_failure_with_last_response() {
        let err: PollError<&str, std::io::Error> = PollError::Exhausted {
            attempts: 3,
            last_response: "In Progress",
        };
        let task_err = TaskError::from(err);
        match task_err {
            TaskError::Fail { error } => {
                assert!(error.contains("3 attempts"));
                assert!(error.contains("In Progress"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn canceled_poll_maps_to_canceled_task() {
        let err: PollError<(), std::io::Error> = PollError::Canceled { attempt: 2 };
        assert_eq!(TaskError::from(err), TaskError::Canceled);
    }

    #[test]
    fn aggregated_message_lists_every_failure() {
        let err: OrchestrationError<()> = OrchestrationError::TasksFailed {
            failures: vec![
                TaskFailure {
                    id: "a".into(),
                    title: "A".into(),
                    error: TaskError::fail("boom"),
                },
                TaskFailure {
                    id: "b".into(),
                    title: "B".into(),
                    error: TaskError::Canceled,
                },
            ],
            partial: Context::new(),
        };
        let text = err.to_string();
        assert!(text.starts_with("2 task(s) failed"));
        assert!(text.contains("[a] execution failed: boom"));
        assert!(text.contains("[b] context cancelled"));
        assert_eq!(err.as_label(), "orchestration_tasks_failed");
    }

    #[test]
    fn labels_are_prefixed_by_error_family() {
        let no_tasks: OrchestrationError<()> = OrchestrationError::Config(ConfigError::NoTasks);
        assert_eq!(no_tasks.as_label(), "orchestration_config");
        assert!(no_tasks.failures().is_empty());
        assert_eq!(TaskError::Canceled.as_label(), "task_canceled");
    }
}
