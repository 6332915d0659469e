//! # Runtime events emitted by the orchestrator, task bridges and reporters.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Run events**: the orchestration as a whole (started, finished, cancel requested)
//! - **Task lifecycle events**: one task's execution (starting, succeeded, failed, timeout)
//! - **Progress events**: what a running task tells its [`Reporter`](crate::Reporter)
//!   (status line, title change, backoff scheduled)
//! - **Subscriber events**: delivery problems (overflow, panic)
//!
//! The [`Event`] struct carries metadata such as timestamps, task id, message and
//! backoff delays. The presentation layer keys its rows by [`Event::task`].
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use pollvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::BackoffScheduled)
//!     .with_task("deploy-eu")
//!     .with_attempt(3)
//!     .with_delay(Duration::from_secs(2));
//!
//! assert_eq!(ev.kind, EventKind::BackoffScheduled);
//! assert_eq!(ev.task.as_deref(), Some("deploy-eu"));
//! assert_eq!(ev.delay, Some(Duration::from_secs(2)));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `task`: subscriber name
    /// - `message`: panic info
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `task`: subscriber name
    /// - `message`: reason string (e.g., "full", "closed")
    SubscriberOverflow,

    // === Run events ===
    /// All registered tasks are about to start.
    ///
    /// Sets:
    /// - `message`: number of tasks
    OrchestrationStarted,

    /// Every task reached a terminal state.
    ///
    /// Sets:
    /// - `message`: succeeded/failed summary
    OrchestrationFinished,

    /// The shared cancellation signal was raised.
    ///
    /// Sets:
    /// - `message`: why (deadline exceeded, OS signal, or the caller)
    CancelRequested,

    // === Task lifecycle events ===
    /// Task handle is being invoked.
    ///
    /// Sets:
    /// - `task`: task id
    /// - `title`: current title
    TaskStarting,

    /// Task handle finished with a value; its result is in the context.
    ///
    /// Sets:
    /// - `task`: task id
    /// - `title`: final title
    TaskSucceeded,

    /// Task handle finished with an error (or timed out / panicked / was cancelled).
    ///
    /// Sets:
    /// - `task`: task id
    /// - `title`: final title
    /// - `message`: failure message
    TaskFailed,

    /// Task exceeded its configured timeout (always followed by `TaskFailed`).
    ///
    /// Sets:
    /// - `task`: task id
    /// - `timeout`: configured timeout
    TimeoutHit,

    // === Progress events ===
    /// Task published a status line through its reporter.
    ///
    /// Sets:
    /// - `task`: task id
    /// - `message`: status text
    StatusUpdated,

    /// Task replaced its display title through its reporter.
    ///
    /// Sets:
    /// - `task`: task id
    /// - `title`: new title
    TitleChanged,

    /// A poller owned by the task got "still in progress" and is about to wait.
    ///
    /// Sets:
    /// - `task`: task id
    /// - `attempt`: number of calls made so far (1-based)
    /// - `delay`: wait before the next call
    BackoffScheduled,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Task id (or subscriber name for subscriber events).
    pub task: Option<Arc<str>>,
    /// Task title, when the event carries one.
    pub title: Option<Arc<str>>,
    /// Status text, failure message or other human-readable detail.
    pub message: Option<Arc<str>>,
    /// Attempt count (starting from 1).
    pub attempt: Option<u32>,
    /// Backoff delay before the next attempt.
    pub delay: Option<Duration>,
    /// Task timeout that was hit.
    pub timeout: Option<Duration>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task: None,
            title: None,
            message: None,
            attempt: None,
            delay: None,
            timeout: None,
        }
    }

    /// Attaches a task id.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches a title.
    #[inline]
    pub fn with_title(mut self, title: impl Into<Arc<str>>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Attaches a human-readable message.
    #[inline]
    pub fn with_message(mut self, message: impl Into<Arc<str>>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Attaches an attempt count.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a backoff delay.
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay = Some(d);
        self
    }

    /// Attaches a timeout duration.
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        self.timeout = Some(d);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_task(subscriber)
            .with_message(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_task(subscriber)
            .with_message(info)
    }

    /// True for `SubscriberOverflow`.
    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }

    /// True for `TaskSucceeded` and `TaskFailed`.
    #[inline]
    pub fn is_task_terminal(&self) -> bool {
        matches!(self.kind, EventKind::TaskSucceeded | EventKind::TaskFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_numbers_increase() {
        let a = Event::new(EventKind::StatusUpdated);
        let b = Event::new(EventKind::StatusUpdated);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn terminal_kinds() {
        assert!(Event::new(EventKind::TaskFailed).is_task_terminal());
        assert!(Event::new(EventKind::TaskSucceeded).is_task_terminal());
        assert!(!Event::new(EventKind::TimeoutHit).is_task_terminal());
    }

    #[test]
    fn overflow_kind_is_recognised() {
        assert!(Event::subscriber_overflow("ui", "full").is_subscriber_overflow());
        assert!(!Event::subscriber_panicked("ui", "boom".into()).is_subscriber_overflow());
    }
}
