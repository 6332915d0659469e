//! # Reporter: per-task progress channel.
//!
//! A [`Reporter`] is handed to every task handle when it starts. The handle uses it
//! to publish human-readable progress:
//! - [`Reporter::update_status`] → `StatusUpdated` (a status line under the task's row)
//! - [`Reporter::set_title`] → `TitleChanged` (replaces the row's title)
//!
//! The reporter knows its task id and where to publish, nothing else: not how
//! many tasks run, not whether anyone renders its events. A
//! [`RetryPoller`](crate::RetryPoller) given a reporter also publishes
//! `BackoffScheduled` through it.
//!
//! It also carries the run's default [`RetryPolicy`] (`Config::retry`), so a
//! handle can build its poller with [`RetryPoller::for_task`](crate::RetryPoller::for_task).
//!
//! ## Rules
//! - One reporter per task instance; clones share the same task.
//! - Calls after the task's terminal event are dropped.

use std::sync::Arc;
use std::time::Duration;

use crate::core::Slot;
use crate::events::{Bus, Event, EventKind};
use crate::policies::RetryPolicy;

/// Forwarding channel a running task uses to publish progress.
#[derive(Clone, Debug)]
pub struct Reporter {
    slot: Arc<Slot>,
    bus: Bus,
    retry: RetryPolicy,
}

impl Reporter {
    pub(crate) fn new(slot: Arc<Slot>, bus: Bus) -> Self {
        Self {
            slot,
            bus,
            retry: RetryPolicy::default(),
        }
    }

    /// Replaces the poll policy handed to the task.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// Creates a reporter that is not attached to any orchestrator.
    ///
    /// Useful for driving a handle or a poller on its own (tests, one-off tools);
    /// events go to the returned bus receivers only.
    pub fn detached(id: impl Into<Arc<str>>, title: impl Into<String>, bus: Bus) -> Self {
        Self::new(Slot::new(id.into(), title.into()), bus)
    }

    /// Task id this reporter publishes for.
    pub fn task(&self) -> &str {
        self.slot.id()
    }

    /// Current display title of the task.
    pub fn title(&self) -> String {
        self.slot.title()
    }

    /// Default poll policy of the run this task belongs to.
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// True once the task reached a terminal state; further calls are dropped.
    pub fn is_closed(&self) -> bool {
        self.slot.state().is_terminal()
    }

    /// Publishes a status line for this task.
    pub fn update_status(&self, status: impl Into<Arc<str>>) {
        if self.is_closed() {
            return;
        }
        self.bus.publish(
            Event::new(EventKind::StatusUpdated)
                .with_task(self.slot.id().clone())
                .with_message(status),
        );
    }

    /// Replaces this task's display title.
    pub fn set_title(&self, title: impl Into<Arc<str>>) {
        let title = title.into();
        if !self.slot.set_title(&title) {
            return;
        }
        self.bus.publish(
            Event::new(EventKind::TitleChanged)
                .with_task(self.slot.id().clone())
                .with_title(title),
        );
    }

    /// Publishes that a poll came back "in progress" after `attempt` calls.
    pub(crate) fn backoff_scheduled(&self, attempt: u32, delay: Duration) {
        if self.is_closed() {
            return;
        }
        self.bus.publish(
            Event::new(EventKind::BackoffScheduled)
                .with_task(self.slot.id().clone())
                .with_attempt(attempt)
                .with_delay(delay),
        );
    }

    #[cfg(test)]
    pub(crate) fn close(&self) {
        self.slot.transition(crate::core::TaskState::Succeeded);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn forwards_status_and_title() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let reporter = Reporter::detached("deploy-eu", "Deploy eu-west-1", bus);

        reporter.update_status("uploading artifact");
        reporter.set_title("waiting for response…");

        let status = rx.recv().await.unwrap();
        assert_eq!(status.kind, EventKind::StatusUpdated);
        assert_eq!(status.task.as_deref(), Some("deploy-eu"));
        assert_eq!(status.message.as_deref(), Some("uploading artifact"));

        let title = rx.recv().await.unwrap();
        assert_eq!(title.kind, EventKind::TitleChanged);
        assert_eq!(title.title.as_deref(), Some("waiting for response…"));
        assert_eq!(reporter.title(), "waiting for response…");
    }

    #[tokio::test]
    async fn drops_calls_after_terminal_state() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let reporter = Reporter::detached("a", "A", bus);

        reporter.close();
        reporter.update_status("too late");
        reporter.set_title("too late");

        assert!(reporter.is_closed());
        assert!(rx.try_recv().is_err());
        assert_eq!(reporter.title(), "A");
    }
}
