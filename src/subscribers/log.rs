//! # LogWriter: events as `tracing` records.
//!
//! A ready-made subscriber that renders every event through `tracing`, so a
//! binary only needs to install a subscriber (e.g. `tracing_subscriber::fmt`)
//! to get a readable run log.
//!
//! ## Example output (fmt layer)
//! ```text
//! INFO  orchestration started tasks="3 task(s)"
//! INFO  task starting task="deploy-eu" title="Deploy eu-west"
//! INFO  status task="deploy-eu" status="instance running"
//! DEBUG backoff scheduled task="deploy-eu" attempt=2 delay=1.5s
//! WARN  task failed task="deploy-us" error="execution failed: quota exceeded"
//! INFO  orchestration finished summary="2 succeeded, 1 failed"
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Subscriber that logs each event with `tracing`.
#[derive(Default, Debug, Clone, Copy)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let task = e.task.as_deref().unwrap_or("-");
        let title = e.title.as_deref().unwrap_or("");
        let message = e.message.as_deref().unwrap_or("");

        match e.kind {
            EventKind::OrchestrationStarted => {
                tracing::info!(tasks = message, "orchestration started");
            }
            EventKind::OrchestrationFinished => {
                tracing::info!(summary = message, "orchestration finished");
            }
            EventKind::CancelRequested => {
                tracing::warn!(reason = message, "cancel requested");
            }
            EventKind::TaskStarting => {
                tracing::info!(task, title, "task starting");
            }
            EventKind::TaskSucceeded => {
                tracing::info!(task, title, "task succeeded");
            }
            EventKind::TaskFailed => {
                tracing::warn!(task, title, error = message, "task failed");
            }
            EventKind::TimeoutHit => {
                tracing::warn!(task, timeout = ?e.timeout, "task timed out");
            }
            EventKind::StatusUpdated => {
                tracing::info!(task, status = message, "status");
            }
            EventKind::TitleChanged => {
                tracing::info!(task, title, "title changed");
            }
            EventKind::BackoffScheduled => {
                tracing::debug!(task, attempt = ?e.attempt, delay = ?e.delay, "backoff scheduled");
            }
            EventKind::SubscriberOverflow => {
                tracing::warn!(subscriber = task, reason = message, "subscriber overflow");
            }
            EventKind::SubscriberPanicked => {
                tracing::error!(subscriber = task, info = message, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
