//! # Task bridge: run one handle, turn it into events.
//!
//! A [`TaskBridge`] owns one registered task and executes it **exactly once**,
//! translating what the handle does into the events the orchestrator and the
//! presentation layer consume.
//!
//! ## Event flow
//! ```text
//! acquire permit (optional, cancellable)
//!   └─► publish TaskStarting
//!         └─► task.run(reporter, child_token)
//!               │   ├─ reporter.update_status() ─► StatusUpdated
//!               │   ├─ reporter.set_title()     ─► TitleChanged
//!               │   └─ poller backoff           ─► BackoffScheduled
//!               ▼
//!           Ok(value) ──► publish TaskSucceeded
//!           Err(e)    ──► publish TaskFailed
//!           panic     ──► publish TaskFailed (Panicked)
//!           timeout   ──► cancel child → publish TimeoutHit → TaskFailed (Timeout)
//! ```
//!
//! ## Rules
//! - Always publishes **exactly one** terminal event: `TaskSucceeded` or `TaskFailed`
//! - The record moves to its terminal state **before** that event is published,
//!   so the reporter is already closed when subscribers see it
//! - A child token is derived per task; cancelling it never affects siblings
//! - No re-invocation: failures are reported, not retried

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::{select, sync::Semaphore, time};
use tokio_util::sync::CancellationToken;

use crate::core::registry::{Slot, TaskState};
use crate::error::TaskError;
use crate::events::{Bus, Event, EventKind};
use crate::policies::RetryPolicy;
use crate::tasks::{Reporter, TaskRef};

/// What one bridge hands back to the orchestrator.
pub(crate) struct BridgeOutcome<T> {
    pub id: Arc<str>,
    pub title: String,
    pub result: Result<T, TaskError>,
}

/// Runs a single task and reports its lifecycle.
pub(crate) struct TaskBridge<T> {
    task: TaskRef<T>,
    slot: Arc<Slot>,
    bus: Bus,
    timeout: Option<Duration>,
    semaphore: Option<Arc<Semaphore>>,
    retry: RetryPolicy,
}

impl<T: Send + 'static> TaskBridge<T> {
    pub(crate) fn new(
        task: TaskRef<T>,
        slot: Arc<Slot>,
        bus: Bus,
        timeout: Option<Duration>,
        semaphore: Option<Arc<Semaphore>>,
    ) -> Self {
        Self {
            task,
            slot,
            bus,
            timeout,
            semaphore,
            retry: RetryPolicy::default(),
        }
    }

    /// Poll policy handed to the task through its reporter.
    pub(crate) fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// Runs the handle to completion, timeout, panic or cancellation.
    ///
    /// ### Cancellation semantics
    /// - `runtime_token` is checked while waiting for a concurrency permit; a task
    ///   cancelled there never starts and is reported as `TaskError::Canceled`
    /// - once started, the handle receives a child token and decides itself how to
    ///   react (pollers given that token stop between attempts)
    pub(crate) async fn run(self, runtime_token: CancellationToken) -> BridgeOutcome<T> {
        let Self {
            task,
            slot,
            bus,
            timeout,
            semaphore,
            retry,
        } = self;

        let _permit = match semaphore {
            Some(sem) => {
                select! {
                    biased;
                    _ = runtime_token.cancelled() => {
                        return finish(&slot, &bus, Err(TaskError::Canceled));
                    }
                    res = sem.acquire_owned() => match res {
                        Ok(permit) => Some(permit),
                        Err(_closed) => return finish(&slot, &bus, Err(TaskError::Canceled)),
                    },
                }
            }
            None => None,
        };

        slot.transition(TaskState::Running);
        bus.publish(
            Event::new(EventKind::TaskStarting)
                .with_task(slot.id().clone())
                .with_title(slot.title()),
        );

        let child = runtime_token.child_token();
        let reporter = Reporter::new(Arc::clone(&slot), bus.clone()).with_retry_policy(retry);
        let ctx = child.clone();
        let guarded = AssertUnwindSafe(async move { task.run(reporter, ctx).await })
            .catch_unwind()
            .map(|res| match res {
                Ok(out) => out,
                Err(payload) => Err(TaskError::Panicked {
                    info: panic_message(payload),
                }),
            });

        let res = match timeout.filter(|d| *d > Duration::ZERO) {
            Some(dur) => match time::timeout(dur, guarded).await {
                Ok(out) => out,
                Err(_elapsed) => {
                    child.cancel();
                    bus.publish(
                        Event::new(EventKind::TimeoutHit)
                            .with_task(slot.id().clone())
                            .with_timeout(dur),
                    );
                    Err(TaskError::Timeout { timeout: dur })
                }
            },
            None => guarded.await,
        };

        finish(&slot, &bus, res)
    }
}

/// Records the terminal state, publishes the terminal event and packs the outcome.
fn finish<T>(slot: &Slot, bus: &Bus, result: Result<T, TaskError>) -> BridgeOutcome<T> {
    let title = slot.title();
    match &result {
        Ok(_) => {
            slot.transition(TaskState::Succeeded);
            bus.publish(
                Event::new(EventKind::TaskSucceeded)
                    .with_task(slot.id().clone())
                    .with_title(title.as_str()),
            );
        }
        Err(e) => {
            slot.transition(TaskState::Failed);
            bus.publish(
                Event::new(EventKind::TaskFailed)
                    .with_task(slot.id().clone())
                    .with_title(title.as_str())
                    .with_message(e.to_string()),
            );
        }
    }
    BridgeOutcome {
        id: slot.id().clone(),
        title,
        result,
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::registry::Registry;
    use crate::tasks::TaskFn;

    fn drain(rx: &mut tokio::sync::broadcast::Receiver<Event>) -> Vec<EventKind> {
        let mut kinds = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            kinds.push(ev.kind);
        }
        kinds
    }

    #[tokio::test]
    async fn success_emits_starting_progress_and_succeeded() {
        let bus = Bus::new(32);
        let mut rx = bus.subscribe();
        let reg = Registry::new();
        let slot = reg.register("a".into(), "Task A".into());

        let task: TaskRef<u8> = TaskFn::boxed(|r: Reporter, _ctx: CancellationToken| async move {
            r.update_status("halfway");
            r.set_title("Task A (finishing)");
            Ok::<_, TaskError>(7)
        });

        let out = TaskBridge::new(task, slot, bus, None, None)
            .run(CancellationToken::new())
            .await;

        assert_eq!(out.result, Ok(7));
        assert_eq!(out.title, "Task A (finishing)");
        assert_eq!(
            drain(&mut rx),
            vec![
                EventKind::TaskStarting,
                EventKind::StatusUpdated,
                EventKind::TitleChanged,
                EventKind::TaskSucceeded,
            ]
        );
        assert_eq!(reg.get("a").unwrap().state, TaskState::Succeeded);
    }

    #[tokio::test]
    async fn panic_is_contained_as_failure() {
        let bus = Bus::new(8);
        let reg = Registry::new();
        let slot = reg.register("p".into(), "Panics".into());

        let task: TaskRef<()> = TaskFn::boxed(|_r: Reporter, _ctx: CancellationToken| async move {
            if true {
                panic!("kaboom");
            }
            Ok::<_, TaskError>(())
        });

        let out = TaskBridge::new(task, slot, bus, None, None)
            .run(CancellationToken::new())
            .await;

        assert_eq!(
            out.result,
            Err(TaskError::Panicked {
                info: "kaboom".into()
            })
        );
        assert_eq!(reg.get("p").unwrap().state, TaskState::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_cancels_child_and_fails() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        let reg = Registry::new();
        let slot = reg.register("slow".into(), "Slow".into());

        let task: TaskRef<()> = TaskFn::boxed(|_r: Reporter, ctx: CancellationToken| async move {
            time::sleep(Duration::from_secs(3600)).await;
            if ctx.is_cancelled() {
                return Err(TaskError::Canceled);
            }
            Ok(())
        });

        let out = TaskBridge::new(task, slot, bus, Some(Duration::from_secs(5)), None)
            .run(CancellationToken::new())
            .await;

        assert_eq!(
            out.result,
            Err(TaskError::Timeout {
                timeout: Duration::from_secs(5)
            })
        );
        assert_eq!(
            drain(&mut rx),
            vec![
                EventKind::TaskStarting,
                EventKind::TimeoutHit,
                EventKind::TaskFailed
            ]
        );
    }

    #[tokio::test]
    async fn cancelled_while_waiting_for_permit_never_starts() {
        let bus = Bus::new(8);
        let reg = Registry::new();
        let slot = reg.register("queued".into(), "Queued".into());
        let sem = Arc::new(Semaphore::new(1));
        let _held = Arc::clone(&sem).acquire_owned().await.unwrap();

        let token = CancellationToken::new();
        token.cancel();

        let task: TaskRef<()> = TaskFn::boxed(|_r: Reporter, _ctx: CancellationToken| async move {
            if true {
                panic!("must not run");
            }
            Ok::<_, TaskError>(())
        });

        let out = TaskBridge::new(task, slot, bus, None, Some(sem))
            .run(token)
            .await;

        assert_eq!(out.result, Err(TaskError::Canceled));
        assert_eq!(reg.get("queued").unwrap().state, TaskState::Failed);
    }

    #[tokio::test]
    async fn cancelled_token_wins_over_free_permit() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        let reg = Registry::new();
        let slot = reg.register("late".into(), "Late".into());
        let sem = Arc::new(Semaphore::new(4));

        let token = CancellationToken::new();
        token.cancel();

        let task: TaskRef<()> = TaskFn::boxed(|_r: Reporter, _ctx: CancellationToken| async move {
            if true {
                panic!("must not run");
            }
            Ok::<_, TaskError>(())
        });

        let out = TaskBridge::new(task, slot, bus, None, Some(sem))
            .run(token)
            .await;

        assert_eq!(out.result, Err(TaskError::Canceled));
        assert!(drain(&mut rx).iter().all(|k| *k != EventKind::TaskStarting));
    }

    #[tokio::test]
    async fn reporter_carries_the_run_retry_policy() {
        let bus = Bus::new(8);
        let reg = Registry::new();
        let slot = reg.register("p".into(), "Policy".into());
        let policy = RetryPolicy {
            base_delay_ms: 250,
            growth_factor: 3.0,
            max_attempts: 4,
        };

        let task: TaskRef<RetryPolicy> =
            TaskFn::boxed(|r: Reporter, _ctx: CancellationToken| async move {
                Ok::<_, TaskError>(r.retry_policy())
            });

        let out = TaskBridge::new(task, slot, bus, None, None)
            .with_retry_policy(policy)
            .run(CancellationToken::new())
            .await;

        assert_eq!(out.result, Ok(policy));
    }
}
