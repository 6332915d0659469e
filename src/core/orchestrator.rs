//! # Orchestrator: run every registered task at once and aggregate outcomes.
//!
//! The [`Orchestrator`] owns the event bus, the registered tasks and the shared
//! cancel signal. `start` spawns one bridge per task, waits for all of them, and
//! folds their results into a [`Context`] or an [`OrchestrationError`].
//!
//! ## High-level architecture
//! ```text
//! load_task(handle, title, id) ×N  ──►  Registry (TaskRecord per task)
//!
//! start():
//!   - no tasks?  ─► Err(Config(NoTasks)), nothing runs
//!   - listener:  Bus.subscribe() ─► SubscriberSet::emit(&Event)
//!   - watchdog:  deadline / OS signal ─► CancelRequested + cancel_token.cancel()
//!   - publish OrchestrationStarted
//!
//!   TaskSpec[0]   TaskSpec[1]   ...   TaskSpec[N-1]
//!       │             │                    │
//!       └──► tokio::spawn(TaskBridge::run(cancel_token))      (all at once)
//!
//!   join_all ──► for each outcome, in registration order:
//!                  Ok(v)  ─► context[id] = v
//!                  Err(e) ─► failures.push(TaskFailure { id, title, e })
//!
//!   publish OrchestrationFinished ─► drain listener ─► flush subscribers
//!
//!   failures.is_empty() ? Ok(context) : Err(TasksFailed { failures, partial: context })
//! ```
//!
//! ## Rules
//! - A failing task never cancels its siblings; every task runs to its own end.
//! - `start` consumes the orchestrator, so a run happens at most once per instance.
//! - Subscribers have seen every event, including `OrchestrationFinished`, by the
//!   time `start` returns.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use pollvisor::{Config, Orchestrator, Reporter, TaskError, TaskFn};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let mut orch: Orchestrator<&'static str> = Orchestrator::new(Config::default());
//!
//!     orch.load_task(
//!         TaskFn::new(|r: Reporter, _ctx: CancellationToken| async move {
//!             r.update_status("simulating");
//!             Ok::<_, TaskError>("ok")
//!         }),
//!         "Simulate skill",
//!         "simulate",
//!     );
//!     orch.load_task(
//!         TaskFn::new(|_r: Reporter, _ctx: CancellationToken| async move {
//!             Err::<&'static str, _>(TaskError::fail("boom"))
//!         }),
//!         "Validate skill",
//!         "validate",
//!     );
//!
//!     let err = orch.start().await.unwrap_err();
//!     assert!(err.to_string().contains("boom"));
//!     assert_eq!(err.partial().unwrap().get("simulate"), Some(&"ok"));
//! }
//! ```

use std::future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tokio::{select, sync::Semaphore, task::JoinHandle, time};
use tokio_util::sync::CancellationToken;

use crate::core::bridge::{BridgeOutcome, TaskBridge};
use crate::core::registry::{Registry, Slot, TaskState};
use crate::core::{shutdown, Config, Context, OrchestratorBuilder};
use crate::error::{ConfigError, OrchestrationError, TaskError, TaskFailure};
use crate::events::{Bus, Event, EventKind};
use crate::subscribers::{Subscribe, SubscriberSet};
use crate::tasks::{Task, TaskRef, TaskSpec};

/// Result of one orchestration run.
pub type Outcome<T> = Result<Context<T>, OrchestrationError<T>>;

/// A registered, not yet started task.
struct Entry<T> {
    task: TaskRef<T>,
    slot: Arc<Slot>,
    timeout: Option<Duration>,
}

/// Runs registered tasks concurrently and aggregates their results.
pub struct Orchestrator<T> {
    cfg: Config,
    bus: Bus,
    subscribers: Vec<Arc<dyn Subscribe>>,
    registry: Arc<Registry>,
    entries: Vec<Entry<T>>,
    token: CancellationToken,
}

impl<T: Send + 'static> Orchestrator<T> {
    /// Creates an orchestrator with no subscribers.
    pub fn new(cfg: Config) -> Self {
        OrchestratorBuilder::new(cfg).build()
    }

    /// Starts a builder to attach subscribers or a parent cancel token.
    pub fn builder(cfg: Config) -> OrchestratorBuilder<T> {
        OrchestratorBuilder::new(cfg)
    }

    pub(crate) fn from_parts(
        cfg: Config,
        subscribers: Vec<Arc<dyn Subscribe>>,
        token: CancellationToken,
    ) -> Self {
        let bus = Bus::new(cfg.bus_capacity_clamped());
        Self {
            cfg,
            bus,
            subscribers,
            registry: Arc::new(Registry::new()),
            entries: Vec::new(),
            token,
        }
    }

    /// Registers a task handle under `id` with an initial display `title`.
    ///
    /// Ids should be unique: the context keeps one value per id.
    pub fn load_task(
        &mut self,
        handle: impl Task<T>,
        title: impl Into<String>,
        id: impl Into<Arc<str>>,
    ) -> &mut Self {
        self.load_spec(TaskSpec::new(handle, title, id))
    }

    /// Registers a prepared [`TaskSpec`] (use this to give one task its own timeout).
    pub fn load_spec(&mut self, spec: TaskSpec<T>) -> &mut Self {
        let (id, title, task, timeout) = spec.into_parts();
        let slot = self.registry.register(id, title);
        self.entries.push(Entry {
            task,
            slot,
            timeout,
        });
        self
    }

    /// Number of registered tasks.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no task is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Runtime configuration.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Live table of task records; stays valid after `start` consumes the orchestrator.
    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.registry)
    }

    /// Shared cancel signal. Cancelling it stops pollers between attempts and lets
    /// every running handle observe cancellation; queued tasks never start.
    pub fn cancel_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Raw receiver for every event published from now on.
    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Runs every registered task concurrently and waits for all of them.
    ///
    /// Resolves to `Ok(context)` only when every task succeeded. Otherwise returns
    /// [`OrchestrationError::TasksFailed`] carrying each failure (registration order)
    /// and the context of the tasks that did succeed. With no registered tasks it
    /// returns [`OrchestrationError::Config`] without running anything.
    pub async fn start(self) -> Outcome<T> {
        let Self {
            cfg,
            bus,
            subscribers,
            registry: _,
            entries,
            token,
        } = self;

        if entries.is_empty() {
            return Err(OrchestrationError::Config(ConfigError::NoTasks));
        }

        let total = entries.len();
        let finished = CancellationToken::new();
        let subs = SubscriberSet::new(subscribers, bus.clone());
        let listener = spawn_listener(&bus, subs, finished.clone());
        let watchdog = spawn_watchdog(&cfg, &bus, token.clone(), finished.clone());

        tracing::debug!(tasks = total, "orchestration starting");
        bus.publish(
            Event::new(EventKind::OrchestrationStarted).with_message(format!("{total} task(s)")),
        );

        let semaphore = cfg.concurrency_limit().map(|n| Arc::new(Semaphore::new(n)));
        let default_timeout = cfg.default_timeout();

        let mut slots = Vec::with_capacity(total);
        let mut handles: Vec<JoinHandle<BridgeOutcome<T>>> = Vec::with_capacity(total);
        for entry in entries {
            slots.push(Arc::clone(&entry.slot));
            let bridge = TaskBridge::new(
                entry.task,
                entry.slot,
                bus.clone(),
                entry.timeout.or(default_timeout),
                semaphore.clone(),
            )
            .with_retry_policy(cfg.retry);
            handles.push(tokio::spawn(bridge.run(token.clone())));
        }

        let mut context = Context::new();
        let mut failures = Vec::new();
        for (joined, slot) in join_all(handles).await.into_iter().zip(slots) {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(join_err) => lost_bridge(&slot, &bus, join_err.to_string()),
            };
            match outcome.result {
                Ok(value) => {
                    context.insert(outcome.id.as_ref(), value);
                }
                Err(error) => failures.push(TaskFailure {
                    id: outcome.id.to_string(),
                    title: outcome.title,
                    error,
                }),
            }
        }

        let succeeded = total - failures.len();
        tracing::debug!(succeeded, failed = failures.len(), "orchestration finished");
        bus.publish(
            Event::new(EventKind::OrchestrationFinished).with_message(format!(
                "{succeeded} succeeded, {} failed",
                failures.len()
            )),
        );

        finished.cancel();
        let _ = watchdog.await;
        if let Ok(subs) = listener.await {
            subs.shutdown().await;
        }

        if failures.is_empty() {
            Ok(context)
        } else {
            Err(OrchestrationError::TasksFailed {
                failures,
                partial: context,
            })
        }
    }
}

/// Builds an outcome for a bridge whose tokio task died before reporting.
fn lost_bridge<T>(slot: &Slot, bus: &Bus, info: String) -> BridgeOutcome<T> {
    if slot.transition(TaskState::Failed) {
        bus.publish(
            Event::new(EventKind::TaskFailed)
                .with_task(slot.id().clone())
                .with_message(info.as_str()),
        );
    }
    BridgeOutcome {
        id: slot.id().clone(),
        title: slot.title(),
        result: Err(TaskError::Panicked { info }),
    }
}

/// Forwards bus events to the subscriber set until `finished`, then drains the buffer.
fn spawn_listener(
    bus: &Bus,
    subs: SubscriberSet,
    finished: CancellationToken,
) -> JoinHandle<SubscriberSet> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            select! {
                biased;
                msg = rx.recv() => match msg {
                    Ok(ev) => subs.emit(&ev),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "event listener lagged; events dropped");
                    }
                    Err(RecvError::Closed) => break,
                },
                _ = finished.cancelled() => {
                    loop {
                        match rx.try_recv() {
                            Ok(ev) => subs.emit(&ev),
                            Err(TryRecvError::Lagged(skipped)) => {
                                tracing::warn!(skipped, "event listener lagged; events dropped");
                            }
                            Err(_) => break,
                        }
                    }
                    break;
                }
            }
        }
        subs
    })
}

/// Raises the cancel signal on deadline or OS signal; reports any cancellation.
fn spawn_watchdog(
    cfg: &Config,
    bus: &Bus,
    token: CancellationToken,
    finished: CancellationToken,
) -> JoinHandle<()> {
    let deadline = cfg.run_deadline();
    let on_signal = cfg.cancel_on_signal;
    let bus = bus.clone();

    tokio::spawn(async move {
        let deadline_hit = async {
            match deadline {
                Some(d) => {
                    time::sleep(d).await;
                    d
                }
                None => future::pending().await,
            }
        };
        let signal = async {
            if !on_signal {
                return future::pending().await;
            }
            match shutdown::wait_for_termination_signal().await {
                Ok(name) => name,
                Err(e) => {
                    tracing::warn!(error = %e, "cannot listen for termination signals");
                    future::pending().await
                }
            }
        };

        let reason = select! {
            _ = finished.cancelled() => return,
            _ = token.cancelled() => "cancelled by caller".to_string(),
            d = deadline_hit => format!("deadline of {d:?} exceeded"),
            name = signal => format!("received {name}"),
        };

        tracing::warn!(reason = %reason, "cancelling remaining tasks");
        bus.publish(Event::new(EventKind::CancelRequested).with_message(reason));
        token.cancel();
    })
}
