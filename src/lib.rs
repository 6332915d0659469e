//! # pollvisor
//!
//! **Pollvisor** runs a set of independent async tasks concurrently, lets each
//! one poll a remote long-running operation with exponential backoff, streams
//! their progress as events, and hands back one aggregated result.
//!
//! A typical task submits a job to a cloud API (deploy a service, simulate a
//! validation run) and then asks "done yet?" until the answer is terminal.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │   TaskSpec   │   │   TaskSpec   │   │   TaskSpec   │
//!     │ (id, title)  │   │ (id, title)  │   │ (id, title)  │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Orchestrator                                                     │
//! │  - Registry (one TaskRecord per task: title + state)              │
//! │  - Bus (broadcast events)                                         │
//! │  - cancel token (deadline / OS signal / caller)                   │
//! └──────┬──────────────────┬──────────────────┬───────────────┬──────┘
//!        ▼                  ▼                  ▼               │
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   │
//!     │  TaskBridge  │   │  TaskBridge  │   │  TaskBridge  │   │
//!     │  (run once)  │   │  (run once)  │   │  (run once)  │   │
//!     └┬─────────────┘   └┬─────────────┘   └┬─────────────┘   │
//!      │ handle(Reporter, CancellationToken)                   │
//!      │   └─► RetryPoller::poll(op, in_progress)              │
//!      │         └─► BackoffScheduled                          │
//!      ▼                  ▼                  ▼                 ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! │                   (capacity: Config::bus_capacity)                │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                       ┌────────────────────────┐
//!                       │  listener (per run)    │
//!                       └───────────┬────────────┘
//!                                   ▼
//!                             SubscriberSet
//!                        ┌──────────┼──────────┐
//!                        ▼          ▼          ▼
//!                     worker1    worker2    workerN
//! ```
//!
//! ### Lifecycle of one run
//! ```text
//! load_task(handle, title, id) ×N
//!
//! start():
//!   ├─► no tasks ─► Err(Config(NoTasks))
//!   ├─► publish OrchestrationStarted
//!   ├─► spawn every bridge at once (Semaphore if max_concurrent > 0)
//!   │       ├─ TaskStarting
//!   │       ├─ StatusUpdated / TitleChanged / BackoffScheduled ...
//!   │       └─ TaskSucceeded | TaskFailed   (exactly one)
//!   ├─► join all, in registration order:
//!   │       Ok(v)  ─► context[id] = v
//!   │       Err(e) ─► failures += TaskFailure
//!   ├─► publish OrchestrationFinished, flush subscribers
//!   └─► Ok(context) | Err(TasksFailed { failures, partial })
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                       |
//! |-------------------|---------------------------------------------------------------|------------------------------------------|
//! | **Orchestration** | Run tasks concurrently, aggregate results                     | [`Orchestrator`], [`Context`]            |
//! | **Polling**       | Exponential backoff until a response is terminal             | [`RetryPoller`], [`retry`]               |
//! | **Policies**      | Validated backoff parameters                                  | [`RetryPolicy`]                          |
//! | **Progress**      | Per-task status line and title                                | [`Reporter`], [`Registry`]               |
//! | **Subscriber API**| Hook into lifecycle and progress events                       | [`Subscribe`], [`Event`]                 |
//! | **Errors**        | Typed errors for config, polling, tasks and the run           | [`PollError`], [`OrchestrationError`]    |
//! | **Tasks**         | Define tasks as closures or trait objects                     | [`Task`], [`TaskFn`], [`TaskSpec`]       |
//!
//! ## Optional features
//! - `logging`: exports [`LogWriter`], a subscriber that logs events through `tracing`.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use pollvisor::{Config, Orchestrator, Reporter, RetryPoller, RetryPolicy, TaskError, TaskFn};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let mut orch: Orchestrator<String> = Orchestrator::new(Config::default());
//!
//!     orch.load_task(
//!         TaskFn::new(|r: Reporter, ctx: CancellationToken| async move {
//!             let policy = RetryPolicy { base_delay_ms: 1, ..RetryPolicy::default() };
//!             let poller = RetryPoller::new(policy)?
//!                 .with_cancel(ctx)
//!                 .with_reporter(r.clone());
//!
//!             r.update_status("waiting for deployment");
//!             let state = poller
//!                 .poll(
//!                     |n| async move { Ok::<_, TaskError>(if n < 2 { "Running" } else { "Ready" }) },
//!                     |s| *s == "Running",
//!                 )
//!                 .await?;
//!             Ok::<_, TaskError>(state.to_string())
//!         }),
//!         "Deploy eu-west",
//!         "deploy-eu",
//!     );
//!
//!     let ctx = orch.start().await.unwrap();
//!     assert_eq!(ctx.get("deploy-eu").map(String::as_str), Some("Ready"));
//! }
//! ```

mod core;
mod error;
mod events;
mod policies;
mod polling;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use crate::core::{
    Config, Context, Orchestrator, OrchestratorBuilder, Outcome, Registry, TaskRecord, TaskState,
};
pub use error::{ConfigError, OrchestrationError, PollError, TaskError, TaskFailure};
pub use events::{Bus, Event, EventKind};
pub use policies::{RetryPolicy, RetryPolicyBuilder};
pub use polling::{retry, RetryPoller};
pub use subscribers::{Subscribe, SubscriberSet};
pub use tasks::{BoxTaskFuture, Reporter, Task, TaskFn, TaskRef, TaskSpec};

#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
