//! Runtime core: orchestration and lifecycle.
//!
//! The public face of this module is [`Orchestrator`], which runs every
//! registered task concurrently and aggregates the results into a [`Context`].
//!
//! Internal modules:
//! - [`orchestrator`]: registration, the run itself, aggregation, watchdog;
//! - [`bridge`]: runs one task handle with timeout, panic containment and events;
//! - [`registry`]: the live table of task records;
//! - [`shutdown`]: cross-platform termination signals.

mod bridge;
mod builder;
mod config;
mod context;
mod orchestrator;
mod registry;
mod shutdown;

pub use builder::OrchestratorBuilder;
pub use config::Config;
pub use context::Context;
pub use orchestrator::{Orchestrator, Outcome};
pub use registry::{Registry, TaskRecord, TaskState};

pub(crate) use registry::Slot;
