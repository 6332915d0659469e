//! # Event subscribers.
//!
//! The orchestrator forwards every [`Event`](crate::events::Event) of a run to
//! the subscribers attached through
//! [`OrchestratorBuilder::with_subscribers`](crate::OrchestratorBuilder::with_subscribers).
//!
//! ```text
//! Bridge / Reporter ── publish(Event) ──► Bus ──► listener ──► SubscriberSet
//!                                                                 │
//!                                                  ┌──────────────┼─────────────┐
//!                                                  ▼              ▼             ▼
//!                                             progress table   LogWriter     custom
//! ```
//!
//! - [`Subscribe`]: the trait to implement
//! - [`SubscriberSet`]: per-subscriber queues and workers
//! - [`LogWriter`]: renders events through `tracing` (feature `logging`)

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscriber;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscriber::Subscribe;
