//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted while an orchestration runs.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Orchestrator`, task bridges, `Reporter`, `RetryPoller`
//!   (through the reporter it was given), `SubscriberSet` workers (panic).
//! - **Consumers**: the orchestrator's listener (fans out to `SubscriberSet`)
//!   and any receiver obtained from `Orchestrator::events`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
