//! # Event subscriber trait.
//!
//! [`Subscribe`] is the seam for presentation layers: a progress table, a log
//! sink, a test recorder. The orchestrator feeds every event of a run to every
//! attached subscriber.
//!
//! ```text
//! SubscriberSet ──► [bounded queue] ──► worker task ──► subscriber.on_event()
//!                                    └─► panic caught → EventKind::SubscriberPanicked
//! ```
//!
//! ## Rules
//! - A slow subscriber only fills its own queue; tasks are never blocked by it.
//! - On overflow the event is dropped for that subscriber and
//!   `EventKind::SubscriberOverflow` is published.
//! - Events arrive in FIFO order per subscriber.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use pollvisor::{Event, EventKind, Subscribe};
//!
//! struct FailureCounter(std::sync::atomic::AtomicUsize);
//!
//! #[async_trait]
//! impl Subscribe for FailureCounter {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::TaskFailed {
//!             self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "failure-counter" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Receives runtime events on a dedicated worker.
///
/// Use async I/O inside `on_event` and handle errors internally. Panics are
/// caught and reported, but the event that caused one is lost.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Processes a single event.
    async fn on_event(&self, event: &Event);

    /// Name used in logs and in overflow/panic events.
    ///
    /// Defaults to `type_name::<Self>()`; override it with something short.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred queue capacity (clamped to at least 1). Default: 1024.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
