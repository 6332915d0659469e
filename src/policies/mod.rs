//! Polling policies.
//!
//! This module groups the knobs that control **how often** and **how long** a
//! [`RetryPoller`](crate::RetryPoller) keeps asking a remote API whether an
//! operation has finished.
//!
//! ## Contents
//! - [`RetryPolicy`] base delay / growth factor / attempt budget
//! - [`RetryPolicyBuilder`] field-by-field construction that reports missing fields
//!
//! ## Quick wiring
//! ```text
//! RetryPolicy { base_delay_ms, growth_factor, max_attempts }
//!      └─► polling::RetryPoller uses:
//!           - validate() before the first call
//!           - delay(attempt) between "still in progress" responses
//!           - max_attempts to decide when to give up
//! ```
//!
//! ## Defaults
//! - `RetryPolicy::default()` → base=1000ms, factor=1.5, max_attempts=10.

mod retry;

pub use retry::{RetryPolicy, RetryPolicyBuilder};
