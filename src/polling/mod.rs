//! Polling remote operations to completion.
//!
//! - [`RetryPoller`] validated policy + optional cancel signal + optional reporter
//! - [`retry`] one-shot helper for the common case
//!
//! A task handle typically wraps one poll: submit a remote job, then
//! `poll(get_status, |s| s.in_progress())`, turning each "still running" answer
//! into a `BackoffScheduled` event on its row.

mod poller;

pub use poller::{retry, RetryPoller};
