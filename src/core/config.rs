//! # Global runtime configuration.
//!
//! Provides [`Config`], centralized settings for one orchestration run.
//!
//! Config is used in three ways:
//! 1. **Orchestrator creation**: `Orchestrator::new(config)` / `Orchestrator::builder(config)`
//! 2. **TaskSpec defaults**: tasks without their own timeout inherit `timeout`
//! 3. **Poll defaults**: every task's `Reporter` carries `retry`; handles build their
//!    poller with `RetryPoller::for_task(&reporter, ctx)`
//!
//! ## Sentinel values
//! - `max_concurrent = 0` → unlimited (no semaphore created)
//! - `timeout = 0s` → no per-task timeout
//! - `deadline = 0s` → no whole-run deadline

use std::time::Duration;

use crate::policies::RetryPolicy;

/// Global configuration for the orchestrator runtime.
///
/// ## Field semantics
/// - `max_concurrent`: Task concurrency limit (`0` = unlimited)
/// - `bus_capacity`: Event bus ring buffer size (min 1; clamped by Bus)
/// - `timeout`: Default per-task timeout (`0s` = no timeout)
/// - `deadline`: Whole-run deadline after which the cancel signal is raised (`0s` = none)
/// - `cancel_on_signal`: Raise the cancel signal on SIGINT/SIGTERM/SIGQUIT (Ctrl-C elsewhere)
/// - `retry`: Default poll policy handed to task handles through their `Reporter`
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum number of task handles running at once.
    ///
    /// - `0` = unlimited: every task starts at the same time
    /// - `n > 0` = at most `n` handles run simultaneously; the rest wait
    pub max_concurrent: usize,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow receivers that lag behind more than `bus_capacity` messages skip
    /// older items. Minimum value is 1 (enforced by Bus).
    pub bus_capacity: usize,

    /// Default task timeout.
    ///
    /// - `Duration::ZERO` = no timeout (task runs until completion)
    /// - `> 0` = the task fails with `TaskError::Timeout` when exceeded
    pub timeout: Duration,

    /// Whole-run deadline.
    ///
    /// When it elapses the shared cancel signal is raised: pollers stop between
    /// attempts and tasks observe cancellation. Tasks still report their own outcome.
    pub deadline: Duration,

    /// Raise the shared cancel signal when the process receives a termination signal.
    pub cancel_on_signal: bool,

    /// Default poll policy for task handles.
    ///
    /// Exposed to each handle as `Reporter::retry_policy()`.
    pub retry: RetryPolicy,
}

impl Config {
    /// Returns the concurrency limit as an `Option`.
    ///
    /// - `None` → unlimited (no semaphore)
    /// - `Some(n)` → at most `n` concurrent tasks
    #[inline]
    pub fn concurrency_limit(&self) -> Option<usize> {
        if self.max_concurrent == 0 {
            None
        } else {
            Some(self.max_concurrent)
        }
    }

    /// Returns the default per-task timeout as an `Option`.
    #[inline]
    pub fn default_timeout(&self) -> Option<Duration> {
        if self.timeout == Duration::ZERO {
            None
        } else {
            Some(self.timeout)
        }
    }

    /// Returns the whole-run deadline as an `Option`.
    #[inline]
    pub fn run_deadline(&self) -> Option<Duration> {
        if self.deadline == Duration::ZERO {
            None
        } else {
            Some(self.deadline)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `max_concurrent = 0` (unlimited)
    /// - `bus_capacity = 1024`
    /// - `timeout = 0s` (no timeout)
    /// - `deadline = 0s` (no deadline)
    /// - `cancel_on_signal = false`
    /// - `retry = RetryPolicy::default()`
    fn default() -> Self {
        Self {
            max_concurrent: 0,
            bus_capacity: 1024,
            timeout: Duration::ZERO,
            deadline: Duration::ZERO,
            cancel_on_signal: false,
            retry: RetryPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_sentinels_mean_unset() {
        let cfg = Config::default();
        assert_eq!(cfg.concurrency_limit(), None);
        assert_eq!(cfg.default_timeout(), None);
        assert_eq!(cfg.run_deadline(), None);
    }

    #[test]
    fn non_zero_values_are_exposed() {
        let cfg = Config {
            max_concurrent: 2,
            bus_capacity: 0,
            timeout: Duration::from_secs(5),
            deadline: Duration::from_secs(60),
            ..Config::default()
        };
        assert_eq!(cfg.concurrency_limit(), Some(2));
        assert_eq!(cfg.default_timeout(), Some(Duration::from_secs(5)));
        assert_eq!(cfg.run_deadline(), Some(Duration::from_secs(60)));
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }
}
