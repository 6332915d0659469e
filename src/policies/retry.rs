//! # Retry policy for polling an in-progress operation.
//!
//! [`RetryPolicy`] controls how long a poller waits between "still in progress"
//! responses and how many times it asks again. It is parameterized by:
//! - [`RetryPolicy::base_delay_ms`] the delay before the first re-poll;
//! - [`RetryPolicy::growth_factor`] the multiplicative growth per attempt;
//! - [`RetryPolicy::max_attempts`] how many re-polls are allowed.
//!
//! The delay after attempt `n` (0-indexed) is `base_delay_ms × growth_factor^n`.
//! The poller makes at most `max_attempts + 1` calls: the first one plus one per
//! allowed retry.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use pollvisor::RetryPolicy;
//!
//! let policy = RetryPolicy::new(100, 2.0, 5).unwrap();
//!
//! assert_eq!(policy.delay(0), Duration::from_millis(100));
//! assert_eq!(policy.delay(1), Duration::from_millis(200));
//! assert_eq!(policy.delay(3), Duration::from_millis(800));
//! assert_eq!(policy.max_calls(), 6);
//! ```

use std::time::Duration;

use crate::error::ConfigError;

const NANOS_PER_MILLI: f64 = 1_000_000.0;

/// Exponential polling policy.
///
/// All three fields are required and must be positive; [`RetryPolicy::validate`]
/// rejects anything else with an error naming the field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Delay before the first re-poll, in milliseconds (`> 0`).
    pub base_delay_ms: u64,
    /// Multiplicative growth factor (`> 0`, finite; `>= 1.0` recommended).
    pub growth_factor: f64,
    /// Number of re-polls allowed after the first call (`> 0`).
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    /// Returns a policy with:
    /// - `base_delay_ms = 1000`;
    /// - `growth_factor = 1.5`;
    /// - `max_attempts = 10`.
    fn default() -> Self {
        Self {
            base_delay_ms: 1000,
            growth_factor: 1.5,
            max_attempts: 10,
        }
    }
}

impl RetryPolicy {
    /// Creates a validated policy.
    pub fn new(
        base_delay_ms: u64,
        growth_factor: f64,
        max_attempts: u32,
    ) -> Result<Self, ConfigError> {
        let policy = Self {
            base_delay_ms,
            growth_factor,
            max_attempts,
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Starts a builder where every field must be set explicitly.
    pub fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder::default()
    }

    /// Checks every field; the first offending one is reported.
    ///
    /// # Example
    /// ```
    /// use pollvisor::{ConfigError, RetryPolicy};
    ///
    /// let mut policy = RetryPolicy::default();
    /// policy.growth_factor = 0.0;
    /// assert_eq!(
    ///     policy.validate(),
    ///     Err(ConfigError::InvalidGrowthFactor { value: 0.0 })
    /// );
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_delay_ms == 0 {
            return Err(ConfigError::InvalidBaseDelay {
                value: self.base_delay_ms,
            });
        }
        if !self.growth_factor.is_finite() || self.growth_factor <= 0.0 {
            return Err(ConfigError::InvalidGrowthFactor {
                value: self.growth_factor,
            });
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::InvalidMaxAttempts {
                value: self.max_attempts,
            });
        }
        Ok(())
    }

    /// Upper bound on operation calls for one poll: `max_attempts + 1`.
    #[inline]
    pub fn max_calls(&self) -> u32 {
        self.max_attempts.saturating_add(1)
    }

    /// Computes the delay that follows attempt `attempt` (0-indexed).
    ///
    /// The value is `base_delay_ms × growth_factor^attempt`. Results that are not
    /// finite or do not fit in `u64` milliseconds saturate instead of panicking.
    ///
    /// # Notes
    /// - If `growth_factor` is less than 1.0 this sequence shrinks; the poller
    ///   floors each delay at the previous one so waits never get shorter.
    /// - If `growth_factor` equals 1.0, delay stays at `base_delay_ms`.
    pub fn delay(&self, attempt: u32) -> Duration {
        let clamped_exp = attempt.min(i32::MAX as u32) as i32;
        let millis = self.base_delay_ms as f64 * self.growth_factor.powi(clamped_exp);

        if !millis.is_finite() || millis >= u64::MAX as f64 {
            Duration::from_millis(u64::MAX)
        } else if millis <= 0.0 {
            Duration::ZERO
        } else if millis < u64::MAX as f64 / NANOS_PER_MILLI {
            Duration::from_nanos((millis * NANOS_PER_MILLI).round() as u64)
        } else {
            Duration::from_millis(millis as u64)
        }
    }
}

/// Builder for [`RetryPolicy`] that tells a missing field apart from an invalid one.
///
/// Useful when the three values come from flags or a config file where any of
/// them may be absent.
#[derive(Clone, Copy, Debug, Default)]
pub struct RetryPolicyBuilder {
    base_delay_ms: Option<u64>,
    growth_factor: Option<f64>,
    max_attempts: Option<u32>,
}

impl RetryPolicyBuilder {
    /// Sets the base delay in milliseconds.
    pub fn base_delay_ms(mut self, value: u64) -> Self {
        self.base_delay_ms = Some(value);
        self
    }

    /// Sets the growth factor.
    pub fn growth_factor(mut self, value: f64) -> Self {
        self.growth_factor = Some(value);
        self
    }

    /// Sets the attempt budget.
    pub fn max_attempts(mut self, value: u32) -> Self {
        self.max_attempts = Some(value);
        self
    }

    /// Builds and validates the policy.
    pub fn build(self) -> Result<RetryPolicy, ConfigError> {
        let base_delay_ms = self.base_delay_ms.ok_or(ConfigError::Missing {
            field: "base_delay_ms",
        })?;
        let growth_factor = self.growth_factor.ok_or(ConfigError::Missing {
            field: "growth_factor",
        })?;
        let max_attempts = self.max_attempts.ok_or(ConfigError::Missing {
            field: "max_attempts",
        })?;
        RetryPolicy::new(base_delay_ms, growth_factor, max_attempts)
    }
}
