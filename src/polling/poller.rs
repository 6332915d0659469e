//! # RetryPoller: poll an operation until it stops being "in progress".
//!
//! [`RetryPoller`] repeatedly calls a caller-supplied async operation with
//! exponential backoff ([`RetryPolicy`]) until a caller-supplied predicate says the
//! response is terminal, or until the attempt budget runs out.
//!
//! ## Flow
//! ```text
//! validate(policy) ── Err ──► PollError::Config            (0 calls)
//!
//! loop {
//!   ├─► cancelled? ──────────► PollError::Canceled
//!   ├─► operation(attempt)
//!   │       ├─ Err(e) ───────► PollError::Operation        (never retried)
//!   │       └─ Ok(resp)
//!   ├─► should_continue(&resp)?
//!   │       └─ false ────────► Ok(resp)                    (terminal: success or domain failure)
//!   ├─► attempt == max_attempts? ──► PollError::Exhausted { last_response: resp }
//!   ├─► delay = max(prev, base × factor^attempt)
//!   ├─► reporter: BackoffScheduled { attempt + 1, delay }
//!   ├─► sleep(delay) (cancellable)
//!   └─► attempt += 1
//! }
//! ```
//!
//! ## Rules
//! - At most `max_attempts + 1` operation calls.
//! - Exactly one operation in flight at a time; attempts are strictly sequential.
//! - Delays never decrease between attempts.

use std::future::Future;
use std::time::Duration;

use tokio::{select, time};
use tokio_util::sync::CancellationToken;

use crate::error::{ConfigError, PollError};
use crate::policies::RetryPolicy;
use crate::tasks::Reporter;

/// Backoff-driven poller bound to a validated [`RetryPolicy`].
///
/// # Example
/// ```rust
/// use pollvisor::{RetryPolicy, RetryPoller};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let poller = RetryPoller::new(RetryPolicy::new(10, 2.0, 5).unwrap()).unwrap();
///
/// let mut remaining = 2;
/// let status = poller
///     .poll(
///         |_attempt| {
///             let status = if remaining == 0 { "SUCCESSFUL" } else { "IN_PROGRESS" };
///             remaining -= 1;
///             async move { Ok::<_, std::io::Error>(status) }
///         },
///         |status| *status == "IN_PROGRESS",
///     )
///     .await
///     .unwrap();
///
/// assert_eq!(status, "SUCCESSFUL");
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct RetryPoller {
    policy: RetryPolicy,
    cancel: Option<CancellationToken>,
    reporter: Option<Reporter>,
}

impl RetryPoller {
    /// Validates `policy` and creates a poller.
    pub fn new(policy: RetryPolicy) -> Result<Self, ConfigError> {
        policy.validate()?;
        Ok(Self {
            policy,
            cancel: None,
            reporter: None,
        })
    }

    /// Creates a poller for a running task: the run's default policy from
    /// `reporter`, cancelled by `ctx`, reporting backoff on the task's row.
    pub fn for_task(reporter: &Reporter, ctx: CancellationToken) -> Result<Self, ConfigError> {
        Ok(Self::new(reporter.retry_policy())?
            .with_cancel(ctx)
            .with_reporter(reporter.clone()))
    }

    /// Stops polling when `token` is cancelled (checked before every attempt and
    /// during every backoff sleep).
    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Publishes a `BackoffScheduled` event through `reporter` before every wait.
    pub fn with_reporter(mut self, reporter: Reporter) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Returns the policy this poller runs with.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Polls `operation` until `should_continue` returns `false` for a response.
    ///
    /// `operation` receives the zero-based attempt index. `should_continue` must be
    /// a pure classification of the response: `true` means "still in progress".
    pub async fn poll<R, E, Op, Fut, P>(
        &self,
        mut operation: Op,
        should_continue: P,
    ) -> Result<R, PollError<R, E>>
    where
        Op: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<R, E>>,
        P: Fn(&R) -> bool,
    {
        let mut attempt: u32 = 0;
        let mut prev_delay = Duration::ZERO;

        loop {
            if self.is_cancelled() {
                return Err(PollError::Canceled { attempt });
            }

            let response = match operation(attempt).await {
                Ok(response) => response,
                Err(source) => return Err(PollError::Operation { attempt, source }),
            };

            if !should_continue(&response) {
                return Ok(response);
            }

            if attempt >= self.policy.max_attempts {
                return Err(PollError::Exhausted {
                    attempts: attempt.saturating_add(1),
                    last_response: response,
                });
            }

            let delay = self.policy.delay(attempt).max(prev_delay);
            prev_delay = delay;

            if let Some(reporter) = &self.reporter {
                reporter.backoff_scheduled(attempt.saturating_add(1), delay);
            }

            attempt += 1;
            if !self.wait(delay).await {
                return Err(PollError::Canceled { attempt });
            }
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|t| t.is_cancelled())
    }

    /// Sleeps for `delay`; returns `false` if cancelled first.
    async fn wait(&self, delay: Duration) -> bool {
        match &self.cancel {
            Some(token) => {
                let sleep = time::sleep(delay);
                tokio::pin!(sleep);
                select! {
                    _ = &mut sleep => true,
                    _ = token.cancelled() => false,
                }
            }
            None => {
                time::sleep(delay).await;
                true
            }
        }
    }
}

/// Validates `policy` and polls `operation` until `should_continue` returns `false`.
///
/// Shorthand for `RetryPoller::new(policy)?.poll(operation, should_continue)`; an
/// invalid policy resolves to [`PollError::Config`] without calling `operation`.
pub async fn retry<R, E, Op, Fut, P>(
    policy: RetryPolicy,
    operation: Op,
    should_continue: P,
) -> Result<R, PollError<R, E>>
where
    Op: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<R, E>>,
    P: Fn(&R) -> bool,
{
    RetryPoller::new(policy)?
        .poll(operation, should_continue)
        .await
}
