//! Retry a unit of work built fresh for each attempt.
//!
//! Units are single-shot, so [`Retry`] takes a factory rather than an
//! upstream instance. The delay before retry `n` (0-indexed) is
//! `first_delay × factor^n`, clamped to `max_delay`.
//!
//! `Cancelled` and `Panicked` are never retried. `Timeout` is retried only
//! when [`RetryPolicy::retry_timeouts`] is set.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use workunit_core::{Outcome, TaskState, UnitOfWork, WorkError};

/// Retry configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. `0` behaves like `1`.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub first_delay: Duration,
    /// Upper bound for any delay.
    pub max_delay: Duration,
    /// Multiplicative growth factor.
    pub factor: f64,
    /// Whether timeouts count as retryable failures.
    pub retry_timeouts: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            first_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
            factor: 2.0,
            retry_timeouts: false,
        }
    }
}

impl RetryPolicy {
    /// Create the default policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of attempts.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Set the first delay.
    pub fn with_first_delay(mut self, delay: Duration) -> Self {
        self.first_delay = delay;
        self
    }

    /// Set the delay cap.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Set the growth factor.
    pub fn with_factor(mut self, factor: f64) -> Self {
        self.factor = factor;
        self
    }

    /// Retry timeouts as well as domain errors.
    pub fn with_retry_timeouts(mut self, enabled: bool) -> Self {
        self.retry_timeouts = enabled;
        self
    }

    /// Attempts actually made.
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Delay before retry number `retry` (0-indexed).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exp = retry.min(i32::MAX as u32) as i32;
        let secs = self.first_delay.as_secs_f64() * self.factor.powi(exp);

        if !secs.is_finite() || secs < 0.0 || secs > self.max_delay.as_secs_f64() {
            self.max_delay
        } else {
            Duration::from_secs_f64(secs)
        }
    }

    fn should_retry<E>(&self, error: &WorkError<E>, predicate: &(dyn Fn(&E) -> bool + Send + Sync)) -> bool {
        match error {
            WorkError::Cancelled | WorkError::Panicked { .. } => false,
            WorkError::Timeout { .. } => self.retry_timeouts,
            WorkError::Failed(e) => predicate(e),
        }
    }
}

/// Runs units from a factory until one succeeds or the policy gives up.
pub struct Retry<T, E> {
    state: TaskState<T, E>,
}

impl<T, E> Retry<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Retry every domain failure.
    pub fn new<U, F>(policy: RetryPolicy, factory: F) -> Self
    where
        U: UnitOfWork<Output = T, Error = E>,
        F: Fn() -> U + Send + 'static,
    {
        Self::with_predicate(policy, factory, |_| true)
    }

    /// Retry only the domain failures `predicate` accepts.
    pub fn with_predicate<U, F, P>(policy: RetryPolicy, factory: F, predicate: P) -> Self
    where
        U: UnitOfWork<Output = T, Error = E>,
        F: Fn() -> U + Send + 'static,
        P: Fn(&E) -> bool + Send + Sync + 'static,
    {
        Self {
            state: TaskState::new("retry", move |_token| async move {
                run_attempts(policy, factory, predicate).await
            }),
        }
    }
}

impl_unit_of_work!(Retry);

async fn run_attempts<T, E, U, F, P>(policy: RetryPolicy, factory: F, predicate: P) -> Outcome<T, E>
where
    U: UnitOfWork<Output = T, Error = E>,
    F: Fn() -> U,
    P: Fn(&E) -> bool + Send + Sync,
{
    let attempts = policy.attempts();
    let mut attempt = 0;

    loop {
        attempt += 1;
        let unit = factory();
        let outcome = unit.result().await;

        let error = match &outcome {
            Ok(_) => {
                debug!("Attempt {}/{} succeeded", attempt, attempts);
                return outcome;
            }
            Err(e) => e,
        };

        if attempt >= attempts || !policy.should_retry(error, &predicate) {
            return outcome;
        }

        let wait = policy.delay_for(attempt - 1);
        warn!(
            "Attempt {}/{} of unit {} failed ({}), retrying in {:?}",
            attempt,
            attempts,
            unit.id(),
            error.as_label(),
            wait
        );
        drop(unit);
        tokio::time::sleep(wait).await;
    }
}
