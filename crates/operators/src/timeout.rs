//! Race an upstream against a deadline.
//!
//! ```text
//!            ┌── upstream ──┐
//! Timeout ───┤              ├── select: first to finish decides
//!            └── timer ─────┘
//!
//! upstream first: cancel timer, return upstream outcome unchanged
//! timer first:    cancel upstream, wait for it to unwind, fail with Timeout
//! ```
//!
//! When both are ready on the same poll, the upstream outcome wins.

use std::time::Duration;

use tracing::{debug, warn};
use workunit_core::{TaskState, UnitOfWork, WorkError};

use crate::delay::Delay;

/// Fails with [`WorkError::Timeout`] if the upstream does not finish in time.
pub struct Timeout<T, E> {
    state: TaskState<T, E>,
}

impl<T, E> Timeout<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Guard `upstream` with a deadline of `after`.
    ///
    /// A zero duration fires essentially immediately; the race still runs.
    pub fn new<U>(upstream: U, after: Duration) -> Self
    where
        U: UnitOfWork<Output = T, Error = E>,
    {
        Self {
            state: TaskState::new("timeout", move |_token| async move {
                let timer: Delay<E> = Delay::new(after);

                // Both start here and run independently of each other.
                let mut upstream_run = upstream.operation();
                let timer_run = timer.operation();

                tokio::select! {
                    biased;
                    outcome = &mut upstream_run => {
                        timer.cancel();
                        outcome
                    }
                    _ = timer_run => {
                        warn!("Unit {} ({}) timed out after {:?}", upstream.id(), upstream.state().label(), after);
                        upstream.cancel();
                        let settled = upstream_run.await;
                        debug!("Timed out unit {} settled with {:?}", upstream.id(), settled.as_ref().err().map(WorkError::as_label));
                        Err(WorkError::Timeout { after })
                    }
                }
            }),
        }
    }

    /// Guard `upstream` with a deadline in milliseconds.
    ///
    /// Zero or negative values clamp to an immediate deadline.
    pub fn from_millis<U>(upstream: U, millis: i64) -> Self
    where
        U: UnitOfWork<Output = T, Error = E>,
    {
        let after = Duration::from_millis(u64::try_from(millis).unwrap_or(0));
        Self::new(upstream, after)
    }
}

impl_unit_of_work!(Timeout);
