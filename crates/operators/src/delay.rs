//! Time-based waits.
//!
//! Every wait runs inside a node's operation, so cancelling the node (or an
//! enclosing timeout) aborts a pending wait at once.

use std::time::Duration;

use workunit_core::{TaskState, UnitOfWork};

/// A pure elapsed-time wait producing `()`.
pub struct Delay<E> {
    state: TaskState<(), E>,
}

impl<E> Delay<E>
where
    E: Clone + Send + Sync + 'static,
{
    /// Wait for `duration` once started.
    pub fn new(duration: Duration) -> Self {
        Self {
            state: TaskState::new("delay", move |_token| async move {
                tokio::time::sleep(duration).await;
                Ok(())
            }),
        }
    }
}

impl<E> UnitOfWork for Delay<E>
where
    E: Clone + Send + Sync + 'static,
{
    type Output = ();
    type Error = E;

    fn state(&self) -> &TaskState<(), E> {
        &self.state
    }
}

/// Shorthand for [`Delay::new`].
pub fn delay<E>(duration: Duration) -> Delay<E>
where
    E: Clone + Send + Sync + 'static,
{
    Delay::new(duration)
}

/// Waits, then starts and awaits the upstream.
///
/// The upstream is not started before the wait elapses.
pub struct DelayBefore<T, E> {
    state: TaskState<T, E>,
}

impl<T, E> DelayBefore<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Wrap `upstream` behind a wait of `duration`.
    pub fn new<U>(upstream: U, duration: Duration) -> Self
    where
        U: UnitOfWork<Output = T, Error = E>,
    {
        Self {
            state: TaskState::new("delay_before", move |_token| async move {
                tokio::time::sleep(duration).await;
                upstream.result().await
            }),
        }
    }
}

impl_unit_of_work!(DelayBefore);

/// Awaits the upstream, then waits before yielding its value.
///
/// A failed upstream skips the wait.
pub struct DelayAfter<T, E> {
    state: TaskState<T, E>,
}

impl<T, E> DelayAfter<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Wrap `upstream`, holding its value back for `duration`.
    pub fn new<U>(upstream: U, duration: Duration) -> Self
    where
        U: UnitOfWork<Output = T, Error = E>,
    {
        Self {
            state: TaskState::new("delay_after", move |_token| async move {
                let value = upstream.result().await?;
                tokio::time::sleep(duration).await;
                Ok(value)
            }),
        }
    }
}

impl_unit_of_work!(DelayAfter);
