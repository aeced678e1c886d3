//! Source units built from closures and futures.

use std::borrow::Cow;
use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::error::{Outcome, WorkError};
use crate::state::TaskState;
use crate::unit::UnitOfWork;

/// A unit of work with no upstream.
///
/// ```text
/// Work::new(|token| async { ... })  ──▶  operators ...  ──▶  result().await
/// ```
pub struct Work<T, E> {
    state: TaskState<T, E>,
}

impl<T, E> Work<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Create a unit from an async closure that receives the cancellation token.
    ///
    /// The closure may return [`WorkError::Cancelled`] itself after observing
    /// the token; domain errors convert with `?`.
    pub fn new<F, Fut>(operation: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Outcome<T, E>> + Send + 'static,
    {
        Self::named("work", operation)
    }

    /// Same as [`Work::new`] with a custom label for logs.
    pub fn named<F, Fut>(label: impl Into<Cow<'static, str>>, operation: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Outcome<T, E>> + Send + 'static,
    {
        Self {
            state: TaskState::new(label, operation),
        }
    }

    /// Create a unit from a future yielding a domain result.
    pub fn from_future<Fut>(future: Fut) -> Self
    where
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        Self::new(move |_token| async move { future.await.map_err(WorkError::Failed) })
    }

    /// A unit that succeeds with `value`.
    pub fn ok(value: T) -> Self {
        Self::named("ok", move |_token| async move { Ok(value) })
    }

    /// A unit that fails with the domain error `error`.
    pub fn err(error: E) -> Self {
        Self::named("err", move |_token| async move { Err(WorkError::Failed(error)) })
    }
}

impl<T, E> UnitOfWork for Work<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    type Output = T;
    type Error = E;

    fn state(&self) -> &TaskState<T, E> {
        &self.state
    }
}
