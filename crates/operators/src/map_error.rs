//! Error-side operators.
//!
//! All of them match [`WorkError::Cancelled`] first and re-raise it untouched,
//! so cancellation stays observable to every caller up the chain. Success
//! values are passed through without being inspected.

use std::time::Duration;

use tracing::debug;
use workunit_core::{TaskState, UnitOfWork, WorkError};

/// Transforms domain errors.
///
/// `Timeout` and `Panicked` are not domain errors and carry over unchanged;
/// see [`MapTimeout`] to turn a timeout into a domain error.
pub struct MapError<T, E> {
    state: TaskState<T, E>,
}

impl<T, E> MapError<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Wrap `upstream`, applying `f` to its domain errors.
    pub fn new<U, F>(upstream: U, f: F) -> Self
    where
        U: UnitOfWork<Output = T>,
        F: FnOnce(U::Error) -> E + Send + 'static,
    {
        Self {
            state: TaskState::new("map_error", move |_token| async move {
                match upstream.result().await {
                    Ok(value) => Ok(value),
                    Err(WorkError::Cancelled) => Err(WorkError::Cancelled),
                    Err(e) => Err(e.map_failed(f)),
                }
            }),
        }
    }
}

impl_unit_of_work!(MapError);

/// Transforms one specific domain error, leaving every other error untouched.
pub struct MapErrorEq<T, E> {
    state: TaskState<T, E>,
}

impl<T, E> MapErrorEq<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + PartialEq + Send + Sync + 'static,
{
    /// Wrap `upstream`, applying `f` only when it fails with `expected`.
    pub fn new<U, F>(upstream: U, expected: E, f: F) -> Self
    where
        U: UnitOfWork<Output = T, Error = E>,
        F: FnOnce(E) -> E + Send + 'static,
    {
        Self {
            state: TaskState::new("map_error_eq", move |_token| async move {
                match upstream.result().await {
                    Ok(value) => Ok(value),
                    Err(WorkError::Cancelled) => Err(WorkError::Cancelled),
                    Err(WorkError::Failed(e)) if e == expected => Err(WorkError::Failed(f(e))),
                    Err(e) => Err(e),
                }
            }),
        }
    }
}

impl_unit_of_work!(MapErrorEq);

/// Turns a domain error into a success value.
pub struct Recover<T, E> {
    state: TaskState<T, E>,
}

impl<T, E> Recover<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Wrap `upstream`, replacing a domain failure with `f(error)`.
    pub fn new<U, F>(upstream: U, f: F) -> Self
    where
        U: UnitOfWork<Output = T, Error = E>,
        F: FnOnce(E) -> T + Send + 'static,
    {
        Self {
            state: TaskState::new("recover", move |_token| async move {
                match upstream.result().await {
                    Err(WorkError::Cancelled) => Err(WorkError::Cancelled),
                    Err(WorkError::Failed(e)) => {
                        debug!("Recovering from domain error");
                        Ok(f(e))
                    }
                    other => other,
                }
            }),
        }
    }
}

impl_unit_of_work!(Recover);

/// Converts a timeout into a domain error.
pub struct MapTimeout<T, E> {
    state: TaskState<T, E>,
}

impl<T, E> MapTimeout<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Wrap `upstream`, replacing `Timeout { after }` with `Failed(f(after))`.
    pub fn new<U, F>(upstream: U, f: F) -> Self
    where
        U: UnitOfWork<Output = T, Error = E>,
        F: FnOnce(Duration) -> E + Send + 'static,
    {
        Self {
            state: TaskState::new("map_timeout", move |_token| async move {
                match upstream.result().await {
                    Err(WorkError::Cancelled) => Err(WorkError::Cancelled),
                    Err(WorkError::Timeout { after }) => Err(WorkError::Failed(f(after))),
                    other => other,
                }
            }),
        }
    }
}

impl_unit_of_work!(MapTimeout);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UnitOfWorkExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use workunit_core::Work;

    #[derive(Debug, Clone, PartialEq)]
    enum AppError {
        NotFound,
        Invalid(String),
        Upstream(String),
    }

    #[tokio::test]
    async fn test_map_err_transforms_domain_error() {
        let unit = Work::<u32, String>::err("disk".to_string())
            .map_err(|e| AppError::Upstream(e));
        assert_eq!(
            unit.result().await,
            Err(WorkError::Failed(AppError::Upstream("disk".to_string())))
        );
    }

    #[tokio::test]
    async fn test_map_err_leaves_success_alone() {
        let unit = Work::<u32, String>::ok(1).map_err(|_| AppError::NotFound);
        assert_eq!(unit.result().await, Ok(1));
    }

    #[tokio::test]
    async fn test_map_err_never_sees_cancellation() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let upstream: Work<u32, String> =
            Work::new(|_token| async move { Err(WorkError::Cancelled) });
        let unit = upstream.map_err(move |e| {
            counter.fetch_add(1, Ordering::SeqCst);
            AppError::Upstream(e)
        });

        assert_eq!(unit.result().await, Err(WorkError::Cancelled));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_map_err_keeps_timeout() {
        let upstream: Work<u32, String> = Work::new(|_token| async move {
            Err(WorkError::Timeout {
                after: Duration::from_millis(3),
            })
        });
        let unit = upstream.map_err(AppError::Upstream);
        assert_eq!(
            unit.result().await,
            Err(WorkError::Timeout {
                after: Duration::from_millis(3)
            })
        );
    }

    #[tokio::test]
    async fn test_map_err_eq_matches() {
        let unit = Work::<u32, AppError>::err(AppError::NotFound)
            .map_err_eq(AppError::NotFound, |_| AppError::Invalid("missing".to_string()));
        assert_eq!(
            unit.result().await,
            Err(WorkError::Failed(AppError::Invalid("missing".to_string())))
        );
    }

    #[tokio::test]
    async fn test_map_err_eq_ignores_other_errors() {
        let unit = Work::<u32, AppError>::err(AppError::Upstream("db".to_string()))
            .map_err_eq(AppError::NotFound, |_| AppError::Invalid("missing".to_string()));
        assert_eq!(
            unit.result().await,
            Err(WorkError::Failed(AppError::Upstream("db".to_string())))
        );
    }

    #[tokio::test]
    async fn test_recover() {
        let unit = Work::<u32, String>::err("no cache".to_string()).recover(|_| 0);
        assert_eq!(unit.result().await, Ok(0));

        let cancelled: Work<u32, String> =
            Work::new(|_token| async move { Err(WorkError::Cancelled) });
        assert_eq!(cancelled.recover(|_| 0).result().await, Err(WorkError::Cancelled));
    }

    #[tokio::test]
    async fn test_map_timeout() {
        let upstream: Work<u32, AppError> = Work::new(|_token| async move {
            Err(WorkError::Timeout {
                after: Duration::from_millis(10),
            })
        });
        let unit = upstream.map_timeout(|after| AppError::Invalid(format!("slow: {after:?}")));
        assert_eq!(
            unit.result().await,
            Err(WorkError::Failed(AppError::Invalid("slow: 10ms".to_string())))
        );
    }
}
