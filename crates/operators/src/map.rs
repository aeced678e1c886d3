//! Success-value operators.

use workunit_core::{TaskState, UnitOfWork};

/// Transforms the upstream success value.
pub struct Map<T, E> {
    state: TaskState<T, E>,
}

impl<T, E> Map<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Wrap `upstream`, applying `f` to its value.
    pub fn new<U, F>(upstream: U, f: F) -> Self
    where
        U: UnitOfWork<Error = E>,
        F: FnOnce(U::Output) -> T + Send + 'static,
    {
        Self {
            state: TaskState::new("map", move |_token| async move {
                let value = upstream.result().await?;
                Ok(f(value))
            }),
        }
    }
}

impl_unit_of_work!(Map);

/// Sequences a dependent unit built from the upstream value.
///
/// The produced unit is owned by this node and only started once the
/// upstream has succeeded.
pub struct AndThen<T, E> {
    state: TaskState<T, E>,
}

impl<T, E> AndThen<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Wrap `upstream`, continuing with the unit `f` builds.
    pub fn new<U, N, F>(upstream: U, f: F) -> Self
    where
        U: UnitOfWork<Error = E>,
        N: UnitOfWork<Output = T, Error = E>,
        F: FnOnce(U::Output) -> N + Send + 'static,
    {
        Self {
            state: TaskState::new("and_then", move |_token| async move {
                let value = upstream.result().await?;
                let next = f(value);
                next.result().await
            }),
        }
    }
}

impl_unit_of_work!(AndThen);

/// Observes the upstream success value without altering it.
pub struct Inspect<T, E> {
    state: TaskState<T, E>,
}

impl<T, E> Inspect<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Wrap `upstream`, calling `f` with a reference to its value.
    pub fn new<U, F>(upstream: U, f: F) -> Self
    where
        U: UnitOfWork<Output = T, Error = E>,
        F: FnOnce(&T) + Send + 'static,
    {
        Self {
            state: TaskState::new("inspect", move |_token| async move {
                let value = upstream.result().await?;
                f(&value);
                Ok(value)
            }),
        }
    }
}

impl_unit_of_work!(Inspect);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UnitOfWorkExt;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::sync::Arc;
    use workunit_core::{Work, WorkError};

    #[tokio::test]
    async fn test_map_transforms_value() {
        let unit = Work::<u32, String>::ok(20).map(|n| n * 2 + 2);
        assert_eq!(unit.result().await, Ok(42));
    }

    #[tokio::test]
    async fn test_map_skips_on_failure() {
        let called = Arc::new(AtomicBool::new(false));
        let flag = called.clone();
        let unit = Work::<u32, String>::err("nope".to_string()).map(move |n| {
            flag.store(true, Ordering::SeqCst);
            n + 1
        });

        assert_eq!(unit.result().await, Err(WorkError::Failed("nope".to_string())));
        assert!(!called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_and_then_chains_units() {
        let unit = Work::<u32, String>::ok(5)
            .and_then(|n| Work::ok(format!("item-{n}")));
        assert_eq!(unit.result().await, Ok("item-5".to_string()));
    }

    #[tokio::test]
    async fn test_and_then_propagates_inner_failure() {
        let unit = Work::<u32, String>::ok(5)
            .and_then(|n| Work::<u32, String>::err(format!("rejected {n}")));
        assert_eq!(
            unit.result().await,
            Err(WorkError::Failed("rejected 5".to_string()))
        );
    }

    #[tokio::test]
    async fn test_inspect_sees_value() {
        let seen = Arc::new(AtomicU32::new(0));
        let sink = seen.clone();
        let unit = Work::<u32, String>::ok(7).inspect(move |n| sink.store(*n, Ordering::SeqCst));

        assert_eq!(unit.result().await, Ok(7));
        assert_eq!(seen.load(Ordering::SeqCst), 7);
    }
}
