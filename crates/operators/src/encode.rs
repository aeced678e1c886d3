//! Serialize the upstream success value.

use tracing::debug;
use workunit_codec::Serializer;
use workunit_core::{TaskState, UnitOfWork, WorkError};

/// Replaces the upstream value with its encoded form.
///
/// The serializer runs synchronously inside this node's operation, after the
/// upstream has succeeded. It is never called when the upstream fails.
/// Serializer errors surface through `E::from`, which is the identity when
/// the chain already uses the serializer's error type.
pub struct Encode<T, E> {
    state: TaskState<T, E>,
}

impl<T, E> Encode<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Wrap `upstream`, encoding its value with `serializer`.
    pub fn new<U, S>(upstream: U, serializer: S) -> Self
    where
        U: UnitOfWork<Error = E>,
        S: Serializer<U::Output, Output = T> + 'static,
        E: From<S::Error>,
    {
        Self {
            state: TaskState::new("encode", move |_token| async move {
                let value = upstream.result().await?;
                debug!("Encoding output of unit {} as {}", upstream.id(), serializer.format());
                serializer
                    .encode(&value)
                    .map_err(|e| WorkError::Failed(E::from(e)))
            }),
        }
    }
}

impl_unit_of_work!(Encode);
