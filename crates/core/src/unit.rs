//! The unit-of-work capability.

use async_trait::async_trait;

use crate::error::Outcome;
use crate::id::UnitId;
use crate::state::{Handle, TaskState};

/// A composable, lazily started, single-outcome asynchronous computation.
///
/// Implementors only expose their [`TaskState`]; starting, awaiting and
/// cancelling are provided on top of it. Operators hold their upstream by
/// value inside their own operation, so chains are trees with one consumer
/// per node.
#[async_trait]
pub trait UnitOfWork: Send + Sync + 'static {
    /// Success type.
    type Output: Clone + Send + Sync + 'static;

    /// Domain error type.
    type Error: Clone + Send + Sync + 'static;

    /// The lifecycle owner of this node's operation.
    fn state(&self) -> &TaskState<Self::Output, Self::Error>;

    /// Identifier of this node.
    fn id(&self) -> UnitId {
        self.state().id()
    }

    /// Obtain the handle of the underlying operation, starting it if needed.
    ///
    /// The handle outlives the node, but dropping the node cancels the run.
    fn operation(&self) -> Handle<Self::Output, Self::Error> {
        self.state().obtain()
    }

    /// Run to completion and return the memoized outcome.
    async fn result(&self) -> Outcome<Self::Output, Self::Error> {
        self.state().result().await
    }

    /// Request cooperative cancellation of this node and, through it, its
    /// upstream chain.
    fn cancel(&self) {
        self.state().cancel()
    }
}

/// A type-erased unit of work.
pub type BoxUnit<T, E> = Box<dyn UnitOfWork<Output = T, Error = E>>;

impl<U> UnitOfWork for Box<U>
where
    U: UnitOfWork + ?Sized,
{
    type Output = U::Output;
    type Error = U::Error;

    fn state(&self) -> &TaskState<Self::Output, Self::Error> {
        (**self).state()
    }
}
