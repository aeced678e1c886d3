//! Lifecycle owner of a single operation.
//!
//! A [`TaskState`] holds an [`Operation`] until someone asks for its
//! [`Handle`]. The first call to [`TaskState::obtain`] spawns the operation on
//! the Tokio runtime and memoizes the handle; every later or concurrent call
//! gets a clone of the same handle. The operation therefore runs at most once
//! and every observer sees the same outcome:
//!
//! ```text
//! Idle(operation) ──obtain()──▶ Started(handle) ──▶ outcome (replayed forever)
//! ```
//!
//! Cancellation is cooperative. [`TaskState::cancel`] fires the state's
//! [`CancellationToken`]; the running operation is dropped at its next
//! suspension point and the outcome becomes [`WorkError::Cancelled`].
//! Dropping a `TaskState` cancels it as well.

use std::any::Any;
use std::borrow::Cow;
use std::future::Future;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{Outcome, WorkError};
use crate::id::UnitId;

/// A deferred one-shot computation.
///
/// Receives the cancellation token of the node that owns it.
pub type Operation<T, E> =
    Box<dyn FnOnce(CancellationToken) -> BoxFuture<'static, Outcome<T, E>> + Send>;

/// Shared handle to a started computation. Cloning it never restarts anything.
pub type Handle<T, E> = Shared<BoxFuture<'static, Outcome<T, E>>>;

enum Slot<T, E> {
    Idle(Operation<T, E>),
    Started(Handle<T, E>),
    /// The operation was taken but launching it panicked.
    Lost,
}

/// Memoizing owner of one [`Operation`].
pub struct TaskState<T, E> {
    id: UnitId,
    label: Cow<'static, str>,
    token: CancellationToken,
    slot: Mutex<Slot<T, E>>,
}

impl<T, E> TaskState<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Create an idle state from an async closure.
    ///
    /// The closure is not called until the state is started.
    pub fn new<F, Fut>(label: impl Into<Cow<'static, str>>, operation: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Outcome<T, E>> + Send + 'static,
    {
        Self::from_operation(label, Box::new(move |token| operation(token).boxed()))
    }

    /// Create an idle state from an already boxed operation.
    pub fn from_operation(label: impl Into<Cow<'static, str>>, operation: Operation<T, E>) -> Self {
        Self {
            id: UnitId::new(),
            label: label.into(),
            token: CancellationToken::new(),
            slot: Mutex::new(Slot::Idle(operation)),
        }
    }

    /// Get the handle of the computation, starting it if needed.
    ///
    /// Only the first caller launches the operation; the slot is swapped under
    /// a lock so concurrent callers cannot start it twice.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime on the call that would start
    /// the operation. Later calls replay a [`WorkError::Panicked`] outcome.
    pub fn obtain(&self) -> Handle<T, E> {
        let mut slot = self.slot.lock();
        let handle = match std::mem::replace(&mut *slot, Slot::Lost) {
            Slot::Started(handle) => handle,
            Slot::Idle(operation) => self.launch(operation),
            Slot::Lost => lost(),
        };
        *slot = Slot::Started(handle.clone());
        handle
    }

    /// Wait for the outcome, starting the computation if needed.
    pub async fn result(&self) -> Outcome<T, E> {
        self.obtain().await
    }

    fn launch(&self, operation: Operation<T, E>) -> Handle<T, E> {
        let id = self.id;
        let label = self.label.clone();
        let token = self.token.clone();

        debug!("Starting unit {} ({})", id, label);

        let task = tokio::spawn(async move {
            if token.is_cancelled() {
                debug!("Unit {} ({}) cancelled before it ran", id, label);
                return Err(WorkError::Cancelled);
            }

            let outcome = tokio::select! {
                biased;
                _ = token.cancelled() => Err(WorkError::Cancelled),
                outcome = operation(token.clone()) => outcome,
            };

            match &outcome {
                Ok(_) => debug!("Unit {} ({}) completed", id, label),
                Err(e) => debug!("Unit {} ({}) ended with {}", id, label, e.as_label()),
            }
            outcome
        });

        async move {
            match task.await {
                Ok(outcome) => outcome,
                Err(e) if e.is_cancelled() => Err(WorkError::Cancelled),
                Err(e) => {
                    let message = panic_message(e.into_panic());
                    warn!("Unit {} panicked: {}", id, message);
                    Err(WorkError::Panicked { message })
                }
            }
        }
        .boxed()
        .shared()
    }
}

impl<T, E> TaskState<T, E> {
    /// Identifier of this node.
    pub fn id(&self) -> UnitId {
        self.id
    }

    /// Human-readable operator name, used in logs.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether the operation has been started.
    pub fn is_started(&self) -> bool {
        !matches!(*self.slot.lock(), Slot::Idle(_))
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Request cooperative cancellation.
    ///
    /// Has no effect on an outcome that is already settled.
    pub fn cancel(&self) {
        if !self.token.is_cancelled() {
            debug!("Cancelling unit {} ({})", self.id, self.label);
            self.token.cancel();
        }
    }

    /// The token the operation observes.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.token
    }
}

impl<T, E> Drop for TaskState<T, E> {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

impl<T, E> std::fmt::Debug for TaskState<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskState")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("started", &self.is_started())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

fn lost<T, E>() -> Handle<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    futures::future::ready(Err(WorkError::Panicked {
        message: "operation was lost while starting".to_string(),
    }))
    .boxed()
    .shared()
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
