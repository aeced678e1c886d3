//! Error type carried by every unit of work.
//!
//! [`WorkError`] separates failures the library itself produces from the
//! domain errors a computation raises:
//!
//! - [`WorkError::Cancelled`]: cooperative cancellation. Never transformed by
//!   any operator, only re-raised.
//! - [`WorkError::Timeout`]: raised by the timeout operator when its timer wins.
//! - [`WorkError::Panicked`]: the operation panicked on its worker task.
//! - [`WorkError::Failed`]: a domain error, freely transformable.
//!
//! Outcomes are memoized and replayed to every observer, so the type is
//! `Clone` and compares structurally when `E` does.

use std::time::Duration;
use thiserror::Error;

/// Outcome of a unit of work.
pub type Outcome<T, E> = std::result::Result<T, WorkError<E>>;

/// Failure of a unit of work.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkError<E> {
    /// The computation observed a cancellation signal and unwound.
    #[error("unit of work cancelled")]
    Cancelled,

    /// The timeout operator's timer elapsed before the upstream completed.
    #[error("timed out after {after:?}")]
    Timeout {
        /// The duration that was exceeded.
        after: Duration,
    },

    /// The operation panicked, or its start was lost to an earlier panic.
    #[error("operation panicked: {message}")]
    Panicked {
        /// Panic payload, when it was a string.
        message: String,
    },

    /// Domain error raised by the computation or a serializer.
    #[error("{0}")]
    Failed(E),
}

impl<E> WorkError<E> {
    /// Returns `true` for the cancellation variant.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, WorkError::Cancelled)
    }

    /// Returns `true` for the timeout variant.
    pub fn is_timeout(&self) -> bool {
        matches!(self, WorkError::Timeout { .. })
    }

    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            WorkError::Cancelled => "cancelled",
            WorkError::Timeout { .. } => "timeout",
            WorkError::Panicked { .. } => "panicked",
            WorkError::Failed(_) => "failed",
        }
    }

    /// Borrows the domain error, if any.
    pub fn failed(&self) -> Option<&E> {
        match self {
            WorkError::Failed(e) => Some(e),
            _ => None,
        }
    }

    /// Extracts the domain error, if any.
    pub fn into_failed(self) -> Option<E> {
        match self {
            WorkError::Failed(e) => Some(e),
            _ => None,
        }
    }

    /// Maps the domain error, carrying every other variant over unchanged.
    pub fn map_failed<E2>(self, f: impl FnOnce(E) -> E2) -> WorkError<E2> {
        match self {
            WorkError::Cancelled => WorkError::Cancelled,
            WorkError::Timeout { after } => WorkError::Timeout { after },
            WorkError::Panicked { message } => WorkError::Panicked { message },
            WorkError::Failed(e) => WorkError::Failed(f(e)),
        }
    }
}

impl<E> From<E> for WorkError<E> {
    fn from(error: E) -> Self {
        WorkError::Failed(error)
    }
}
