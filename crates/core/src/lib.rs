//! workunit core: lazily started, single-shot units of work.
//!
//! This crate defines the execution engine every operator builds on:
//! the [`WorkError`] taxonomy, the memoizing [`TaskState`], and the
//! [`UnitOfWork`] capability.

#![warn(missing_docs)]

mod error;
mod id;
mod state;
mod unit;
mod work;

pub use error::{Outcome, WorkError};
pub use id::UnitId;
pub use state::{Handle, Operation, TaskState};
pub use unit::{BoxUnit, UnitOfWork};
pub use work::Work;

/// Re-exported so operation closures can name the token type.
pub use tokio_util::sync::CancellationToken;
