//! Combinator methods for every unit of work.

use std::time::Duration;

use workunit_codec::Serializer;
use workunit_core::{BoxUnit, UnitOfWork};

use crate::delay::{DelayAfter, DelayBefore};
use crate::encode::Encode;
use crate::map::{AndThen, Inspect, Map};
use crate::map_error::{MapError, MapErrorEq, MapTimeout, Recover};
use crate::timeout::Timeout;

/// Builder-style operators, available on any [`UnitOfWork`].
///
/// Each method consumes the unit, so an upstream always has exactly one
/// downstream consumer.
pub trait UnitOfWorkExt: UnitOfWork + Sized {
    /// Transform the success value.
    fn map<T, F>(self, f: F) -> Map<T, Self::Error>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce(Self::Output) -> T + Send + 'static,
    {
        Map::new(self, f)
    }

    /// Continue with a unit built from the success value.
    fn and_then<N, F>(self, f: F) -> AndThen<N::Output, Self::Error>
    where
        N: UnitOfWork<Error = Self::Error>,
        F: FnOnce(Self::Output) -> N + Send + 'static,
    {
        AndThen::new(self, f)
    }

    /// Observe the success value.
    fn inspect<F>(self, f: F) -> Inspect<Self::Output, Self::Error>
    where
        F: FnOnce(&Self::Output) + Send + 'static,
    {
        Inspect::new(self, f)
    }

    /// Transform domain errors. Cancellation is never passed to `f`.
    fn map_err<E, F>(self, f: F) -> MapError<Self::Output, E>
    where
        E: Clone + Send + Sync + 'static,
        F: FnOnce(Self::Error) -> E + Send + 'static,
    {
        MapError::new(self, f)
    }

    /// Transform the domain error only when it equals `expected`.
    fn map_err_eq<F>(self, expected: Self::Error, f: F) -> MapErrorEq<Self::Output, Self::Error>
    where
        Self::Error: PartialEq,
        F: FnOnce(Self::Error) -> Self::Error + Send + 'static,
    {
        MapErrorEq::new(self, expected, f)
    }

    /// Replace a domain failure with a success value.
    fn recover<F>(self, f: F) -> Recover<Self::Output, Self::Error>
    where
        F: FnOnce(Self::Error) -> Self::Output + Send + 'static,
    {
        Recover::new(self, f)
    }

    /// Turn a timeout into a domain error.
    fn map_timeout<F>(self, f: F) -> MapTimeout<Self::Output, Self::Error>
    where
        F: FnOnce(Duration) -> Self::Error + Send + 'static,
    {
        MapTimeout::new(self, f)
    }

    /// Encode the success value.
    fn encode<S>(self, serializer: S) -> Encode<S::Output, Self::Error>
    where
        S: Serializer<Self::Output> + 'static,
        S::Output: Clone + Send + Sync + 'static,
        Self::Error: From<S::Error>,
    {
        Encode::new(self, serializer)
    }

    /// Fail with a timeout if the unit does not finish within `after`.
    fn timeout(self, after: Duration) -> Timeout<Self::Output, Self::Error> {
        Timeout::new(self, after)
    }

    /// Same as [`UnitOfWorkExt::timeout`], in signed milliseconds.
    fn timeout_millis(self, millis: i64) -> Timeout<Self::Output, Self::Error> {
        Timeout::from_millis(self, millis)
    }

    /// Wait for `duration` before starting the unit.
    fn delay_before(self, duration: Duration) -> DelayBefore<Self::Output, Self::Error> {
        DelayBefore::new(self, duration)
    }

    /// Wait for `duration` after the unit succeeds.
    fn delay_after(self, duration: Duration) -> DelayAfter<Self::Output, Self::Error> {
        DelayAfter::new(self, duration)
    }

    /// Erase the concrete operator type.
    fn boxed(self) -> BoxUnit<Self::Output, Self::Error> {
        Box::new(self)
    }
}

impl<U: UnitOfWork> UnitOfWorkExt for U {}
