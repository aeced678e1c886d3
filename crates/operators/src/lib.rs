//! Operators over units of work.
//!
//! Every operator wraps exactly one upstream unit, owns it inside its own
//! operation, and applies one transformation:
//!
//! ```text
//! Work ──▶ Map ──▶ MapError ──▶ Timeout ──▶ Encode ──▶ result().await
//! ```
//!
//! Cancellation is never transformed by any operator; it is re-raised as is.

#![warn(missing_docs)]

macro_rules! impl_unit_of_work {
    ($name:ident) => {
        impl<T, E> workunit_core::UnitOfWork for $name<T, E>
        where
            T: Clone + Send + Sync + 'static,
            E: Clone + Send + Sync + 'static,
        {
            type Output = T;
            type Error = E;

            fn state(&self) -> &workunit_core::TaskState<T, E> {
                &self.state
            }
        }
    };
}

pub mod delay;
pub mod encode;
pub mod ext;
pub mod map;
pub mod map_error;
pub mod retry;
pub mod timeout;

pub use delay::{delay, Delay, DelayAfter, DelayBefore};
pub use encode::Encode;
pub use ext::UnitOfWorkExt;
pub use map::{AndThen, Inspect, Map};
pub use map_error::{MapError, MapErrorEq, MapTimeout, Recover};
pub use retry::{Retry, RetryPolicy};
pub use timeout::Timeout;

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use futures::future::join_all;
    use tokio::time::Instant;
    use workunit_codec::{CodecError, JsonSerializer};
    use workunit_core::{UnitOfWork, Work, WorkError};

    use super::{Retry, RetryPolicy, UnitOfWorkExt};

    #[derive(Debug, Clone, PartialEq)]
    enum AppError {
        NotFound,
        Denied,
        Fallback,
        Codec(String),
    }

    impl From<CodecError> for AppError {
        fn from(e: CodecError) -> Self {
            AppError::Codec(e.to_string())
        }
    }

    struct SetOnDrop(Arc<AtomicBool>);

    impl Drop for SetOnDrop {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    fn counted(calls: Arc<AtomicUsize>, outcome: Result<u32, AppError>) -> Work<u32, AppError> {
        Work::new(move |_token| async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            outcome.map_err(WorkError::Failed)
        })
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_observers_share_one_run() {
        let calls = Arc::new(AtomicUsize::new(0));
        let unit = Arc::new(counted(calls.clone(), Ok(7)).map(|n| n * 6));

        let observers = (0..32).map(|_| {
            let unit = unit.clone();
            tokio::spawn(async move { unit.result().await })
        });
        let outcomes = join_all(observers).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        for outcome in outcomes {
            assert_eq!(outcome.unwrap(), Ok(42));
        }
    }

    #[tokio::test]
    async fn test_failure_is_replayed_without_rerun() {
        let calls = Arc::new(AtomicUsize::new(0));
        let unit = counted(calls.clone(), Err(AppError::NotFound)).map(|n| n + 1);

        let first = unit.result().await;
        let second = unit.result().await;

        assert_eq!(first, Err(WorkError::Failed(AppError::NotFound)));
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_passes_through_map_err() {
        let transformed = Arc::new(AtomicUsize::new(0));
        let counter = transformed.clone();

        let unit = Work::<u32, AppError>::new(|_token| async move {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(1)
        })
        .map_err(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            AppError::Fallback
        });

        let handle = unit.operation();
        tokio::time::sleep(Duration::from_millis(1)).await;
        unit.cancel();

        assert_eq!(handle.await, Err(WorkError::Cancelled));
        assert_eq!(transformed.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_matched_error_transform() {
        let matched = Work::<u32, AppError>::err(AppError::NotFound)
            .map_err_eq(AppError::NotFound, |_| AppError::Fallback);
        let unmatched = Work::<u32, AppError>::err(AppError::Denied)
            .map_err_eq(AppError::NotFound, |_| AppError::Fallback);

        assert_eq!(matched.result().await, Err(WorkError::Failed(AppError::Fallback)));
        assert_eq!(unmatched.result().await, Err(WorkError::Failed(AppError::Denied)));
    }

    #[tokio::test]
    async fn test_encode_only_on_success() {
        let ok = Work::<Vec<u32>, AppError>::ok(vec![1, 2]).encode(JsonSerializer::new());
        assert_eq!(ok.result().await, Ok(b"[1,2]".to_vec()));

        let failed = Work::<Vec<u32>, AppError>::err(AppError::Denied).encode(JsonSerializer::new());
        assert_eq!(failed.result().await, Err(WorkError::Failed(AppError::Denied)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_race_both_ways() {
        let fast = Work::<&'static str, AppError>::new(|_token| async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            Ok("fast")
        })
        .timeout_millis(1000);
        assert_eq!(fast.result().await, Ok("fast"));

        let unwound = Arc::new(AtomicBool::new(false));
        let flag = unwound.clone();
        let slow = Work::<&'static str, AppError>::new(move |_token| async move {
            let guard = SetOnDrop(flag);
            tokio::time::sleep(Duration::from_millis(1000)).await;
            std::mem::forget(guard);
            Ok("slow")
        })
        .timeout_millis(10);

        let start = Instant::now();
        let outcome = slow.result().await;

        assert_eq!(
            outcome,
            Err(WorkError::Timeout {
                after: Duration::from_millis(10)
            })
        );
        assert!(start.elapsed() < Duration::from_millis(100));
        assert!(unwound.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_reaches_innermost_source() {
        let unwound = Arc::new(AtomicBool::new(false));
        let flag = unwound.clone();

        let unit = Work::<u32, AppError>::new(move |_token| async move {
            let guard = SetOnDrop(flag);
            tokio::time::sleep(Duration::from_secs(60)).await;
            std::mem::forget(guard);
            Ok(1)
        })
        .map(|n| n + 1)
        .map_err(|_| AppError::Fallback)
        .delay_after(Duration::from_millis(1))
        .timeout(Duration::from_secs(120))
        .encode(JsonSerializer::new());

        let handle = unit.operation();
        tokio::time::sleep(Duration::from_millis(10)).await;
        unit.cancel();

        assert_eq!(handle.await, Err(WorkError::Cancelled));
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(unwound.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_becomes_domain_error_and_recovers() {
        let unit = Work::<u32, AppError>::new(|_token| async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(1)
        })
        .timeout(Duration::from_millis(50))
        .map_timeout(|_| AppError::Fallback)
        .recover(|e| if e == AppError::Fallback { 0 } else { 99 });

        assert_eq!(unit.result().await, Ok(0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_with_timeouts_per_attempt() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let policy = RetryPolicy::new()
            .with_max_attempts(3)
            .with_first_delay(Duration::from_millis(5))
            .with_retry_timeouts(true);

        let unit = Retry::new(policy, move || {
            let attempt = counter.fetch_add(1, Ordering::SeqCst) + 1;
            Work::<usize, AppError>::new(move |_token| async move {
                // Only the last attempt is fast enough.
                let wait = if attempt < 3 { 500 } else { 1 };
                tokio::time::sleep(Duration::from_millis(wait)).await;
                Ok(attempt)
            })
            .timeout(Duration::from_millis(20))
        });

        assert_eq!(unit.result().await, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_boxed_chain_keeps_semantics() {
        let unit = Work::<u32, AppError>::ok(2)
            .map(|n| n * 10)
            .boxed()
            .map(|n| vec![n])
            .encode(JsonSerializer::new())
            .boxed();

        assert_eq!(unit.result().await, Ok(b"[20]".to_vec()));
    }
}
