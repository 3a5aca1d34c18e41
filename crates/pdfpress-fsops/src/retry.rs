//! Bounded retry with backoff for operations that hit transient locks.
//!
//! # Design
//! - One combinator drives both relocation (linear backoff) and copy
//!   (exponential backoff).
//! - The caller classifies errors and decides what to report for each retry.

use std::future::Future;
use std::io;
use std::time::Duration;

use tokio::time::sleep;

/// Delay unit for copy retries.
pub const COPY_BASE_DELAY: Duration = Duration::from_millis(200);

/// Delay growth between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// `base × k` after the k-th failure.
    Linear,
    /// `base × 2^(k-1)` after the k-th failure.
    Exponential,
}

/// Attempt budget and delay schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay unit.
    pub base_delay: Duration,
    /// Growth strategy.
    pub backoff: Backoff,
}

impl RetryPolicy {
    /// Relocation schedule: 5 attempts, 1 s, 2 s, 3 s, 4 s apart.
    pub const RELOCATION: Self = Self {
        max_attempts: 5,
        base_delay: Duration::from_millis(1_000),
        backoff: Backoff::Linear,
    };

    /// Copy schedule: 200 ms doubling per retry.
    #[must_use]
    pub const fn copy(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: COPY_BASE_DELAY,
            backoff: Backoff::Exponential,
        }
    }

    /// Same schedule with a different delay unit.
    #[must_use]
    pub const fn with_base_delay(self, base_delay: Duration) -> Self {
        Self { base_delay, ..self }
    }

    /// Delay after the `attempt`-th failure (1-based).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let attempt = attempt.max(1);
        match self.backoff {
            Backoff::Linear => self.base_delay.saturating_mul(attempt),
            Backoff::Exponential => {
                let factor = 1_u32.checked_shl(attempt - 1).unwrap_or(u32::MAX);
                self.base_delay.saturating_mul(factor)
            }
        }
    }
}

/// Terminal failure from [`retry_with_backoff`].
#[derive(Debug)]
pub struct RetryFailure<E> {
    /// Attempts made.
    pub attempts: u32,
    /// Error from the final attempt.
    pub error: E,
    /// `true` when the budget ran out on retryable errors.
    pub exhausted: bool,
}

/// Run `op` until it succeeds, fails with an error `is_retryable` rejects, or
/// the attempt budget runs out.
///
/// `on_retry(err, attempt, delay)` fires before each backoff sleep.
///
/// # Errors
///
/// Returns the last error wrapped in [`RetryFailure`].
pub async fn retry_with_backoff<T, E, F, Fut, R, O>(
    policy: &RetryPolicy,
    is_retryable: R,
    mut on_retry: O,
    mut op: F,
) -> Result<T, RetryFailure<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    R: Fn(&E) -> bool,
    O: FnMut(&E, u32, Duration),
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        let error = match op().await {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };
        if !is_retryable(&error) {
            return Err(RetryFailure {
                attempts: attempt,
                error,
                exhausted: false,
            });
        }
        if attempt >= max_attempts {
            return Err(RetryFailure {
                attempts: attempt,
                error,
                exhausted: true,
            });
        }
        let delay = policy.delay_for(attempt);
        on_retry(&error, attempt, delay);
        sleep(delay).await;
        attempt += 1;
    }
}

/// Errors that indicate another process holds the file.
#[must_use]
pub fn is_lock_error(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::PermissionDenied | io::ErrorKind::ResourceBusy
    ) || is_windows_sharing_violation(err)
}

#[cfg(windows)]
fn is_windows_sharing_violation(err: &io::Error) -> bool {
    // ERROR_SHARING_VIOLATION, ERROR_LOCK_VIOLATION
    matches!(err.raw_os_error(), Some(32 | 33))
}

#[cfg(not(windows))]
const fn is_windows_sharing_violation(_err: &io::Error) -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    const FAST: Duration = Duration::from_millis(1);

    #[test]
    fn linear_schedule_grows_by_base() {
        let policy = RetryPolicy::RELOCATION;
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(4), Duration::from_secs(4));
    }

    #[test]
    fn exponential_schedule_doubles() {
        let policy = RetryPolicy::copy(3);
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(2), Duration::from_millis(400));
        assert_eq!(policy.delay_for(3), Duration::from_millis(800));
        assert_eq!(policy.delay_for(64), Duration::from_millis(200).saturating_mul(u32::MAX));
    }

    #[test]
    fn lock_errors_are_classified() {
        assert!(is_lock_error(&io::Error::from(io::ErrorKind::PermissionDenied)));
        assert!(is_lock_error(&io::Error::from(io::ErrorKind::ResourceBusy)));
        assert!(!is_lock_error(&io::Error::from(io::ErrorKind::NotFound)));
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::RELOCATION.with_base_delay(FAST);
        let counter = calls.clone();
        let result = retry_with_backoff(
            &policy,
            is_lock_error,
            |_, _, _| {},
            || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(io::Error::from(io::ErrorKind::PermissionDenied))
                    } else {
                        Ok(7)
                    }
                }
            },
        )
        .await;

        assert_eq!(result.expect("third attempt succeeds"), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn stops_on_non_retryable_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::RELOCATION.with_base_delay(FAST);
        let counter = calls.clone();
        let failure = retry_with_backoff(
            &policy,
            is_lock_error,
            |_, _, _| {},
            || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(io::Error::from(io::ErrorKind::NotFound)) }
            },
        )
        .await
        .expect_err("not found is terminal");

        assert!(!failure.exhausted);
        assert_eq!(failure.attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhausts_budget_on_persistent_lock() {
        let policy = RetryPolicy::copy(3).with_base_delay(FAST);
        let mut retries = Vec::new();
        let failure = retry_with_backoff(
            &policy,
            is_lock_error,
            |_, attempt, delay| retries.push((attempt, delay)),
            || async { Err::<(), _>(io::Error::from(io::ErrorKind::PermissionDenied)) },
        )
        .await
        .expect_err("lock never clears");

        assert!(failure.exhausted);
        assert_eq!(failure.attempts, 3);
        assert_eq!(retries, vec![(1, FAST), (2, FAST * 2)]);
    }
}
