//! Exponential backoff retry wrapper, sync and async forms (§4.I).

use std::time::Duration;

use crate::error::QError;

/// `(max_retries, base_delay, max_delay, backoff_factor, retryable_error_kinds)`
/// (§6 Retry-policy API).
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff_factor: f64,
    /// Overrides [`QError::is_retryable`] when set; `None` uses the
    /// default retryable set.
    pub is_retryable: Option<fn(&QError) -> bool>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
            backoff_factor: 2.0,
            is_retryable: None,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_retries: u32, base_delay: Duration, max_delay: Duration, backoff_factor: f64) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
            backoff_factor,
            is_retryable: None,
        }
    }

    fn accepts(&self, err: &QError) -> bool {
        match self.is_retryable {
            Some(f) => f(err),
            None => err.is_retryable(),
        }
    }

    /// `delay(attempt) = min(base * factor^attempt, max_delay)`, `attempt` zero-indexed.
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        let scaled = self.base_delay.as_secs_f64() * self.backoff_factor.powi(attempt as i32);
        Duration::from_secs_f64(scaled.min(self.max_delay.as_secs_f64()))
    }
}

/// Runs `func`, retrying on retryable errors with backoff. `reconnect`
/// is called before each retry attempt (not on the final failure).
/// Matches `retry.py`'s `range(max_retries + 1)` attempt-count semantics:
/// `max_retries = 3` means exactly 4 attempts.
pub fn retry_sync<T>(
    policy: &RetryPolicy,
    mut func: impl FnMut() -> Result<T, QError>,
    mut reconnect: impl FnMut() -> Result<(), QError>,
) -> Result<T, QError> {
    let mut attempt = 0;
    loop {
        match func() {
            Ok(v) => return Ok(v),
            Err(e) if policy.accepts(&e) && attempt < policy.max_retries => {
                reconnect()?;
                std::thread::sleep(policy.delay(attempt));
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(feature = "async")]
pub mod r#async {
    use std::future::Future;

    use super::RetryPolicy;
    use crate::error::QError;

    /// Async counterpart of [`super::retry_sync`].
    pub async fn retry_async<T, Fut, ReFut>(
        policy: &RetryPolicy,
        mut func: impl FnMut() -> Fut,
        mut reconnect: impl FnMut() -> ReFut,
    ) -> Result<T, QError>
    where
        Fut: Future<Output = Result<T, QError>>,
        ReFut: Future<Output = Result<(), QError>>,
    {
        let mut attempt = 0;
        loop {
            match func().await {
                Ok(v) => return Ok(v),
                Err(e) if policy.accepts(&e) && attempt < policy.max_retries => {
                    reconnect().await?;
                    tokio::time::sleep(policy.delay(attempt)).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn delay_grows_exponentially_and_caps() {
        let policy = RetryPolicy {
            max_retries: 5,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(1),
            backoff_factor: 2.0,
            is_retryable: None,
        };
        assert_eq!(policy.delay(0), Duration::from_millis(100));
        assert_eq!(policy.delay(1), Duration::from_millis(200));
        assert_eq!(policy.delay(2), Duration::from_millis(400));
        assert_eq!(policy.delay(10), Duration::from_secs(1));
    }

    #[test]
    fn retries_exactly_max_retries_plus_one_attempts() {
        let policy = RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(0),
            max_delay: Duration::from_millis(0),
            backoff_factor: 1.0,
            is_retryable: None,
        };
        let mut attempts = 0;
        let result: Result<(), QError> = retry_sync(
            &policy,
            || {
                attempts += 1;
                Err(QError::ConnectionClosed { addr: "h:1".into() })
            },
            || Ok(()),
        );
        assert!(result.is_err());
        assert_eq!(attempts, 4);
    }

    #[test]
    fn succeeds_without_retry_on_first_try() {
        let policy = RetryPolicy::default();
        let mut attempts = 0;
        let result = retry_sync(
            &policy,
            || {
                attempts += 1;
                Ok::<_, QError>(42)
            },
            || Ok(()),
        );
        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts, 1);
    }

    #[test]
    fn non_retryable_errors_pass_through_immediately() {
        let policy = RetryPolicy::default();
        let mut attempts = 0;
        let result: Result<(), QError> = retry_sync(
            &policy,
            || {
                attempts += 1;
                Err(QError::Query("syntax error".into()))
            },
            || Ok(()),
        );
        assert!(result.is_err());
        assert_eq!(attempts, 1);
    }
}
