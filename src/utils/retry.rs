//! Retry utilities with exponential backoff for backend calls.

use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout};

use crate::client::BackendError;

/// Configuration for retry behavior
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,
    /// Initial delay between retries
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
    /// Bound on every single attempt
    pub attempt_timeout: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(2),
            backoff_multiplier: 2.0,
            attempt_timeout: Duration::from_secs(15),
        }
    }
}

impl RetryConfig {
    /// A policy that never retries
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Set the maximum number of attempts
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Set the per-attempt timeout
    pub fn attempt_timeout(mut self, limit: Duration) -> Self {
        self.attempt_timeout = limit;
        self
    }

    /// Backoff before attempt `attempt + 1`, where `attempt` starts at 1
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exp = self.initial_delay.as_secs_f64()
            * self
                .backoff_multiplier
                .powf(attempt.saturating_sub(1) as f64);
        Duration::from_secs_f64(exp.min(self.max_delay.as_secs_f64()))
    }
}

/// Execute an async operation with per-attempt timeout and retry on transient errors
///
/// A timed-out attempt counts as [`BackendError::Timeout`], which is transient.
pub async fn with_retry<T, F, Fut>(config: RetryConfig, operation: F) -> Result<T, BackendError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, BackendError>>,
{
    let mut attempts = 0;
    let mut operation = operation;

    loop {
        attempts += 1;

        let error = match timeout(config.attempt_timeout, operation()).await {
            Ok(Ok(result)) => {
                if attempts > 1 {
                    tracing::info!(
                        "Request succeeded on attempt {} after {} transient failures",
                        attempts,
                        attempts - 1
                    );
                }
                return Ok(result);
            }
            Ok(Err(error)) => error,
            Err(_) => BackendError::Timeout,
        };

        if !error.is_transient() {
            return Err(error);
        }

        if attempts >= config.max_attempts {
            tracing::warn!("Request failed after {} attempts: {}", attempts, error);
            return Err(error);
        }

        let delay = config.delay_after(attempts);
        tracing::debug!(
            "Transient error on attempt {}: {}, retrying in {:?}",
            attempts,
            error,
            delay
        );
        sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn quick() -> RetryConfig {
        RetryConfig {
            max_attempts: 4,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(100),
            backoff_multiplier: 2.0,
            attempt_timeout: Duration::from_secs(1),
        }
    }

    #[tokio::test]
    async fn test_retry_success_first_try() {
        let call_count = Rc::new(RefCell::new(0));

        let result = {
            let call_count = call_count.clone();
            with_retry(RetryConfig::default(), move || {
                let call_count = call_count.clone();
                async move {
                    *call_count.borrow_mut() += 1;
                    Ok("success")
                }
            })
        }
        .await;

        assert_eq!(result.unwrap(), "success");
        assert_eq!(*call_count.borrow(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_success_after_failures() {
        let call_count = Rc::new(RefCell::new(0));

        let result = {
            let call_count = call_count.clone();
            with_retry(quick(), move || {
                let call_count = call_count.clone();
                async move {
                    *call_count.borrow_mut() += 1;
                    if *call_count.borrow() < 3 {
                        Err(BackendError::Network("temporary error".to_string()))
                    } else {
                        Ok("success")
                    }
                }
            })
        }
        .await;

        assert_eq!(result.unwrap(), "success");
        assert_eq!(*call_count.borrow(), 3);
    }

    #[tokio::test]
    async fn test_retry_returns_permanent_error() {
        let call_count = Rc::new(RefCell::new(0));

        let result: Result<&str, BackendError> = {
            let call_count = call_count.clone();
            with_retry(quick(), move || {
                let call_count = call_count.clone();
                async move {
                    *call_count.borrow_mut() += 1;
                    Err(BackendError::Parse("invalid json".to_string()))
                }
            })
        }
        .await;

        assert!(matches!(result, Err(BackendError::Parse(_))));
        assert_eq!(*call_count.borrow(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_gives_up_after_max_attempts() {
        let call_count = Rc::new(RefCell::new(0));

        let result: Result<(), BackendError> = {
            let call_count = call_count.clone();
            with_retry(quick().max_attempts(2), move || {
                let call_count = call_count.clone();
                async move {
                    *call_count.borrow_mut() += 1;
                    Err(BackendError::Status {
                        status: 502,
                        message: "bad gateway".to_string(),
                    })
                }
            })
        }
        .await;

        assert!(matches!(result, Err(BackendError::Status { status: 502, .. })));
        assert_eq!(*call_count.borrow(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempt_timeout_maps_to_timeout_error() {
        let config = RetryConfig::no_retry().attempt_timeout(Duration::from_secs(15));

        let result: Result<(), BackendError> = with_retry(config, || async {
            sleep(Duration::from_secs(60)).await;
            Ok(())
        })
        .await;

        assert_eq!(result, Err(BackendError::Timeout));
    }

    #[test]
    fn test_backoff_is_capped() {
        let config = quick();
        assert_eq!(config.delay_after(1), Duration::from_millis(10));
        assert_eq!(config.delay_after(2), Duration::from_millis(20));
        assert_eq!(config.delay_after(3), Duration::from_millis(40));
        assert_eq!(config.delay_after(10), Duration::from_millis(100));
    }
}
