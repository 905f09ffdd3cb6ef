//! Exponential backoff for transient generation failures

use super::{GenerationClient, GenerationError, GenerationRequest};
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

/// How many times to retry and how long to wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,

    /// Delay before the first retry
    pub initial_backoff: Duration,

    /// Factor applied to the delay after each retry
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(1000),
            multiplier: 2,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (zero-based)
    pub fn backoff(&self, retry: u32) -> Duration {
        self.initial_backoff * self.multiplier.saturating_pow(retry)
    }

    /// Sum of every delay the policy can wait
    pub fn total_backoff(&self) -> Duration {
        (0..self.max_retries).map(|retry| self.backoff(retry)).sum()
    }
}

/// Run `operation`, retrying transient failures with exponential backoff
///
/// Non-transient errors are returned immediately; a transient error is
/// returned once the retries are used up.
pub async fn call_with_retry<T, F, Fut>(policy: RetryPolicy, mut operation: F) -> Result<T, GenerationError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GenerationError>>,
{
    let mut retry = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && retry < policy.max_retries => {
                let delay = policy.backoff(retry);
                log::warn!(
                    "Generation service busy, retrying in {}ms ({} attempt(s) left): {}",
                    delay.as_millis(),
                    policy.max_retries - retry,
                    e
                );
                tokio::time::sleep(delay).await;
                retry += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// A client decorator that retries transient failures
pub struct RetryingClient<C> {
    inner: C,
    policy: RetryPolicy,
}

impl<C: GenerationClient> RetryingClient<C> {
    pub fn new(inner: C, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

#[async_trait]
impl<C: GenerationClient> GenerationClient for RetryingClient<C> {
    async fn generate_text(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        call_with_retry(self.policy, || self.inner.generate_text(request)).await
    }

    async fn generate_list(&self, request: &GenerationRequest) -> Result<Vec<String>, GenerationError> {
        call_with_retry(self.policy, || self.inner.generate_list(request)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(0), Duration::from_millis(1000));
        assert_eq!(policy.backoff(2), Duration::from_millis(4000));
        assert_eq!(policy.total_backoff(), Duration::from_millis(7000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminal_error_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = call_with_retry(RetryPolicy::default(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(GenerationError::InvalidCredential("API_KEY_INVALID".to_string())) }
        })
        .await;
        assert!(matches!(result, Err(GenerationError::InvalidCredential(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_error_exhausts_retries() {
        let calls = AtomicU32::new(0);
        let start = tokio::time::Instant::now();
        let result: Result<(), _> = call_with_retry(RetryPolicy::default(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(GenerationError::Overloaded("503".to_string())) }
        })
        .await;
        assert!(result.unwrap_err().is_transient());
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(7000));
        assert!(elapsed < Duration::from_millis(7050));
    }
}
