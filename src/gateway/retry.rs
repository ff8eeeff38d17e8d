//! Bounded retry with linear backoff, raced against an overall deadline.
//!
//! Both pieces are independent of the call they wrap: `op` is any closure that
//! produces a fresh future per attempt.

use std::future::Future;
use std::time::Duration;

use super::GatewayError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Attempt `n` that fails with a retriable error waits `n * base_delay`.
    pub base_delay: Duration,
    /// Upper bound for the whole retrying operation.
    pub deadline: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            deadline: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }
}

pub async fn retry_with_backoff<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, GatewayError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, GatewayError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) => {
                log::warn!("model call attempt {attempt}/{max_attempts} failed: {e}");
                if attempt >= max_attempts || !e.is_retriable() {
                    return Err(e);
                }
                let wait = policy.backoff_for(attempt);
                log::info!("retrying model call in {}ms", wait.as_millis());
                tokio::time::sleep(wait).await;
                attempt += 1;
            }
        }
    }
}

/// Fails with [`GatewayError::Timeout`] when `fut` is still pending after `deadline`.
pub async fn with_deadline<T, Fut>(deadline: Duration, fut: Fut) -> Result<T, GatewayError>
where
    Fut: Future<Output = Result<T, GatewayError>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(GatewayError::Timeout(deadline)),
    }
}

pub async fn run<T, F, Fut>(policy: &RetryPolicy, op: F) -> Result<T, GatewayError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, GatewayError>>,
{
    with_deadline(policy.deadline, retry_with_backoff(policy, op)).await
}
