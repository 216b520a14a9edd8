//! Retry with exponential backoff for transient failures.

use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::error::ApiError;

const MAX_DELAY: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
  /// Attempts after the first one
  pub retries: u32,
  pub base_delay: Duration,
  pub max_delay: Duration,
}

impl RetryPolicy {
  pub fn new(retries: u32, base_delay: Duration) -> Self {
    Self {
      retries,
      base_delay,
      max_delay: MAX_DELAY,
    }
  }

  /// Delay before retry number `attempt` (0-based): `base * 2^attempt`, capped.
  pub fn delay_for(&self, attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt);
    self.base_delay.saturating_mul(factor).min(self.max_delay)
  }

  /// Run `operation` until it succeeds, fails with a non-retryable error,
  /// or the retries run out. `Auth` failures are returned immediately.
  pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T, ApiError>
  where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
  {
    let mut attempt = 0;
    loop {
      match operation().await {
        Ok(value) => return Ok(value),
        Err(e) if attempt < self.retries && e.is_retryable() => {
          let delay = self.delay_for(attempt);
          warn!(error = %e, attempt = attempt + 1, delay_ms = delay.as_millis() as u64, "retrying");
          tokio::time::sleep(delay).await;
          attempt += 1;
        }
        Err(e) => return Err(e),
      }
    }
  }
}
