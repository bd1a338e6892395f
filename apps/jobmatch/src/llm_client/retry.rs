//! Bounded retry policy shared by the Gemini clients and the embedding pre-filter.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// At most `max_retries` extra attempts, each after the same fixed `backoff`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    /// A single retry after a fixed delay.
    pub const fn once_after(delay: Duration) -> Self {
        Self {
            max_retries: 1,
            backoff: delay,
        }
    }

    /// Runs `op` until it succeeds, the error is not retryable, or the retry budget is spent.
    /// The last error is returned unchanged.
    pub async fn run<T, E, F, Fut>(
        &self,
        label: &str,
        mut op: F,
        is_retryable: impl Fn(&E) -> bool,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let mut retries = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if retries < self.max_retries && is_retryable(&e) => {
                    retries += 1;
                    let delay = self.backoff;
                    warn!(
                        "{label} attempt {} failed ({e}), retrying after {}ms...",
                        retries,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
