//! Bounded retry with exponential backoff
//!
//! Only transient [`ApiError`]s are retried; fatal classifications surface
//! immediately. When the retry budget runs out the last transient error is
//! returned and the caller treats it as fatal.

use log::{debug, warn};
use std::future::Future;

use super::config::RetryConfig;
use crate::api::error::ApiError;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Run `operation`, retrying transient failures up to the configured
    /// budget with exponential backoff between attempts.
    pub async fn execute<T, F, Fut>(&self, name: &str, mut operation: F) -> Result<T, ApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let mut attempt: u32 = 0;
        loop {
            match operation().await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!("{name}: succeeded on retry {attempt}");
                    }
                    return Ok(value);
                }
                Err(err) if err.is_transient() && attempt < self.config.max_retries => {
                    attempt += 1;
                    let backoff = self.config.backoff_for(attempt);
                    warn!(
                        "{name}: transient failure ({err}), retry {attempt}/{} in {:?}",
                        self.config.max_retries, backoff
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(err) => {
                    if err.is_transient() {
                        warn!(
                            "{name}: retry budget exhausted after {} attempts",
                            attempt + 1
                        );
                    }
                    return Err(err);
                }
            }
        }
    }
}
