//! Semaphore-based limiter for concurrent status lookups
//!
//! Concurrent retrieval is a throughput optimization, not a correctness
//! requirement, so the limiter stays simple: a bounded permit pool that the
//! worker pool drains, with an effectively unlimited pool when disabled.

use log::debug;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use super::config::ConcurrencyConfig;

#[derive(Debug, Clone)]
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    config: ConcurrencyConfig,
}

impl ConcurrencyLimiter {
    pub fn new(config: ConcurrencyConfig) -> Self {
        let permits = if config.enabled {
            config.max_concurrent_requests
        } else {
            // Large but valid when disabled (Tokio Semaphore max is 2^61-1)
            1_000_000
        };
        Self {
            semaphore: Arc::new(Semaphore::new(permits)),
            config,
        }
    }

    /// Acquire a permit, waiting if at capacity. The permit releases on drop.
    pub async fn acquire(&self) -> OwnedSemaphorePermit {
        if self.config.enabled && self.semaphore.available_permits() == 0 {
            debug!(
                "concurrency limiter: waiting for permit ({} in use)",
                self.config.max_concurrent_requests
            );
        }
        // The semaphore is never closed, so acquire cannot fail
        self.semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("semaphore closed")
    }

    pub fn max_concurrent_requests(&self) -> usize {
        self.config.max_concurrent_requests
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn permits_are_bounded_and_released() {
        let limiter = ConcurrencyLimiter::new(ConcurrencyConfig {
            max_concurrent_requests: 2,
            enabled: true,
        });

        let p1 = limiter.acquire().await;
        let _p2 = limiter.acquire().await;
        assert_eq!(limiter.semaphore.available_permits(), 0);

        drop(p1);
        assert_eq!(limiter.semaphore.available_permits(), 1);
    }

    #[tokio::test]
    async fn waiter_proceeds_after_release() {
        let limiter = ConcurrencyLimiter::new(ConcurrencyConfig {
            max_concurrent_requests: 1,
            enabled: true,
        });

        let permit = limiter.acquire().await;
        let limiter2 = limiter.clone();
        let handle = tokio::spawn(async move {
            let _p = limiter2.acquire().await;
        });

        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        drop(permit);

        tokio::time::timeout(std::time::Duration::from_millis(100), handle)
            .await
            .expect("waiter should complete")
            .unwrap();
    }
}
