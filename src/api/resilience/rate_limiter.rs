//! Token-bucket rate limiter for outbound API calls
//!
//! Keeps the request rate under the provider's documented ceiling. Tokens
//! refill continuously; `acquire` waits just long enough for the next token
//! instead of failing, so callers never see a rate error from this side.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use super::config::RateLimitConfig;

#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    state: Arc<Mutex<BucketState>>,
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        let state = BucketState {
            tokens: config.burst_capacity as f64,
            last_refill: Instant::now(),
        };
        Self {
            config,
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Wait until a request may be sent
    pub async fn acquire(&self) {
        if !self.config.enabled {
            return;
        }

        loop {
            let wait = {
                let mut state = self.state.lock().await;
                self.refill(&mut state);
                if state.tokens >= 1.0 {
                    state.tokens -= 1.0;
                    None
                } else {
                    // Time until one full token accrues
                    let deficit = 1.0 - state.tokens;
                    let secs = deficit / self.config.requests_per_second.max(1) as f64;
                    Some(Duration::from_secs_f64(secs))
                }
            };

            match wait {
                None => return,
                Some(d) => tokio::time::sleep(d).await,
            }
        }
    }

    fn refill(&self, state: &mut BucketState) {
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.config.requests_per_second as f64)
            .min(self.config.burst_capacity as f64);
        state.last_refill = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_limiter_never_waits() {
        let limiter = RateLimiter::new(RateLimitConfig {
            requests_per_second: 1,
            burst_capacity: 1,
            enabled: false,
        });
        let start = Instant::now();
        for _ in 0..50 {
            limiter.acquire().await;
        }
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn burst_is_honored_then_throttled() {
        let limiter = RateLimiter::new(RateLimitConfig {
            requests_per_second: 100,
            burst_capacity: 3,
            enabled: true,
        });
        let start = Instant::now();
        // Burst drains instantly
        for _ in 0..3 {
            limiter.acquire().await;
        }
        assert!(start.elapsed() < Duration::from_millis(20));
        // The fourth request waits for a refill
        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(5));
    }
}
