//! Resilience configuration with sane defaults
//!
//! One struct bundles the retry, rate-limit, concurrency, and batching knobs
//! the external clients consume. Defaults follow the tracking provider's
//! documented limits; nothing numeric is hard-coded at call sites.

use std::time::Duration;

/// Global resilience configuration for external API operations
#[derive(Debug, Clone, Default)]
pub struct ResilienceConfig {
    pub retry: RetryConfig,
    pub rate_limit: RateLimitConfig,
    pub concurrency: ConcurrencyConfig,
    pub batch: BatchConfig,
}

/// Bounded-retry policy configuration
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Attempts after the first failure
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    /// Backoff multiplier between attempts
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(15),
            multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Backoff before the given retry attempt (1-based), capped at max_backoff
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exp = self.multiplier.powi(attempt.saturating_sub(1) as i32);
        let backoff = self.initial_backoff.mul_f64(exp);
        backoff.min(self.max_backoff)
    }
}

/// Token-bucket rate limiting configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub requests_per_second: u32,
    pub burst_capacity: u32,
    pub enabled: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            // Conservative: the tracking provider allows 3 req/s
            requests_per_second: 2,
            burst_capacity: 4,
            enabled: true,
        }
    }
}

/// Concurrent in-flight request limiting
#[derive(Debug, Clone)]
pub struct ConcurrencyConfig {
    pub max_concurrent_requests: usize,
    pub enabled: bool,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: 4,
            enabled: true,
        }
    }
}

/// Provider batching constraints
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Maximum tracking numbers accepted per register/status call
    /// (17track v2.2 documents 40)
    pub max_numbers_per_call: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_numbers_per_call: 40,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_and_caps() {
        let config = RetryConfig {
            max_retries: 5,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_millis(350),
            multiplier: 2.0,
        };
        assert_eq!(config.backoff_for(1), Duration::from_millis(100));
        assert_eq!(config.backoff_for(2), Duration::from_millis(200));
        assert_eq!(config.backoff_for(3), Duration::from_millis(350));
        assert_eq!(config.backoff_for(10), Duration::from_millis(350));
    }

    #[test]
    fn defaults_are_bounded() {
        let config = ResilienceConfig::default();
        assert!(config.retry.max_retries > 0);
        assert!(config.batch.max_numbers_per_call > 0);
    }
}
