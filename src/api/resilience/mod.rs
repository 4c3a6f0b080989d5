//! Retry, rate-limiting, and concurrency control for the API clients

pub mod concurrency;
pub mod config;
pub mod rate_limiter;
pub mod retry;

pub use concurrency::ConcurrencyLimiter;
pub use config::{BatchConfig, ConcurrencyConfig, RateLimitConfig, ResilienceConfig, RetryConfig};
pub use rate_limiter::RateLimiter;
pub use retry::RetryPolicy;
