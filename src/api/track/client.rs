//! HTTP client for the tracking provider
//!
//! Both endpoints take `[{"number": ...}, ...]` with the API key in a
//! provider-specific header and answer with accepted/rejected lists. Calls
//! go through the retry policy and rate limiter; classification of non-2xx
//! responses lives in [`ApiError::from_response`].

use async_trait::async_trait;
use log::debug;
use std::time::Duration;

use super::models::Envelope;
use super::{RegisterReply, Rejection, StatusReply, TrackingApi};
use crate::api::error::{ApiError, ApiService};
use crate::api::resilience::{RateLimiter, ResilienceConfig, RetryPolicy};

const API_KEY_HEADER: &str = "17token";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for the tracking provider
#[derive(Debug, Clone)]
pub struct TrackConfig {
    pub api_key: String,
    pub base_url: String,
}

impl TrackConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://api.17track.net/track/v2.2".to_string(),
        }
    }
}

pub struct TrackClient {
    http: reqwest::Client,
    config: TrackConfig,
    retry: RetryPolicy,
    rate_limiter: RateLimiter,
}

impl TrackClient {
    pub fn new(config: TrackConfig, resilience: &ResilienceConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ApiError::network(ApiService::Tracking, e))?;
        Ok(Self {
            http,
            config,
            retry: RetryPolicy::new(resilience.retry.clone()),
            rate_limiter: RateLimiter::new(resilience.rate_limit.clone()),
        })
    }

    async fn post_numbers(&self, endpoint: &str, numbers: &[String]) -> Result<Envelope, ApiError> {
        let url = format!("{}/{}", self.config.base_url.trim_end_matches('/'), endpoint);
        let payload: Vec<_> = numbers
            .iter()
            .map(|n| serde_json::json!({ "number": n }))
            .collect();

        self.retry
            .execute(endpoint, || {
                let url = url.clone();
                let payload = payload.clone();
                async move {
                    self.rate_limiter.acquire().await;
                    debug!("POST {} ({} numbers)", url, numbers.len());

                    let response = self
                        .http
                        .post(&url)
                        .header(API_KEY_HEADER, &self.config.api_key)
                        .json(&payload)
                        .send()
                        .await
                        .map_err(|e| ApiError::network(ApiService::Tracking, e))?;

                    if !response.status().is_success() {
                        return Err(ApiError::from_response(ApiService::Tracking, response).await);
                    }

                    response
                        .json::<Envelope>()
                        .await
                        .map_err(|e| ApiError::payload(ApiService::Tracking, e.to_string()))
                }
            })
            .await
    }
}

fn rejections(envelope: &mut Envelope) -> Vec<Rejection> {
    envelope
        .data
        .rejected
        .drain(..)
        .map(|r| Rejection {
            number: r.number,
            code: r.error.code,
            message: r.error.message,
        })
        .collect()
}

#[async_trait]
impl TrackingApi for TrackClient {
    async fn register(&self, numbers: &[String]) -> Result<RegisterReply, ApiError> {
        if numbers.is_empty() {
            return Ok(RegisterReply::default());
        }
        let mut envelope = self.post_numbers("register", numbers).await?;
        let rejected = rejections(&mut envelope);
        let accepted = envelope
            .data
            .accepted
            .into_iter()
            .map(|item| item.number)
            .collect();
        Ok(RegisterReply { accepted, rejected })
    }

    async fn get_status(&self, numbers: &[String]) -> Result<StatusReply, ApiError> {
        if numbers.is_empty() {
            return Ok(StatusReply::default());
        }
        let mut envelope = self.post_numbers("gettrackinfo", numbers).await?;
        let rejected = rejections(&mut envelope);
        let accepted = envelope
            .data
            .accepted
            .into_iter()
            .map(|item| item.into_status())
            .collect();
        Ok(StatusReply { accepted, rejected })
    }
}
