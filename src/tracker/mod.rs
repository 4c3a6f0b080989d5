//! Tracking stage: registration + status retrieval
//!
//! Distinct numbers are registered in provider-sized chunks, then status is
//! fetched for everything that registered cleanly. Status chunks run through
//! a bounded worker pool; registration stays sequential because it is one
//! cheap call per chunk. Per-number rejections become recorded errors, quota
//! and auth problems abort the run.

use futures::stream::{self, StreamExt};
use log::{info, warn};
use std::collections::HashMap;

use crate::api::error::{ApiError, ApiService};
use crate::api::resilience::{ConcurrencyLimiter, ResilienceConfig};
use crate::api::track::TrackingApi;
use crate::batch::ShipmentStatus;

/// One outcome per queried number: status or the recorded failure reason
pub type StatusMap = HashMap<String, Result<ShipmentStatus, String>>;

/// Register `numbers` and fetch their status. The returned map has an entry
/// for every input number that produced a reply; callers treat absent
/// entries as per-record failures.
pub async fn collect_status(
    api: &dyn TrackingApi,
    resilience: &ResilienceConfig,
    numbers: &[String],
) -> Result<StatusMap, ApiError> {
    let mut outcomes = StatusMap::new();
    if numbers.is_empty() {
        return Ok(outcomes);
    }

    let chunk_size = resilience.batch.max_numbers_per_call.max(1);
    let mut queryable: Vec<String> = Vec::with_capacity(numbers.len());
    let mut newly_registered = 0usize;
    let mut already_registered = 0usize;

    for chunk in numbers.chunks(chunk_size) {
        let reply = api.register(chunk).await?;
        newly_registered += reply.accepted.len();
        queryable.extend(reply.accepted);

        for rejection in reply.rejected {
            if rejection.already_registered() {
                // Idempotent registration: an existing registration is success
                already_registered += 1;
                queryable.push(rejection.number);
            } else if rejection.quota_exceeded() {
                return Err(ApiError::Quota {
                    service: ApiService::Tracking,
                    message: rejection.message,
                });
            } else {
                warn!(
                    "registration rejected for {}: {}",
                    rejection.number, rejection.message
                );
                outcomes.insert(
                    rejection.number,
                    Err(format!("registration rejected: {}", rejection.message)),
                );
            }
        }
    }

    info!(
        "registered {newly_registered} number(s), {already_registered} already registered, \
         {} rejected",
        outcomes.len()
    );

    let limiter = ConcurrencyLimiter::new(resilience.concurrency.clone());
    let max_in_flight = limiter.max_concurrent_requests().max(1);

    let mut replies = stream::iter(queryable.chunks(chunk_size).map(|chunk| {
        let limiter = limiter.clone();
        let chunk = chunk.to_vec();
        async move {
            let _permit = limiter.acquire().await;
            api.get_status(&chunk).await
        }
    }))
    .buffer_unordered(max_in_flight);

    while let Some(reply) = replies.next().await {
        let reply = reply?;
        for status in reply.accepted {
            outcomes.insert(status.tracking_number.clone(), Ok(status));
        }
        for rejection in reply.rejected {
            if rejection.quota_exceeded() {
                return Err(ApiError::Quota {
                    service: ApiService::Tracking,
                    message: rejection.message,
                });
            }
            warn!(
                "status lookup failed for {}: {}",
                rejection.number, rejection.message
            );
            outcomes.insert(rejection.number, Err(rejection.message));
        }
    }

    let retrieved = outcomes.values().filter(|o| o.is_ok()).count();
    info!(
        "retrieved status for {retrieved}/{} distinct number(s)",
        numbers.len()
    );
    Ok(outcomes)
}
