//! Tracking provider interface
//!
//! The provider exposes a two-phase protocol: numbers must be registered
//! before status can be fetched. Both calls take a batch of numbers and
//! answer with per-number accept/reject lists, so the seam here mirrors
//! that shape instead of hiding registration inside a single lookup call.

pub mod client;
pub mod models;

use async_trait::async_trait;

use crate::api::error::ApiError;
use crate::batch::ShipmentStatus;

pub use client::{TrackClient, TrackConfig};
pub use models::codes;

/// Per-number rejection from either phase
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub number: String,
    pub code: i64,
    pub message: String,
}

impl Rejection {
    /// Registration of an already-registered number is success, not failure
    pub fn already_registered(&self) -> bool {
        self.code == codes::ALREADY_REGISTERED
    }

    pub fn not_registered(&self) -> bool {
        self.code == codes::NOT_REGISTERED
    }

    pub fn quota_exceeded(&self) -> bool {
        self.code == codes::QUOTA_EXCEEDED
    }
}

/// Outcome of a registration call
#[derive(Debug, Clone, Default)]
pub struct RegisterReply {
    pub accepted: Vec<String>,
    pub rejected: Vec<Rejection>,
}

/// Outcome of a status call
#[derive(Debug, Clone, Default)]
pub struct StatusReply {
    pub accepted: Vec<ShipmentStatus>,
    pub rejected: Vec<Rejection>,
}

/// Black-box contract of the tracking provider
#[async_trait]
pub trait TrackingApi: Send + Sync {
    /// Submit numbers for tracking. Idempotent: numbers already registered
    /// come back as rejections with a dedicated code and are treated as
    /// accepted by callers.
    async fn register(&self, numbers: &[String]) -> Result<RegisterReply, ApiError>;

    /// Fetch current status details for registered numbers
    async fn get_status(&self, numbers: &[String]) -> Result<StatusReply, ApiError>;
}
