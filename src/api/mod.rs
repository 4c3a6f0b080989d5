//! Clients for the external collaborators
//!
//! Each service is consumed through a narrow trait so the pipeline can be
//! exercised against in-memory fakes. The shipped implementations speak
//! JSON-over-HTTP through the shared resilience layer.

pub mod dashboard;
pub mod error;
pub mod resilience;
pub mod sheets;
pub mod track;

pub use dashboard::{DashboardApi, DashboardClient, DashboardTemplate};
pub use error::{ApiError, ApiService};
pub use resilience::ResilienceConfig;
pub use sheets::{SheetApi, SheetClient, SheetConfig};
pub use track::{TrackClient, TrackConfig, TrackingApi};
