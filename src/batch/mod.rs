//! Core data model for a tracking run
//!
//! A run loads one spreadsheet export into a [`TrackingBatch`], enriches it
//! with per-shipment status, and publishes the result. Records keep their
//! source row order end to end because the published sheet must mirror the
//! input file.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One input row: the tracking number key, the raw cells carried through
/// unchanged, and (after aggregation) exactly one lookup outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingRecord {
    /// Carrier-issued shipment identifier, used as the API key
    pub tracking_number: String,
    /// Source row cells in original column order
    pub fields: Vec<String>,
    /// Populated exactly once by the aggregator: status or a per-record error
    pub outcome: Option<Result<ShipmentStatus, String>>,
}

impl TrackingRecord {
    pub fn new(tracking_number: impl Into<String>, fields: Vec<String>) -> Self {
        Self {
            tracking_number: tracking_number.into(),
            fields,
            outcome: None,
        }
    }
}

/// Ordered collection of records for one run, plus the source header
#[derive(Debug, Clone, Default)]
pub struct TrackingBatch {
    /// Column names from the input file, original order
    pub header: Vec<String>,
    /// Records in input row order
    pub records: Vec<TrackingRecord>,
}

impl TrackingBatch {
    pub fn new(header: Vec<String>) -> Self {
        Self {
            header,
            records: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct tracking numbers in first-seen order. Duplicates are queried
    /// once and the result broadcast back to every row sharing the number.
    /// Rows without a number are skipped here; aggregation records an error
    /// for them instead.
    pub fn distinct_numbers(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for record in &self.records {
            if record.tracking_number.is_empty() {
                continue;
            }
            if seen.insert(record.tracking_number.as_str()) {
                out.push(record.tracking_number.clone());
            }
        }
        out
    }

    /// Index of a column by name, case-insensitive
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.header
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
    }
}

/// Status details for one shipment as returned by the tracking provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentStatus {
    pub tracking_number: String,
    pub carrier: String,
    pub latest_status: String,
    pub shipping_country: Option<String>,
    pub recipient_country: Option<String>,
    pub days_after_order: Option<i64>,
    pub days_of_transit: Option<i64>,
    /// Milestone event dates extracted from the provider's event list
    pub info_received_at: Option<NaiveDate>,
    pub in_transit_at: Option<NaiveDate>,
    pub delivered_at: Option<NaiveDate>,
}

/// Shareable link to the per-run dashboard copy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardLink {
    pub url: String,
    pub created_at: DateTime<Utc>,
}
