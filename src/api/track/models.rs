//! Wire types for the tracking provider's v2.2 JSON contract
//!
//! Every field the provider may omit is an `Option`; conversion into the
//! run's [`ShipmentStatus`] flattens the nested payload and pulls milestone
//! dates out of the event list.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::batch::ShipmentStatus;

/// Provider result codes carried on per-number rejections
pub mod codes {
    pub const ALREADY_REGISTERED: i64 = -18019901;
    pub const NOT_REGISTERED: i64 = -18019902;
    pub const QUOTA_EXCEEDED: i64 = -18019908;
}

/// Top-level response envelope: `{"code": 0, "data": {...}}`
#[derive(Debug, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub code: i64,
    pub data: ResponseData,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResponseData {
    #[serde(default)]
    pub accepted: Vec<AcceptedItem>,
    #[serde(default)]
    pub rejected: Vec<RejectedItem>,
}

#[derive(Debug, Deserialize)]
pub struct AcceptedItem {
    pub number: String,
    pub track_info: Option<TrackInfo>,
}

#[derive(Debug, Deserialize)]
pub struct RejectedItem {
    #[serde(default)]
    pub number: String,
    pub error: RejectionError,
}

#[derive(Debug, Deserialize)]
pub struct RejectionError {
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct TrackInfo {
    pub latest_status: Option<LatestStatus>,
    pub shipping_info: Option<ShippingInfo>,
    pub time_metrics: Option<TimeMetrics>,
    pub tracking: Option<Tracking>,
}

#[derive(Debug, Deserialize)]
pub struct LatestStatus {
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct ShippingInfo {
    pub shipper_address: Option<Address>,
    pub recipient_address: Option<Address>,
}

#[derive(Debug, Deserialize)]
pub struct Address {
    pub country: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TimeMetrics {
    pub days_after_order: Option<i64>,
    pub days_of_transit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct Tracking {
    #[serde(default)]
    pub providers: Vec<Provider>,
}

#[derive(Debug, Deserialize)]
pub struct Provider {
    pub provider: Option<ProviderInfo>,
    #[serde(default)]
    pub events: Vec<TrackEvent>,
}

#[derive(Debug, Deserialize)]
pub struct ProviderInfo {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct TrackEvent {
    pub sub_status: Option<String>,
    pub time_raw: Option<RawTime>,
}

#[derive(Debug, Deserialize)]
pub struct RawTime {
    pub date: Option<String>,
}

impl AcceptedItem {
    /// Flatten the provider payload into the run's status record
    pub fn into_status(self) -> ShipmentStatus {
        let info = self.track_info;

        let carrier = info
            .as_ref()
            .and_then(|i| i.tracking.as_ref())
            .and_then(|t| t.providers.first())
            .and_then(|p| p.provider.as_ref())
            .map(|p| p.name.clone())
            .unwrap_or_default();

        let latest_status = info
            .as_ref()
            .and_then(|i| i.latest_status.as_ref())
            .map(|s| s.status.clone())
            .unwrap_or_default();

        let shipping_country = info
            .as_ref()
            .and_then(|i| i.shipping_info.as_ref())
            .and_then(|s| s.shipper_address.as_ref())
            .and_then(|a| a.country.clone());
        let recipient_country = info
            .as_ref()
            .and_then(|i| i.shipping_info.as_ref())
            .and_then(|s| s.recipient_address.as_ref())
            .and_then(|a| a.country.clone());

        let (days_after_order, days_of_transit) = info
            .as_ref()
            .and_then(|i| i.time_metrics.as_ref())
            .map(|m| (m.days_after_order, m.days_of_transit))
            .unwrap_or((None, None));

        let mut status = ShipmentStatus {
            tracking_number: self.number,
            carrier,
            latest_status,
            shipping_country,
            recipient_country,
            days_after_order,
            days_of_transit,
            info_received_at: None,
            in_transit_at: None,
            delivered_at: None,
        };

        if let Some(events) = info
            .and_then(|i| i.tracking)
            .and_then(|t| t.providers.into_iter().next())
            .map(|p| p.events)
        {
            for event in events {
                let (Some(sub_status), Some(date)) = (
                    event.sub_status.as_deref(),
                    event.time_raw.and_then(|t| t.date),
                ) else {
                    continue;
                };
                // "InTransit_PickedUp" and plain "InTransit" both count
                let milestone = sub_status.split('_').next().unwrap_or(sub_status);
                let Some(parsed) = parse_event_date(&date) else {
                    continue;
                };
                // Later events overwrite earlier ones, matching provider order
                match milestone {
                    "InfoReceived" => status.info_received_at = Some(parsed),
                    "InTransit" => status.in_transit_at = Some(parsed),
                    "Delivered" => status.delivered_at = Some(parsed),
                    _ => {}
                }
            }
        }

        status
    }
}

fn parse_event_date(raw: &str) -> Option<NaiveDate> {
    // The provider sends dates as YYYY-MM-DD, occasionally with a time part
    let date_part = raw.split_whitespace().next().unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}
