//! Shipping-time metrics derived from milestone dates
//!
//! Processing time runs from order creation to the in-transit milestone,
//! shipping time from in-transit to delivery. Any missing date leaves the
//! dependent metric blank rather than guessing.

use chrono::NaiveDate;

use crate::batch::ShipmentStatus;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShippingMetrics {
    /// Days from order creation to the in-transit milestone
    pub processing_days: Option<i64>,
    /// Days from in-transit to delivery
    pub shipping_days: Option<i64>,
    pub total_days: Option<i64>,
}

/// Compute metrics for one shipment. `order_created_at` is the raw cell from
/// the order-date column, when the input file has one.
pub fn shipping_metrics(order_created_at: Option<&str>, status: &ShipmentStatus) -> ShippingMetrics {
    let order_date = order_created_at.and_then(parse_order_date);

    let processing_days = match (order_date, status.in_transit_at) {
        (Some(ordered), Some(in_transit)) => Some((in_transit - ordered).num_days()),
        _ => None,
    };
    let shipping_days = match (status.in_transit_at, status.delivered_at) {
        (Some(in_transit), Some(delivered)) => Some((delivered - in_transit).num_days()),
        _ => None,
    };
    let total_days = match (processing_days, shipping_days) {
        (Some(p), Some(s)) => Some(p + s),
        _ => None,
    };

    ShippingMetrics {
        processing_days,
        shipping_days,
        total_days,
    }
}

/// Order exports show up with several date shapes; day-first is the export
/// tool's default, so it wins for ambiguous values.
pub fn parse_order_date(raw: &str) -> Option<NaiveDate> {
    let cleaned = raw.trim();
    if cleaned.is_empty() {
        return None;
    }
    // Drop a trailing time component if present
    let date_part = cleaned.split_whitespace().next().unwrap_or(cleaned);

    for format in ["%d/%m/%Y", "%d-%m-%Y", "%Y-%m-%d", "%d/%m/%y"] {
        if let Ok(date) = NaiveDate::parse_from_str(date_part, format) {
            return Some(date);
        }
    }
    None
}
