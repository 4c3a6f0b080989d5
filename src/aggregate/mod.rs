//! Result aggregation
//!
//! Merges tracking outcomes back onto the batch by tracking-number key, not
//! row position, so deduplicated lookups broadcast to every row sharing a
//! number. Invariant: after [`apply_outcomes`] every record carries exactly
//! one outcome, either status fields or a recorded error.

use crate::batch::TrackingBatch;
use crate::country::country_name;
use crate::metrics::shipping_metrics;
use crate::tracker::StatusMap;

/// Columns appended to the source table by aggregation, in output order
pub const STATUS_COLUMNS: [&str; 13] = [
    "carrier",
    "latest_status",
    "shipping_country",
    "recipient_country",
    "days_after_order",
    "days_of_transit",
    "info_received_at",
    "in_transit_at",
    "delivered_at",
    "processing_time",
    "shipping_time",
    "total_time",
    "tracking_error",
];

/// Give every record its single outcome
pub fn apply_outcomes(batch: &mut TrackingBatch, outcomes: &StatusMap) {
    for record in &mut batch.records {
        record.outcome = Some(if record.tracking_number.is_empty() {
            Err("row has no tracking number".to_string())
        } else {
            match outcomes.get(&record.tracking_number) {
                Some(Ok(status)) => Ok(status.clone()),
                Some(Err(reason)) => Err(reason.clone()),
                None => Err("no result returned by the tracking provider".to_string()),
            }
        });
    }
}

/// Render the merged batch as a rectangular table: source columns first,
/// then the status columns, header row included. Row order matches input.
pub fn to_table(batch: &TrackingBatch, order_date_column: &str) -> Vec<Vec<String>> {
    let source_cols = batch.header.len();
    let order_date_idx = batch.column_index(order_date_column);

    let mut header: Vec<String> = batch.header.clone();
    header.extend(STATUS_COLUMNS.iter().map(|c| c.to_string()));

    let mut table = Vec::with_capacity(batch.len() + 1);
    table.push(header);

    for record in &batch.records {
        let mut row: Vec<String> = record.fields.clone();
        row.resize(source_cols, String::new());

        match record.outcome.as_ref() {
            Some(Ok(status)) => {
                let order_date = order_date_idx.and_then(|i| record.fields.get(i));
                let metrics = shipping_metrics(order_date.map(String::as_str), status);

                row.push(status.carrier.clone());
                row.push(status.latest_status.clone());
                row.push(opt_country(status.shipping_country.as_deref()));
                row.push(opt_country(status.recipient_country.as_deref()));
                row.push(opt_num(status.days_after_order));
                row.push(opt_num(status.days_of_transit));
                row.push(opt_date(status.info_received_at));
                row.push(opt_date(status.in_transit_at));
                row.push(opt_date(status.delivered_at));
                row.push(opt_num(metrics.processing_days));
                row.push(opt_num(metrics.shipping_days));
                row.push(opt_num(metrics.total_days));
                row.push(String::new()); // tracking_error
            }
            Some(Err(reason)) => {
                // Blank status cells, reason in the error column
                row.extend(std::iter::repeat(String::new()).take(STATUS_COLUMNS.len() - 1));
                row.push(reason.clone());
            }
            None => {
                row.extend(std::iter::repeat(String::new()).take(STATUS_COLUMNS.len() - 1));
                row.push("record was never aggregated".to_string());
            }
        }
        table.push(row);
    }

    table
}

fn opt_country(code: Option<&str>) -> String {
    code.map(country_name).unwrap_or_default()
}

fn opt_num(value: Option<i64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn opt_date(value: Option<chrono::NaiveDate>) -> String {
    value.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{ShipmentStatus, TrackingRecord};
    use chrono::NaiveDate;

    fn status(number: &str) -> ShipmentStatus {
        ShipmentStatus {
            tracking_number: number.to_string(),
            carrier: "DHL".into(),
            latest_status: "Delivered".into(),
            shipping_country: Some("CN".into()),
            recipient_country: Some("US".into()),
            days_after_order: Some(10),
            days_of_transit: Some(7),
            info_received_at: NaiveDate::from_ymd_opt(2024, 2, 1),
            in_transit_at: NaiveDate::from_ymd_opt(2024, 2, 3),
            delivered_at: NaiveDate::from_ymd_opt(2024, 2, 9),
        }
    }

    fn batch_of(numbers: &[&str]) -> TrackingBatch {
        let mut batch = TrackingBatch::new(vec![
            "order_id".to_string(),
            "order_created_at".to_string(),
            "tracking_number".to_string(),
        ]);
        for (i, n) in numbers.iter().enumerate() {
            batch.records.push(TrackingRecord::new(
                *n,
                vec![format!("100{i}"), "01/02/2024".to_string(), n.to_string()],
            ));
        }
        batch
    }

    #[test]
    fn every_record_gets_exactly_one_outcome() {
        let mut batch = batch_of(&["A1", "A2", ""]);
        let mut outcomes = StatusMap::new();
        outcomes.insert("A1".to_string(), Ok(status("A1")));
        // A2 deliberately absent

        apply_outcomes(&mut batch, &outcomes);

        assert!(batch.records.iter().all(|r| r.outcome.is_some()));
        assert!(batch.records[0].outcome.as_ref().unwrap().is_ok());
        assert!(batch.records[1].outcome.as_ref().unwrap().is_err());
        assert_eq!(
            batch.records[2].outcome.as_ref().unwrap().as_ref().unwrap_err(),
            "row has no tracking number"
        );
    }

    #[test]
    fn duplicate_numbers_share_the_broadcast_result() {
        let mut batch = batch_of(&["A1", "A2", "A1"]);
        let mut outcomes = StatusMap::new();
        outcomes.insert("A1".to_string(), Ok(status("A1")));
        outcomes.insert("A2".to_string(), Ok(status("A2")));

        apply_outcomes(&mut batch, &outcomes);

        let first = batch.records[0].outcome.as_ref().unwrap().as_ref().unwrap();
        let third = batch.records[2].outcome.as_ref().unwrap().as_ref().unwrap();
        assert_eq!(first, third);
    }

    #[test]
    fn table_preserves_row_order_and_appends_status_columns() {
        let mut batch = batch_of(&["A1", "A2"]);
        let mut outcomes = StatusMap::new();
        outcomes.insert("A1".to_string(), Ok(status("A1")));
        outcomes.insert("A2".to_string(), Err("carrier not recognized".to_string()));
        apply_outcomes(&mut batch, &outcomes);

        let table = to_table(&batch, "order_created_at");
        assert_eq!(table.len(), 3); // header + 2 rows
        assert_eq!(table[0].len(), 3 + STATUS_COLUMNS.len());
        assert_eq!(table[0][3], "carrier");

        // Row 1: populated status, mapped countries, computed metrics
        assert_eq!(table[1][0], "1000");
        assert_eq!(table[1][3], "DHL");
        assert_eq!(table[1][5], "China");
        assert_eq!(table[1][6], "United States");
        assert_eq!(table[1][12], "2"); // processing_time: 01/02 -> 03/02
        assert_eq!(*table[1].last().unwrap(), "");

        // Row 2: blank status cells, error recorded
        assert_eq!(table[2][3], "");
        assert_eq!(*table[2].last().unwrap(), "carrier not recognized");
    }

    #[test]
    fn empty_batch_renders_header_only() {
        let batch = TrackingBatch::new(vec!["tracking_number".to_string()]);
        let table = to_table(&batch, "order_created_at");
        assert_eq!(table.len(), 1);
    }
}
