//! Tabular loader: spreadsheet file -> TrackingBatch
//!
//! Two input variants: delimited text (.csv) and packed spreadsheet (.xlsx).
//! The loader validates that the required tracking-number column exists and
//! otherwise carries rows through untouched, in file order. An empty file is
//! an empty batch, not an error; downstream stages handle zero records.

use anyhow::Context;
use calamine::{open_workbook, Data, Reader, Xlsx};
use log::info;
use std::path::Path;
use thiserror::Error;

use crate::batch::{TrackingBatch, TrackingRecord};

#[derive(Debug, Error)]
pub enum LoaderError {
    /// The input schema is unusable; names every missing column
    #[error("missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("unsupported file extension '.{0}': expected .csv or .xlsx")]
    UnsupportedExtension(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Load and validate the input file
pub fn load_batch(path: &Path, tracking_column: &str) -> Result<TrackingBatch, LoaderError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let (header, rows) = match extension.as_str() {
        "csv" => read_csv(path)?,
        "xlsx" => read_xlsx(path)?,
        other => return Err(LoaderError::UnsupportedExtension(other.to_string())),
    };

    // A zero-byte file has no header either; that is an empty batch
    if header.is_empty() && rows.is_empty() {
        info!("{} is empty, continuing with an empty batch", path.display());
        return Ok(TrackingBatch::default());
    }

    let Some(tracking_idx) = header
        .iter()
        .position(|h| h.eq_ignore_ascii_case(tracking_column))
    else {
        return Err(LoaderError::MissingColumns(vec![
            tracking_column.to_string()
        ]));
    };

    let mut batch = TrackingBatch::new(header);
    for row in rows {
        let number = row
            .get(tracking_idx)
            .map(|c| c.trim().to_string())
            .unwrap_or_default();
        batch.records.push(TrackingRecord::new(number, row));
    }

    info!(
        "loaded {} row(s), {} distinct tracking number(s) from {}",
        batch.len(),
        batch.distinct_numbers().len(),
        path.display()
    );
    Ok(batch)
}

fn read_csv(path: &Path) -> Result<(Vec<String>, Vec<Vec<String>>), LoaderError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let header: Vec<String> = reader
        .headers()
        .with_context(|| format!("failed to read header of {}", path.display()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    // csv reports a single empty header field for a zero-byte file
    if header.iter().all(String::is_empty) {
        return Ok((Vec::new(), Vec::new()));
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.with_context(|| format!("malformed row in {}", path.display()))?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok((header, rows))
}

fn read_xlsx(path: &Path) -> Result<(Vec<String>, Vec<Vec<String>>), LoaderError> {
    let path_str = path.display().to_string();
    let mut workbook: Xlsx<_> =
        open_workbook(path).with_context(|| format!("failed to open {path_str}"))?;

    let sheet_name = match workbook.sheet_names().first() {
        Some(name) => name.clone(),
        None => return Ok((Vec::new(), Vec::new())),
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .with_context(|| format!("failed to read sheet '{sheet_name}' of {path_str}"))?;

    let mut rows_iter = range.rows();
    let header: Vec<String> = match rows_iter.next() {
        Some(row) => row.iter().map(cell_to_string).collect(),
        None => return Ok((Vec::new(), Vec::new())),
    };

    let rows = rows_iter
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect();
    Ok((header, rows))
}

/// Coerce a spreadsheet cell to text; whole floats lose the trailing .0
/// so numeric tracking numbers survive the round trip
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 {
                (*f as i64).to_string()
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.to_string(),
        _ => String::new(),
    }
}
