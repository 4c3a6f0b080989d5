//! Sheet publishing stage
//!
//! Creates a fresh spreadsheet named after the run, writes the merged table
//! into it, and leaves a local CSV snapshot when asked. A write failure
//! after creation is surfaced loudly: the remote sheet exists but its
//! content is not trustworthy at that point.

use anyhow::{Context, Result};
use chrono::Utc;
use log::{error, info, warn};
use std::path::Path;

use crate::api::error::ApiError;
use crate::api::sheets::{sheet_url, SheetApi};
use crate::config::PublishMode;

/// Create a spreadsheet and publish the table into it. Returns the sheet id.
pub async fn publish_sheet(
    api: &dyn SheetApi,
    title_prefix: &str,
    mode: PublishMode,
    table: &[Vec<String>],
) -> Result<String, ApiError> {
    let title = format!("{}-{}", title_prefix, Utc::now().format("%Y%m%d-%H%M%S"));
    let sheet_id = api.create_spreadsheet(&title).await?;
    info!("created spreadsheet '{title}' ({sheet_id})");

    if let Err(err) = api.write_rows(&sheet_id, mode, table).await {
        // The sheet was created but the write did not complete; the operator
        // must know its content may be inconsistent.
        error!(
            "write to spreadsheet {sheet_id} failed after creation; \
             the sheet at {} may be empty or partially written",
            sheet_url(&sheet_id)
        );
        return Err(err);
    }

    info!(
        "published {} row(s) to {}",
        table.len().saturating_sub(1),
        sheet_url(&sheet_id)
    );
    Ok(sheet_id)
}

/// Write the merged table to a local CSV file. Best-effort convenience copy;
/// callers downgrade failures to a warning.
pub fn write_snapshot(path: &Path, table: &[Vec<String>]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create snapshot file {}", path.display()))?;
    for row in table {
        writer
            .write_record(row)
            .with_context(|| format!("failed to write snapshot row to {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("failed to flush snapshot {}", path.display()))?;
    warn_if_empty(path, table);
    Ok(())
}

fn warn_if_empty(path: &Path, table: &[Vec<String>]) {
    if table.len() <= 1 {
        warn!("snapshot {} contains a header but no rows", path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::error::ApiService;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeSheets {
        written: Mutex<Vec<Vec<String>>>,
        fail_write: bool,
    }

    #[async_trait]
    impl SheetApi for FakeSheets {
        async fn create_spreadsheet(&self, _title: &str) -> Result<String, ApiError> {
            Ok("sheet-1".to_string())
        }

        async fn write_rows(
            &self,
            _sheet_id: &str,
            _mode: PublishMode,
            rows: &[Vec<String>],
        ) -> Result<(), ApiError> {
            if self.fail_write {
                return Err(ApiError::Quota {
                    service: ApiService::Spreadsheet,
                    message: "cell limit".into(),
                });
            }
            self.written.lock().unwrap().extend(rows.iter().cloned());
            Ok(())
        }
    }

    fn table() -> Vec<Vec<String>> {
        vec![
            vec!["tracking_number".to_string()],
            vec!["A1".to_string()],
            vec!["A2".to_string()],
        ]
    }

    #[tokio::test]
    async fn publishes_rows_in_order() {
        let sheets = FakeSheets::default();
        let id = publish_sheet(&sheets, "Test", PublishMode::Replace, &table())
            .await
            .unwrap();
        assert_eq!(id, "sheet-1");
        let written = sheets.written.lock().unwrap();
        assert_eq!(written.len(), 3);
        assert_eq!(written[1][0], "A1");
        assert_eq!(written[2][0], "A2");
    }

    #[tokio::test]
    async fn write_failure_is_surfaced() {
        let sheets = FakeSheets {
            fail_write: true,
            ..Default::default()
        };
        let err = publish_sheet(&sheets, "Test", PublishMode::Replace, &table())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Spreadsheet API"));
    }

    #[test]
    fn snapshot_round_trips_through_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.csv");
        write_snapshot(&path, &table()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines, vec!["tracking_number", "A1", "A2"]);
    }
}
