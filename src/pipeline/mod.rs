//! Run orchestration
//!
//! The whole run is a fixed forward-only sequence:
//! Idle -> Loaded -> Tracked -> Aggregated -> Published -> DashboardReady ->
//! (Notified) -> Done. Every transition needs the prior stage's success
//! except notification, which is best-effort. A fatal error halts the run at
//! its stage and the error names that stage and the underlying cause.

use log::{info, warn};
use std::path::Path;
use thiserror::Error;

use crate::aggregate::{apply_outcomes, to_table};
use crate::api::dashboard::DashboardApi;
use crate::api::error::ApiError;
use crate::api::sheets::{sheet_url, SheetApi};
use crate::api::track::TrackingApi;
use crate::batch::{DashboardLink, TrackingBatch};
use crate::config::AppConfig;
use crate::loader::{load_batch, LoaderError};
use crate::notify::Notifier;
use crate::publish::{publish_sheet, write_snapshot};
use crate::tracker::collect_status;

/// Pipeline states, in order. Also used to name the failing stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Loaded,
    Tracked,
    Aggregated,
    Published,
    DashboardReady,
    Notified,
    Done,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Idle => "Idle",
            Stage::Loaded => "Loaded",
            Stage::Tracked => "Tracked",
            Stage::Aggregated => "Aggregated",
            Stage::Published => "Published",
            Stage::DashboardReady => "DashboardReady",
            Stage::Notified => "Notified",
            Stage::Done => "Done",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input file could not be loaded or failed schema validation
    #[error("failed to load input: {0}")]
    Load(#[from] LoaderError),

    /// An external service failed fatally while a stage was in flight
    #[error("run halted at stage {stage}: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: ApiError,
    },
}

/// Summary of a completed run
#[derive(Debug)]
pub struct RunReport {
    pub rows: usize,
    pub distinct_numbers: usize,
    /// Rows whose lookup recorded a per-record error
    pub errored_rows: usize,
    pub sheet_id: String,
    pub sheet_url: String,
    pub link: DashboardLink,
    /// None when no recipient is configured; Some(false) when sending failed
    pub notified: Option<bool>,
}

/// Result of the load/track/aggregate front half, used by dry runs too
pub struct Preview {
    pub batch: TrackingBatch,
    pub table: Vec<Vec<String>>,
    pub distinct_numbers: usize,
    pub errored_rows: usize,
}

/// The run pipeline over the four external seams
pub struct Pipeline<'a> {
    pub tracking: &'a dyn TrackingApi,
    pub sheets: &'a dyn SheetApi,
    pub dashboard: &'a dyn DashboardApi,
    pub notifier: Option<&'a dyn Notifier>,
    pub config: &'a AppConfig,
}

impl Pipeline<'_> {
    /// Load, track, and aggregate without publishing anything remote
    pub async fn preview(&self, input: &Path) -> Result<Preview, PipelineError> {
        let mut batch = load_batch(input, &self.config.tracking_column)?;
        info!("stage {}: {} row(s)", Stage::Loaded, batch.len());

        let numbers = batch.distinct_numbers();
        let outcomes = collect_status(self.tracking, &self.config.resilience, &numbers)
            .await
            .map_err(|source| PipelineError::Stage {
                stage: Stage::Tracked,
                source,
            })?;
        info!("stage {}: {} distinct number(s) queried", Stage::Tracked, numbers.len());

        apply_outcomes(&mut batch, &outcomes);
        let table = to_table(&batch, &self.config.order_date_column);
        let errored_rows = batch
            .records
            .iter()
            .filter(|r| matches!(r.outcome, Some(Err(_))))
            .count();
        info!(
            "stage {}: {} row(s) merged, {} with recorded errors",
            Stage::Aggregated,
            batch.len(),
            errored_rows
        );

        if let Some(path) = &self.config.snapshot {
            // Local convenience copy; never fails the run
            if let Err(err) = write_snapshot(path, &table) {
                warn!("snapshot not written: {err:#}");
            }
        }

        Ok(Preview {
            distinct_numbers: numbers.len(),
            errored_rows,
            batch,
            table,
        })
    }

    /// Execute the full pipeline
    pub async fn run(&self, input: &Path) -> Result<RunReport, PipelineError> {
        let preview = self.preview(input).await?;

        let sheet_id = publish_sheet(
            self.sheets,
            &self.config.sheet_title_prefix,
            self.config.publish_mode,
            &preview.table,
        )
        .await
        .map_err(|source| PipelineError::Stage {
            stage: Stage::Published,
            source,
        })?;
        info!("stage {}: sheet {} written", Stage::Published, sheet_id);

        let link = self
            .dashboard
            .publish(&sheet_id)
            .await
            .map_err(|source| PipelineError::Stage {
                stage: Stage::DashboardReady,
                source,
            })?;
        info!("stage {}: {}", Stage::DashboardReady, link.url);

        // Best-effort: the dashboard is live, so a mail failure only warns
        let notified = match (&self.config.recipient, self.notifier) {
            (Some(recipient), Some(notifier)) => {
                match notifier.send_link(recipient, &link).await {
                    Ok(()) => {
                        info!("stage {}: link sent to {recipient}", Stage::Notified);
                        Some(true)
                    }
                    Err(err) => {
                        warn!("notification failed, run still succeeded: {err}");
                        Some(false)
                    }
                }
            }
            _ => None,
        };

        info!("stage {}", Stage::Done);
        Ok(RunReport {
            rows: preview.batch.len(),
            distinct_numbers: preview.distinct_numbers,
            errored_rows: preview.errored_rows,
            sheet_url: sheet_url(&sheet_id),
            sheet_id,
            link,
            notified,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::error::ApiService;
    use crate::api::track::{RegisterReply, StatusReply};
    use crate::batch::ShipmentStatus;
    use crate::config::PublishMode;
    use async_trait::async_trait;
    use std::io::Write;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    struct FakeTracking {
        status_calls: Mutex<Vec<Vec<String>>>,
        fail_number: Option<String>,
    }

    impl FakeTracking {
        fn new() -> Self {
            Self {
                status_calls: Mutex::new(Vec::new()),
                fail_number: None,
            }
        }

        fn status_for(number: &str) -> ShipmentStatus {
            ShipmentStatus {
                tracking_number: number.to_string(),
                carrier: "DHL".into(),
                latest_status: "Delivered".into(),
                shipping_country: Some("CN".into()),
                recipient_country: Some("US".into()),
                days_after_order: Some(9),
                days_of_transit: Some(6),
                info_received_at: None,
                in_transit_at: None,
                delivered_at: None,
            }
        }
    }

    #[async_trait]
    impl TrackingApi for FakeTracking {
        async fn register(&self, numbers: &[String]) -> Result<RegisterReply, ApiError> {
            Ok(RegisterReply {
                accepted: numbers.to_vec(),
                rejected: vec![],
            })
        }

        async fn get_status(&self, numbers: &[String]) -> Result<StatusReply, ApiError> {
            self.status_calls.lock().unwrap().push(numbers.to_vec());
            let mut reply = StatusReply::default();
            for number in numbers {
                if Some(number) == self.fail_number.as_ref() {
                    reply.rejected.push(crate::api::track::Rejection {
                        number: number.clone(),
                        code: -1,
                        message: "invalid number".into(),
                    });
                } else {
                    reply.accepted.push(Self::status_for(number));
                }
            }
            Ok(reply)
        }
    }

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
                    message: "write quota exhausted".into(),
                });
            }
            self.written.lock().unwrap().extend(rows.iter().cloned());
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeDashboard {
        invoked: AtomicBool,
    }

    #[async_trait]
    impl DashboardApi for FakeDashboard {
        async fn publish(&self, sheet_id: &str) -> Result<DashboardLink, ApiError> {
            self.invoked.store(true, Ordering::SeqCst);
            Ok(DashboardLink {
                url: format!("https://dash.example/create?ds={sheet_id}"),
                created_at: chrono::Utc::now(),
            })
        }
    }

    #[derive(Default)]
    struct FakeNotifier {
        invoked: AtomicBool,
        fail: bool,
    }

    #[async_trait]
    impl Notifier for FakeNotifier {
        async fn send_link(&self, _recipient: &str, _link: &DashboardLink) -> Result<(), ApiError> {
            self.invoked.store(true, Ordering::SeqCst);
            if self.fail {
                return Err(ApiError::payload(ApiService::Mail, "relay refused"));
            }
            Ok(())
        }
    }

    fn input_file(content: &str) -> tempfile::TempPath {
        let mut file = tempfile::Builder::new()
            .suffix(".csv")
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.into_temp_path()
    }

    fn config() -> AppConfig {
        let mut config = test_config();
        config.recipient = None;
        config
    }

    fn test_config() -> AppConfig {
        use crate::api::dashboard::DashboardTemplate;
        use crate::api::sheets::SheetConfig;
        use crate::api::track::TrackConfig;
        AppConfig {
            tracking_column: "tracking_number".into(),
            order_date_column: "order_created_at".into(),
            publish_mode: PublishMode::Replace,
            recipient: Some("ops@example.com".into()),
            snapshot: None,
            sheet_title_prefix: "Test".into(),
            track: TrackConfig::new("key"),
            sheets: SheetConfig::new("token"),
            template: DashboardTemplate::new("rep", "page"),
            smtp: None,
            resilience: Default::default(),
        }
    }

    const THREE_ROWS: &str = "order_id,order_created_at,tracking_number\n\
                              1,01/02/2024,A1\n\
                              2,01/02/2024,A2\n\
                              3,02/02/2024,A1\n";

    #[tokio::test]
    async fn end_to_end_dedupes_and_broadcasts() {
        let path = input_file(THREE_ROWS);
        let tracking = FakeTracking::new();
        let sheets = FakeSheets::default();
        let dashboard = FakeDashboard::default();
        let pipeline = Pipeline {
            tracking: &tracking,
            sheets: &sheets,
            dashboard: &dashboard,
            notifier: None,
            config: &config(),
        };

        let report = pipeline.run(path.as_ref()).await.unwrap();
        assert_eq!(report.rows, 3);
        assert_eq!(report.distinct_numbers, 2);
        assert_eq!(report.errored_rows, 0);
        assert!(!report.link.url.is_empty());

        // One status lookup per distinct number
        let queried: usize = tracking
            .status_calls
            .lock()
            .unwrap()
            .iter()
            .map(Vec::len)
            .sum();
        assert_eq!(queried, 2);

        // Publisher saw header + 3 rows in source order, rows 1 and 3 share status
        let written = sheets.written.lock().unwrap();
        assert_eq!(written.len(), 4);
        assert_eq!(written[1][2], "A1");
        assert_eq!(written[2][2], "A2");
        assert_eq!(written[3][2], "A1");
        assert_eq!(written[1][3..], written[3][3..]);
    }

    #[tokio::test]
    async fn per_record_failure_still_reaches_published() {
        let path = input_file(THREE_ROWS);
        let mut tracking = FakeTracking::new();
        tracking.fail_number = Some("A2".to_string());
        let sheets = FakeSheets::default();
        let dashboard = FakeDashboard::default();
        let pipeline = Pipeline {
            tracking: &tracking,
            sheets: &sheets,
            dashboard: &dashboard,
            notifier: None,
            config: &config(),
        };

        let report = pipeline.run(path.as_ref()).await.unwrap();
        assert_eq!(report.errored_rows, 1);

        let written = sheets.written.lock().unwrap();
        let errors: Vec<_> = written[1..]
            .iter()
            .map(|row| row.last().unwrap().as_str())
            .collect();
        assert_eq!(errors, vec!["", "invalid number", ""]);
    }

    #[tokio::test]
    async fn sheet_write_failure_halts_before_dashboard() {
        let path = input_file(THREE_ROWS);
        let tracking = FakeTracking::new();
        let sheets = FakeSheets {
            fail_write: true,
            ..Default::default()
        };
        let dashboard = FakeDashboard::default();
        let notifier = FakeNotifier::default();
        let pipeline = Pipeline {
            tracking: &tracking,
            sheets: &sheets,
            dashboard: &dashboard,
            notifier: Some(&notifier),
            config: &test_config(),
        };

        let err = pipeline.run(path.as_ref()).await.unwrap_err();
        match &err {
            PipelineError::Stage { stage, source } => {
                assert_eq!(*stage, Stage::Published);
                assert!(source.to_string().contains("Spreadsheet API"));
            }
            other => panic!("expected stage error, got {other:?}"),
        }
        assert!(!dashboard.invoked.load(Ordering::SeqCst));
        assert!(!notifier.invoked.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn notifier_failure_does_not_fail_the_run() {
        let path = input_file(THREE_ROWS);
        let tracking = FakeTracking::new();
        let sheets = FakeSheets::default();
        let dashboard = FakeDashboard::default();
        let notifier = FakeNotifier {
            fail: true,
            ..Default::default()
        };
        let pipeline = Pipeline {
            tracking: &tracking,
            sheets: &sheets,
            dashboard: &dashboard,
            notifier: Some(&notifier),
            config: &test_config(),
        };

        let report = pipeline.run(path.as_ref()).await.unwrap();
        assert!(notifier.invoked.load(Ordering::SeqCst));
        assert_eq!(report.notified, Some(false));
        assert!(!report.link.url.is_empty());
    }

    #[tokio::test]
    async fn missing_column_fails_before_any_api_call() {
        let path = input_file("order_id,qty\n1,2\n");
        let tracking = FakeTracking::new();
        let sheets = FakeSheets::default();
        let dashboard = FakeDashboard::default();
        let pipeline = Pipeline {
            tracking: &tracking,
            sheets: &sheets,
            dashboard: &dashboard,
            notifier: None,
            config: &config(),
        };

        let err = pipeline.run(path.as_ref()).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Load(LoaderError::MissingColumns(_))
        ));
        assert!(err.to_string().contains("tracking_number"));
        assert!(tracking.status_calls.lock().unwrap().is_empty());
        assert!(sheets.written.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_file_publishes_header_only() {
        let path = input_file("");
        let tracking = FakeTracking::new();
        let sheets = FakeSheets::default();
        let dashboard = FakeDashboard::default();
        let pipeline = Pipeline {
            tracking: &tracking,
            sheets: &sheets,
            dashboard: &dashboard,
            notifier: None,
            config: &config(),
        };

        let report = pipeline.run(path.as_ref()).await.unwrap();
        assert_eq!(report.rows, 0);
        assert_eq!(report.errored_rows, 0);
        assert!(dashboard.invoked.load(Ordering::SeqCst));
    }
}
