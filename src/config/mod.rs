//! Run configuration
//!
//! Credentials and service endpoints come from the environment (a `.env`
//! file is honored); everything behavioral comes from CLI flags. The two are
//! merged into one [`AppConfig`] before the pipeline starts so stages never
//! read the environment themselves.

use anyhow::{Context, Result};
use clap::ValueEnum;
use std::env;
use std::path::PathBuf;

use crate::api::dashboard::DashboardTemplate;
use crate::api::resilience::ResilienceConfig;
use crate::api::sheets::SheetConfig;
use crate::api::track::TrackConfig;

/// Whether publishing rewrites the sheet or appends below existing rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum PublishMode {
    #[default]
    Replace,
    Append,
}

/// SMTP settings for the optional notifier
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    /// From address; defaults to the SMTP user
    pub from: String,
}

/// Everything a run needs, resolved up front
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Name of the required tracking-number column
    pub tracking_column: String,
    /// Optional order-date column used for shipping-time metrics
    pub order_date_column: String,
    pub publish_mode: PublishMode,
    /// Email recipient for the dashboard link, when notification is enabled
    pub recipient: Option<String>,
    /// Local CSV snapshot of the merged table, when requested
    pub snapshot: Option<PathBuf>,
    pub sheet_title_prefix: String,
    pub track: TrackConfig,
    pub sheets: SheetConfig,
    pub template: DashboardTemplate,
    pub smtp: Option<SmtpConfig>,
    pub resilience: ResilienceConfig,
}

impl AppConfig {
    /// Build the config from environment variables. Behavioral fields get
    /// defaults here and are overridden by CLI flags in the caller.
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("TRACK_API_KEY")
            .context("TRACK_API_KEY is not set (tracking provider API key)")?;
        let sheet_token = env::var("SHEETS_API_TOKEN")
            .context("SHEETS_API_TOKEN is not set (spreadsheet service OAuth token)")?;

        let mut track = TrackConfig::new(api_key);
        if let Ok(base) = env::var("TRACK_API_BASE") {
            track.base_url = base;
        }

        let mut sheets = SheetConfig::new(sheet_token);
        if let Ok(base) = env::var("SHEETS_API_BASE") {
            sheets.base_url = base;
        }

        let template = DashboardTemplate::new(
            env::var("DASHBOARD_REPORT_ID").unwrap_or_default(),
            env::var("DASHBOARD_PAGE_ID").unwrap_or_default(),
        );

        Ok(Self {
            tracking_column: "tracking_number".to_string(),
            order_date_column: "order_created_at".to_string(),
            publish_mode: PublishMode::default(),
            recipient: None,
            snapshot: None,
            sheet_title_prefix: "Shipment-Tracking".to_string(),
            track,
            sheets,
            template,
            smtp: smtp_from_env()?,
            resilience: ResilienceConfig::default(),
        })
    }
}

/// SMTP config is optional as a whole: absent host means no notifier,
/// but a half-configured block is a setup error worth failing on.
fn smtp_from_env() -> Result<Option<SmtpConfig>> {
    let host = match env::var("SMTP_HOST") {
        Ok(h) => h,
        Err(_) => return Ok(None),
    };

    let port = env::var("SMTP_PORT")
        .unwrap_or_else(|_| "587".to_string())
        .parse::<u16>()
        .context("SMTP_PORT is not a valid port number")?;
    let user = env::var("SMTP_USER").context("SMTP_HOST is set but SMTP_USER is missing")?;
    let pass = env::var("SMTP_PASS").context("SMTP_HOST is set but SMTP_PASS is missing")?;
    let from = env::var("SMTP_FROM").unwrap_or_else(|_| user.clone());

    Ok(Some(SmtpConfig {
        host,
        port,
        user,
        pass,
        from,
    }))
}
