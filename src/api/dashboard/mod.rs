//! Dashboard publisher
//!
//! The dashboard service duplicates a pre-built template report and rebinds
//! its data source to a spreadsheet. The service exposes both steps behind a
//! single templated "create" URL, so from this system's perspective the whole
//! thing is one atomic publish that yields a shareable link.

use async_trait::async_trait;
use chrono::Utc;
use urlencoding::encode;

use crate::api::error::{ApiError, ApiService};
use crate::batch::DashboardLink;

/// Black-box contract of the dashboard service
#[async_trait]
pub trait DashboardApi: Send + Sync {
    /// Copy the configured template and bind it to `sheet_id`
    async fn publish(&self, sheet_id: &str) -> Result<DashboardLink, ApiError>;
}

/// Identity of the template report to duplicate per run
#[derive(Debug, Clone)]
pub struct DashboardTemplate {
    pub report_id: String,
    pub page_id: String,
    /// Data source alias used inside the template
    pub alias: String,
}

impl DashboardTemplate {
    pub fn new(report_id: impl Into<String>, page_id: impl Into<String>) -> Self {
        Self {
            report_id: report_id.into(),
            page_id: page_id.into(),
            alias: "ds0".to_string(),
        }
    }
}

/// Link-builder implementation over the reporting service's create endpoint
pub struct DashboardClient {
    base_url: String,
    template: DashboardTemplate,
    connector: &'static str,
    mode: &'static str,
    /// Worksheet index inside the bound spreadsheet
    worksheet_id: &'static str,
}

impl DashboardClient {
    pub fn new(template: DashboardTemplate) -> Self {
        Self {
            base_url: "https://lookerstudio.google.com/reporting/create".to_string(),
            template,
            connector: "googleSheets",
            mode: "view",
            worksheet_id: "0",
        }
    }

    #[cfg(test)]
    fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl DashboardApi for DashboardClient {
    async fn publish(&self, sheet_id: &str) -> Result<DashboardLink, ApiError> {
        if self.template.report_id.is_empty() {
            return Err(ApiError::payload(
                ApiService::Dashboard,
                "no dashboard template report id configured",
            ));
        }

        let alias = &self.template.alias;
        let url = format!(
            "{}?c.reportId={}&c.pageId={}&c.mode={}&ds.{alias}.connector={}&ds.{alias}.spreadsheetId={}&ds.{alias}.worksheetId={}",
            self.base_url,
            encode(&self.template.report_id),
            encode(&self.template.page_id),
            self.mode,
            self.connector,
            encode(sheet_id),
            self.worksheet_id,
        );

        Ok(DashboardLink {
            url,
            created_at: Utc::now(),
        })
    }
}
