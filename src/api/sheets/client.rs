//! HTTP implementation of the spreadsheet contract

use async_trait::async_trait;
use log::debug;
use serde_json::json;
use std::time::Duration;

use super::{a1_range, SheetApi};
use crate::api::error::{ApiError, ApiService};
use crate::api::resilience::{ResilienceConfig, RetryPolicy};
use crate::config::PublishMode;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const WORKSHEET_NAME: &str = "Sheet1";

/// Connection settings for the spreadsheet service
#[derive(Debug, Clone)]
pub struct SheetConfig {
    /// OAuth bearer token, treated as an opaque provided input
    pub token: String,
    pub base_url: String,
}

impl SheetConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            base_url: "https://sheets.googleapis.com/v4".to_string(),
        }
    }
}

pub struct SheetClient {
    http: reqwest::Client,
    config: SheetConfig,
    retry: RetryPolicy,
}

impl SheetClient {
    pub fn new(config: SheetConfig, resilience: &ResilienceConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ApiError::network(ApiService::Spreadsheet, e))?;
        Ok(Self {
            http,
            config,
            retry: RetryPolicy::new(resilience.retry.clone()),
        })
    }

    async fn send_json(
        &self,
        name: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<serde_json::Value, ApiError> {
        self.retry
            .execute(name, || {
                let request = request.try_clone().expect("request body is cloneable JSON");
                async move {
                    let response = request
                        .bearer_auth(&self.config.token)
                        .send()
                        .await
                        .map_err(|e| ApiError::network(ApiService::Spreadsheet, e))?;

                    if !response.status().is_success() {
                        return Err(
                            ApiError::from_response(ApiService::Spreadsheet, response).await
                        );
                    }

                    response
                        .json::<serde_json::Value>()
                        .await
                        .map_err(|e| ApiError::payload(ApiService::Spreadsheet, e.to_string()))
                }
            })
            .await
    }
}

#[async_trait]
impl SheetApi for SheetClient {
    async fn create_spreadsheet(&self, title: &str) -> Result<String, ApiError> {
        let url = format!("{}/spreadsheets", self.config.base_url.trim_end_matches('/'));
        debug!("creating spreadsheet '{title}'");

        let body = json!({ "properties": { "title": title } });
        let response = self
            .send_json("create_spreadsheet", self.http.post(&url).json(&body))
            .await?;

        response
            .get("spreadsheetId")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| {
                ApiError::payload(ApiService::Spreadsheet, "response missing spreadsheetId")
            })
    }

    async fn write_rows(
        &self,
        sheet_id: &str,
        mode: PublishMode,
        rows: &[Vec<String>],
    ) -> Result<(), ApiError> {
        if rows.is_empty() {
            return Ok(());
        }

        let cols = rows.iter().map(Vec::len).max().unwrap_or(0);
        let range = a1_range(WORKSHEET_NAME, rows.len(), cols);
        let base = self.config.base_url.trim_end_matches('/');

        // '!' and ':' are legal path characters; the service accepts raw A1 ranges
        let request = match mode {
            PublishMode::Replace => self.http.put(format!(
                "{base}/spreadsheets/{sheet_id}/values/{range}?valueInputOption=RAW"
            )),
            PublishMode::Append => self.http.post(format!(
                "{base}/spreadsheets/{sheet_id}/values/{range}:append?valueInputOption=RAW"
            )),
        };

        debug!("writing {} rows to {} ({:?})", rows.len(), range, mode);
        let body = json!({ "values": rows });
        self.send_json("write_rows", request.json(&body)).await?;
        Ok(())
    }
}
