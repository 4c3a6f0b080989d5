//! Optional email notifier
//!
//! Sends the dashboard link to a configured recipient over SMTP. The
//! pipeline treats any failure here as non-fatal: by the time this runs the
//! dashboard is already live, so the run still reports success.

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use log::info;
use std::time::Duration;

use crate::api::error::{ApiError, ApiService};
use crate::batch::DashboardLink;
use crate::config::SmtpConfig;

const SEND_TIMEOUT: Duration = Duration::from_secs(30);

/// Black-box contract of the mail service
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_link(&self, recipient: &str, link: &DashboardLink) -> Result<(), ApiError>;
}

pub struct SmtpNotifier {
    config: SmtpConfig,
}

impl SmtpNotifier {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    fn mailer(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, ApiError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.host)
            .map_err(|e| ApiError::payload(ApiService::Mail, e.to_string()))?
            .port(self.config.port)
            .credentials(Credentials::new(
                self.config.user.clone(),
                self.config.pass.clone(),
            ))
            .build();
        Ok(transport)
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send_link(&self, recipient: &str, link: &DashboardLink) -> Result<(), ApiError> {
        let from: Mailbox = self
            .config
            .from
            .parse()
            .map_err(|_| ApiError::payload(ApiService::Mail, "invalid from address"))?;
        let to: Mailbox = recipient
            .parse()
            .map_err(|_| ApiError::payload(ApiService::Mail, "invalid recipient address"))?;

        let body = format!(
            "Your shipment tracking dashboard is ready.\n\n{}\n\nGenerated {}.\n",
            link.url,
            link.created_at.format("%Y-%m-%d %H:%M UTC")
        );
        let message = Message::builder()
            .from(from)
            .to(to)
            .subject("Shipment tracking dashboard")
            .body(body)
            .map_err(|e| ApiError::payload(ApiService::Mail, e.to_string()))?;

        let mailer = self.mailer()?;
        tokio::time::timeout(SEND_TIMEOUT, mailer.send(message))
            .await
            .map_err(|_| ApiError::payload(ApiService::Mail, "SMTP send timed out"))?
            .map_err(|e| ApiError::payload(ApiService::Mail, e.to_string()))?;

        info!("dashboard link emailed to {recipient}");
        Ok(())
    }
}
