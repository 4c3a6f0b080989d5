//! Command-line surface
//!
//! One command, one run. Flags only cover behavior; credentials stay in the
//! environment so they never end up in shell history.

use anyhow::{bail, Result};
use clap::Parser;
use dialoguer::Input;
use std::path::PathBuf;

use crate::config::{AppConfig, PublishMode};

const SUPPORTED_EXTENSIONS: [&str; 2] = ["csv", "xlsx"];

/// Track shipments from a spreadsheet and publish a live dashboard
#[derive(Debug, Parser)]
#[command(name = "trackdash", version, about)]
pub struct Args {
    /// Input file with tracking numbers (.csv or .xlsx); prompted for when omitted
    pub input: Option<PathBuf>,

    /// Name of the tracking-number column
    #[arg(long, default_value = "tracking_number")]
    pub column: String,

    /// Name of the order-date column used for shipping-time metrics
    #[arg(long, default_value = "order_created_at")]
    pub order_date_column: String,

    /// How to write rows into the published sheet
    #[arg(long, value_enum, default_value_t = PublishMode::Replace)]
    pub mode: PublishMode,

    /// Email the dashboard link to this address after publishing
    #[arg(long)]
    pub email: Option<String>,

    /// Also write the merged table to a local CSV file
    #[arg(long)]
    pub snapshot: Option<PathBuf>,

    /// Load, track, and aggregate without publishing anything
    #[arg(long)]
    pub dry_run: bool,
}

impl Args {
    /// Fold the flags into the environment-derived config
    pub fn apply(&self, config: &mut AppConfig) {
        config.tracking_column = self.column.clone();
        config.order_date_column = self.order_date_column.clone();
        config.publish_mode = self.mode;
        config.recipient = self.email.clone();
        config.snapshot = self.snapshot.clone();
    }

    /// Return the input path, prompting interactively when none was given
    pub fn resolve_input(&self) -> Result<PathBuf> {
        let path = match &self.input {
            Some(path) => path.clone(),
            None => {
                let entered: String = Input::new()
                    .with_prompt("Input file (.csv or .xlsx)")
                    .interact_text()?;
                PathBuf::from(entered.trim())
            }
        };

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        if !SUPPORTED_EXTENSIONS.contains(&ext.as_str()) {
            bail!(
                "unsupported input file '{}': expected one of {}",
                path.display(),
                SUPPORTED_EXTENSIONS.join(", ")
            );
        }
        if !path.exists() {
            bail!("input file does not exist: {}", path.display());
        }
        Ok(path)
    }
}
