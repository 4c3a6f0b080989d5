//! trackdash: batch shipment tracking into a shareable dashboard
//!
//! One invocation is one run: load a spreadsheet of tracking numbers, pull
//! status from the tracking provider, publish the merged table to a fresh
//! online sheet, and mint a dashboard link bound to it.

mod aggregate;
mod api;
mod batch;
mod cli;
mod config;
mod country;
mod loader;
mod metrics;
mod notify;
mod pipeline;
mod publish;
mod tracker;

use anyhow::Result;
use clap::Parser;
use colored::*;
use log::error;

use crate::api::{DashboardClient, SheetClient, TrackClient};
use crate::cli::Args;
use crate::config::AppConfig;
use crate::notify::{Notifier, SmtpNotifier};
use crate::pipeline::Pipeline;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = run().await {
        error!("{err:#}");
        eprintln!("{} {err:#}", "error:".red().bold());
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let args = Args::parse();
    let input = args.resolve_input()?;

    let mut config = AppConfig::from_env()?;
    args.apply(&mut config);

    let tracking = TrackClient::new(config.track.clone(), &config.resilience)?;
    let sheets = SheetClient::new(config.sheets.clone(), &config.resilience)?;
    let dashboard = DashboardClient::new(config.template.clone());
    let notifier = config.smtp.clone().map(SmtpNotifier::new);

    let pipeline = Pipeline {
        tracking: &tracking,
        sheets: &sheets,
        dashboard: &dashboard,
        notifier: notifier.as_ref().map(|n| n as &dyn Notifier),
        config: &config,
    };

    if args.dry_run {
        let preview = pipeline.preview(&input).await?;
        println!(
            "{} {} row(s), {} distinct number(s), {} with errors (dry run, nothing published)",
            "done:".green().bold(),
            preview.batch.len(),
            preview.distinct_numbers,
            preview.errored_rows
        );
        return Ok(());
    }

    let report = pipeline.run(&input).await?;

    println!(
        "{} {} row(s) published ({} distinct number(s), {} with errors)",
        "done:".green().bold(),
        report.rows,
        report.distinct_numbers,
        report.errored_rows
    );
    println!("  {} {}", "sheet:".cyan(), report.sheet_url);
    println!("  {} {}", "dashboard:".cyan(), report.link.url.bold());
    match report.notified {
        Some(true) => {
            if let Some(recipient) = &config.recipient {
                println!("  {} link sent to {recipient}", "email:".cyan());
            }
        }
        Some(false) => println!(
            "  {} notification failed, see the log above",
            "email:".yellow()
        ),
        None => {}
    }

    Ok(())
}
