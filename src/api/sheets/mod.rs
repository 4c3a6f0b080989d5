//! Remote spreadsheet client
//!
//! The cloud spreadsheet service exposes a create-then-write contract: one
//! call creates a named spreadsheet, a second writes a rectangular value
//! range into it. Replace mode overwrites from A1; append mode adds rows
//! after the existing data.

pub mod client;

use async_trait::async_trait;

use crate::api::error::ApiError;
use crate::config::PublishMode;

pub use client::{SheetClient, SheetConfig};

/// Black-box contract of the spreadsheet service
#[async_trait]
pub trait SheetApi: Send + Sync {
    /// Create an empty spreadsheet and return its id
    async fn create_spreadsheet(&self, title: &str) -> Result<String, ApiError>;

    /// Write the table (header row first) into the spreadsheet.
    /// Row order must be preserved exactly.
    async fn write_rows(
        &self,
        sheet_id: &str,
        mode: PublishMode,
        rows: &[Vec<String>],
    ) -> Result<(), ApiError>;
}

/// Browser URL for a published spreadsheet
pub fn sheet_url(sheet_id: &str) -> String {
    format!("https://docs.google.com/spreadsheets/d/{sheet_id}/edit#gid=0")
}

/// A1-notation range covering `rows` x `cols` cells anchored at A1
pub fn a1_range(sheet_name: &str, rows: usize, cols: usize) -> String {
    format!("{}!A1:{}{}", sheet_name, column_letter(cols), rows)
}

/// 1-based column index to spreadsheet letters (1 -> A, 27 -> AA)
fn column_letter(mut col: usize) -> String {
    let mut letters = Vec::new();
    while col > 0 {
        let rem = (col - 1) % 26;
        letters.push(b'A' + rem as u8);
        col = (col - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).expect("ASCII letters")
}
