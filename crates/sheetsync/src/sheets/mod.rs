//! Spreadsheet fetching
//!
//! A spreadsheet is addressed by a 44-character key and holds any number of
//! named sub-sheets. Fetching one yields [`Sheets`]: sub-sheet name to rows,
//! each row a JSON object keyed by normalised column header.

use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use sheetsync_common::Result;

pub mod client;
pub mod config;
pub mod rows;

pub use client::GoogleSheetsClient;
pub use config::SheetsConfig;

/// Exact length of a well-formed spreadsheet key
pub const KEY_LENGTH: usize = 44;

/// One spreadsheet row, keyed by normalised column header
pub type Row = Map<String, Value>;

/// Sub-sheet name to rows, in the spreadsheet's tab order
pub type Sheets = IndexMap<String, Vec<Row>>;

/// Structural sanity check on a spreadsheet key.
///
/// True iff the trimmed key is exactly 44 characters of ASCII alphanumerics,
/// underscore or hyphen. The remote service remains the real authority.
pub fn is_valid_key(key: &str) -> bool {
    let key = key.trim();
    key.len() == KEY_LENGTH
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Source of spreadsheet data
#[async_trait]
pub trait SpreadsheetSource: Send + Sync {
    /// Fetch every sub-sheet of the spreadsheet identified by `key`.
    ///
    /// Implementations must reject invalid keys with
    /// [`SyncError::InvalidKey`](sheetsync_common::SyncError::InvalidKey)
    /// without touching the network, and report a spreadsheet with no data
    /// rows as [`SyncError::EmptySpreadsheet`](sheetsync_common::SyncError::EmptySpreadsheet).
    async fn fetch(&self, key: &str) -> Result<Sheets>;
}
