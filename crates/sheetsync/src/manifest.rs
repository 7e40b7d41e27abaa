//! Master manifest parsing
//!
//! The master spreadsheet lists every child spreadsheet to publish, one per
//! row of its manifest sub-sheet:
//!
//! | column                          | meaning                                  |
//! |---------------------------------|------------------------------------------|
//! | `key`                           | spreadsheet key (required, validated)    |
//! | `name`                          | display name (optional)                  |
//! | `cacheage` / `cache`            | max-age seconds (optional, default 60)   |
//! | `sheets`                        | comma-separated sub-sheet filter         |
//! | `invalid` / `disabled` / `skip` | truthy value skips the row               |
//!
//! Column names are matched after header normalisation, so "Cache Age" works.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::sheets::{is_valid_key, Row, Sheets};

/// Cache age applied when a row gives none, in seconds
pub const DEFAULT_CACHE_AGE_SECS: u64 = 60;

/// Name published when a row gives none
pub const UNNAMED: &str = "undefined";

const CACHE_AGE_COLUMNS: [&str; 2] = ["cacheage", "cache"];
const SKIP_COLUMNS: [&str; 3] = ["invalid", "disabled", "skip"];

/// One child spreadsheet listed in the manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub key: String,
    pub name: Option<String>,
    pub cache_age: Option<u64>,
    /// Sub-sheets to publish; empty means all of them
    pub sheet_filter: Vec<String>,
}

impl ManifestEntry {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: None,
            cache_age: None,
            sheet_filter: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_cache_age(mut self, secs: u64) -> Self {
        self.cache_age = Some(secs);
        self
    }

    pub fn with_sheet_filter<I, S>(mut self, sheets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sheet_filter = sheets.into_iter().map(Into::into).collect();
        self
    }

    /// Display name, falling back to the literal "undefined"
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => UNNAMED,
        }
    }

    pub fn cache_age_secs(&self) -> u64 {
        self.cache_age.unwrap_or(DEFAULT_CACHE_AGE_SECS)
    }
}

/// Why a manifest row was left out
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowRejection {
    #[error("row {row}: no key")]
    MissingKey { row: usize },

    #[error("row {row}: spreadsheet key is invalid: {key}")]
    InvalidKey { row: usize, key: String },

    #[error("row {row}: marked invalid ({column}={value})")]
    MarkedInvalid {
        row: usize,
        column: String,
        value: String,
    },
}

/// Manifest rows split into usable entries and rejections
#[derive(Debug, Default)]
pub struct Manifest {
    pub entries: Vec<ManifestEntry>,
    pub rejected: Vec<RowRejection>,
    /// Non-fatal oddities, e.g. an unreadable cache age
    pub warnings: Vec<String>,
}

impl Manifest {
    /// Parse the manifest from a fetched master spreadsheet.
    ///
    /// Reads `sheet_name` or, when the master has no such sub-sheet, its
    /// first tab.
    pub fn from_sheets(sheets: &Sheets, sheet_name: &str) -> Option<Self> {
        let rows = sheets
            .get(sheet_name)
            .or_else(|| sheets.values().next())?;
        Some(Self::from_rows(rows))
    }

    pub fn from_rows(rows: &[Row]) -> Self {
        let mut manifest = Manifest::default();

        // Row numbers are 1-based and skip the header, like the sheet UI
        for (idx, row) in rows.iter().enumerate() {
            let row_number = idx + 2;
            match parse_row(row_number, row, &mut manifest.warnings) {
                Ok(entry) => manifest.entries.push(entry),
                Err(rejection) => {
                    warn!("Skipping manifest {}", rejection);
                    manifest.rejected.push(rejection);
                },
            }
        }

        manifest
    }
}

fn parse_row(row_number: usize, row: &Row, warnings: &mut Vec<String>) -> Result<ManifestEntry, RowRejection> {
    for column in SKIP_COLUMNS {
        if let Some(value) = row.get(column).filter(|v| is_truthy(v)) {
            return Err(RowRejection::MarkedInvalid {
                row: row_number,
                column: column.to_string(),
                value: text(value),
            });
        }
    }

    let key = row.get("key").map(text).unwrap_or_default();
    let key = key.trim();
    if key.is_empty() {
        return Err(RowRejection::MissingKey { row: row_number });
    }
    if !is_valid_key(key) {
        return Err(RowRejection::InvalidKey {
            row: row_number,
            key: key.to_string(),
        });
    }

    let name = row
        .get("name")
        .map(text)
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    let cache_age = CACHE_AGE_COLUMNS
        .iter()
        .filter_map(|column| row.get(*column))
        .map(text)
        .map(|raw| raw.trim().to_string())
        .find(|raw| !raw.is_empty())
        .and_then(|raw| match parse_cache_age(&raw) {
            Some(secs) => Some(secs),
            None => {
                let msg = format!(
                    "row {}: cache age {:?} is not a number of seconds, using {}",
                    row_number, raw, DEFAULT_CACHE_AGE_SECS
                );
                warn!("{}", msg);
                warnings.push(msg);
                None
            },
        });

    let sheet_filter = row
        .get("sheets")
        .map(text)
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Ok(ManifestEntry {
        key: key.to_string(),
        name,
        cache_age,
        sheet_filter,
    })
}

fn parse_cache_age(raw: &str) -> Option<u64> {
    raw.parse::<u64>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0)
            .map(|f| f as u64)
    })
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => matches!(
            s.trim().to_lowercase().as_str(),
            "true" | "yes" | "y" | "1" | "x"
        ),
        _ => false,
    }
}
