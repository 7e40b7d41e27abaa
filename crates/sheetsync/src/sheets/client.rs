//! HTTP client for the Google Sheets REST API
//!
//! Two requests per spreadsheet: one listing sub-sheet titles, one
//! `values:batchGet` pulling every sub-sheet's grid.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use sheetsync_common::{Result, SyncError};
use tracing::{debug, instrument, warn};

use super::config::SheetsConfig;
use super::rows::grid_to_rows;
use super::{is_valid_key, Sheets, SpreadsheetSource};

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Debug, Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchValues {
    #[serde(default)]
    value_ranges: Vec<ValueRange>,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Spreadsheet source backed by the Sheets REST API
#[derive(Clone)]
pub struct GoogleSheetsClient {
    client: Client,
    config: SheetsConfig,
}

impl GoogleSheetsClient {
    pub fn new(config: SheetsConfig) -> anyhow::Result<Self> {
        config.validate()?;

        let client = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self { client, config })
    }

    fn spreadsheet_url(&self, key: &str) -> String {
        format!(
            "{}/spreadsheets/{}",
            self.config.base_url.trim_end_matches('/'),
            key
        )
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        key: &str,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let mut request = self.client.get(url).query(query);
        if let Some(api_key) = &self.config.api_key {
            request = request.query(&[("key", api_key)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SyncError::fetch(key, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::fetch(key, format!("HTTP {}", status)));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| SyncError::fetch(key, format!("invalid response body: {}", e)))
    }

    async fn sheet_titles(&self, key: &str) -> Result<Vec<String>> {
        let meta: SpreadsheetMeta = self
            .get_json(
                key,
                &self.spreadsheet_url(key),
                &[("fields", "sheets.properties.title".to_string())],
            )
            .await?;

        Ok(meta.sheets.into_iter().map(|s| s.properties.title).collect())
    }
}

/// A1 range naming a whole sub-sheet
fn quote_title(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

#[async_trait]
impl SpreadsheetSource for GoogleSheetsClient {
    #[instrument(skip(self))]
    async fn fetch(&self, key: &str) -> Result<Sheets> {
        let key = key.trim();
        if !is_valid_key(key) {
            warn!("Refusing to fetch invalid key: {}", key);
            return Err(SyncError::InvalidKey(key.to_string()));
        }

        let titles = self.sheet_titles(key).await?;
        if titles.is_empty() {
            return Err(SyncError::EmptySpreadsheet(key.to_string()));
        }

        let mut query: Vec<(&str, String)> = titles
            .iter()
            .map(|title| ("ranges", quote_title(title)))
            .collect();
        query.push(("majorDimension", "ROWS".to_string()));

        let batch: BatchValues = self
            .get_json(key, &format!("{}/values:batchGet", self.spreadsheet_url(key)), &query)
            .await?;

        if batch.value_ranges.len() != titles.len() {
            return Err(SyncError::fetch(
                key,
                format!(
                    "expected {} value ranges, got {}",
                    titles.len(),
                    batch.value_ranges.len()
                ),
            ));
        }

        let sheets: Sheets = titles
            .into_iter()
            .zip(batch.value_ranges)
            .map(|(title, range)| (title, grid_to_rows(&range.values, self.config.parse_numbers)))
            .collect();

        if sheets.values().all(|rows| rows.is_empty()) {
            return Err(SyncError::EmptySpreadsheet(key.to_string()));
        }

        debug!("Fetched {} sub-sheets from {}", sheets.len(), key);

        Ok(sheets)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_title() {
        assert_eq!(quote_title("Sheet1"), "'Sheet1'");
        assert_eq!(quote_title("Bob's data"), "'Bob''s data'");
    }

    #[tokio::test]
    async fn test_invalid_key_never_hits_network() {
        // Nothing listens on port 9; a request would fail with a Fetch error
        let client = GoogleSheetsClient::new(SheetsConfig::with_base_url("http://127.0.0.1:9"))
            .unwrap();

        let err = client.fetch("too-short").await.unwrap_err();
        assert!(matches!(err, SyncError::InvalidKey(_)));
    }
}
