//! Sheets API client settings (`GOOGLE_API_KEY`, `SHEETS_API_*`)

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Default Sheets REST API root
pub const DEFAULT_SHEETS_API_BASE_URL: &str = "https://sheets.googleapis.com/v4";

/// Default HTTP timeout for one spreadsheet request, in seconds.
pub const DEFAULT_SHEETS_API_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetsConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    /// Turn numeric-looking cells into JSON numbers
    pub parse_numbers: bool,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SHEETS_API_BASE_URL.to_string(),
            api_key: None,
            timeout_secs: DEFAULT_SHEETS_API_TIMEOUT_SECS,
            parse_numbers: true,
        }
    }
}

impl SheetsConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let config = Self {
            base_url: env::var("SHEETS_API_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_SHEETS_API_BASE_URL.to_string()),
            api_key: env::var("GOOGLE_API_KEY").ok().filter(|k| !k.is_empty()),
            timeout_secs: env::var("SHEETS_API_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_SHEETS_API_TIMEOUT_SECS),
            parse_numbers: env::var("SHEETS_PARSE_NUMBERS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
        };

        config.validate()?;
        Ok(config)
    }

    /// Point the client at another server (a mock, in tests)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.base_url.trim().is_empty() {
            anyhow::bail!("SHEETS_API_BASE_URL cannot be empty");
        }
        if self.timeout_secs == 0 {
            anyhow::bail!("SHEETS_API_TIMEOUT_SECS must be greater than 0");
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_base_url() {
        let config = SheetsConfig::with_base_url("http://127.0.0.1:9999");
        assert_eq!(config.base_url, "http://127.0.0.1:9999");
        assert!(config.parse_numbers);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = SheetsConfig {
            timeout_secs: 0,
            ..SheetsConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
