//! Configuration management
//!
//! All settings are static: read once at startup from the environment (and
//! `.env`), validated, then shared read-only.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::sheets::{is_valid_key, SheetsConfig};
use crate::upload::OutputFormat;

// ============================================================================
// Sync Configuration Constants
// ============================================================================

/// Manifest sub-sheet read from the master spreadsheet.
pub const DEFAULT_MASTER_SHEET: &str = "data";

/// Simultaneous fetches (and, separately, uploads) per stage.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Nominal cycle interval in seconds.
pub const DEFAULT_INTERVAL_SECS: u64 = 60;

/// Per-fetch and per-upload timeout in seconds.
pub const DEFAULT_ITEM_TIMEOUT_SECS: u64 = 30;

/// Local copy of the status log.
pub const DEFAULT_STATUS_FILE: &str = "./status.txt";

/// Status log object name, relative to the destination folder.
pub const DEFAULT_STATUS_OBJECT: &str = "status.txt";

/// Which documents to publish per spreadsheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FormatSelection {
    #[default]
    Json,
    Jsonp,
    Both,
}

impl FormatSelection {
    pub fn includes_jsonp(self) -> bool {
        matches!(self, FormatSelection::Jsonp | FormatSelection::Both)
    }
}

impl std::str::FromStr for FormatSelection {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(FormatSelection::Json),
            "jsonp" => Ok(FormatSelection::Jsonp),
            "both" | "json,jsonp" => Ok(FormatSelection::Both),
            _ => Err(anyhow::anyhow!(
                "Invalid SHEETSYNC_FORMATS: {}. Must be 'json', 'jsonp' or 'both'",
                s
            )),
        }
    }
}

/// Sync job configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Key of the master spreadsheet listing everything to publish
    pub master_key: String,
    pub master_sheet: String,
    /// Prefix for every object written, e.g. "sheets/"
    pub dest_folder: String,
    pub formats: FormatSelection,
    /// JSONP callback function name
    pub callback_name: Option<String>,
    pub concurrency: usize,
    pub interval_secs: u64,
    pub item_timeout_secs: u64,
    pub gzip: bool,
    pub status_file: Option<PathBuf>,
    pub status_object: String,
}

impl SyncConfig {
    /// A config with defaults for everything but the master key
    pub fn new(master_key: impl Into<String>) -> Self {
        Self {
            master_key: master_key.into(),
            master_sheet: DEFAULT_MASTER_SHEET.to_string(),
            dest_folder: String::new(),
            formats: FormatSelection::Json,
            callback_name: None,
            concurrency: DEFAULT_CONCURRENCY,
            interval_secs: DEFAULT_INTERVAL_SECS,
            item_timeout_secs: DEFAULT_ITEM_TIMEOUT_SECS,
            gzip: false,
            status_file: Some(PathBuf::from(DEFAULT_STATUS_FILE)),
            status_object: DEFAULT_STATUS_OBJECT.to_string(),
        }
    }

    /// Load sync configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        let master_key = std::env::var("SHEETSYNC_MASTER_KEY")
            .map_err(|_| anyhow::anyhow!("SHEETSYNC_MASTER_KEY must be set"))?;

        let formats = match std::env::var("SHEETSYNC_FORMATS") {
            Ok(raw) => raw.parse()?,
            Err(_) => FormatSelection::default(),
        };

        // An empty value disables the local status file
        let status_file = match std::env::var("SHEETSYNC_STATUS_FILE") {
            Ok(path) if path.trim().is_empty() => None,
            Ok(path) => Some(PathBuf::from(path)),
            Err(_) => Some(PathBuf::from(DEFAULT_STATUS_FILE)),
        };

        let config = Self {
            master_key: master_key.trim().to_string(),
            master_sheet: std::env::var("SHEETSYNC_MASTER_SHEET")
                .unwrap_or_else(|_| DEFAULT_MASTER_SHEET.to_string()),
            dest_folder: std::env::var("SHEETSYNC_DEST_FOLDER").unwrap_or_default(),
            formats,
            callback_name: std::env::var("SHEETSYNC_CALLBACK_NAME")
                .ok()
                .filter(|c| !c.trim().is_empty()),
            concurrency: std::env::var("SHEETSYNC_CONCURRENCY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_CONCURRENCY),
            interval_secs: std::env::var("SHEETSYNC_INTERVAL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_INTERVAL_SECS),
            item_timeout_secs: std::env::var("SHEETSYNC_ITEM_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_ITEM_TIMEOUT_SECS),
            gzip: std::env::var("SHEETSYNC_GZIP")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(false),
            status_file,
            status_object: std::env::var("SHEETSYNC_STATUS_OBJECT")
                .unwrap_or_else(|_| DEFAULT_STATUS_OBJECT.to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if !is_valid_key(&self.master_key) {
            anyhow::bail!(
                "SHEETSYNC_MASTER_KEY is not a valid spreadsheet key: {}",
                self.master_key
            );
        }
        if self.master_sheet.trim().is_empty() {
            anyhow::bail!("SHEETSYNC_MASTER_SHEET cannot be empty");
        }
        if self.concurrency == 0 {
            anyhow::bail!("SHEETSYNC_CONCURRENCY must be greater than 0");
        }
        if self.interval_secs == 0 {
            anyhow::bail!("SHEETSYNC_INTERVAL_SECS must be greater than 0");
        }
        if self.item_timeout_secs == 0 {
            anyhow::bail!("SHEETSYNC_ITEM_TIMEOUT_SECS must be greater than 0");
        }
        if self.formats.includes_jsonp() {
            match self.callback_name.as_deref() {
                None => anyhow::bail!("SHEETSYNC_CALLBACK_NAME is required for JSONP output"),
                Some(name) if !is_js_identifier(name) => {
                    anyhow::bail!("SHEETSYNC_CALLBACK_NAME is not a valid function name: {}", name)
                },
                _ => {},
            }
        }
        if self.status_object.trim().is_empty() {
            anyhow::bail!("SHEETSYNC_STATUS_OBJECT cannot be empty");
        }
        Ok(())
    }

    pub fn output_formats(&self) -> Vec<OutputFormat> {
        let jsonp = || OutputFormat::Jsonp {
            callback: self.callback_name.clone().unwrap_or_default(),
        };

        match self.formats {
            FormatSelection::Json => vec![OutputFormat::Json],
            FormatSelection::Jsonp => vec![jsonp()],
            FormatSelection::Both => vec![OutputFormat::Json, jsonp()],
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn item_timeout(&self) -> Duration {
        Duration::from_secs(self.item_timeout_secs)
    }
}

/// Dotted identifiers like `app.sheets.loaded` are allowed
fn is_js_identifier(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|part| {
            let mut chars = part.chars();
            chars
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        })
}

/// Everything needed to run the job, minus object store credentials
#[derive(Debug, Clone)]
pub struct Config {
    pub sync: SyncConfig,
    pub sheets: SheetsConfig,
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            sync: SyncConfig::from_env()?,
            sheets: SheetsConfig::from_env()?,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn key() -> String {
        "m".repeat(44)
    }

    #[test]
    fn test_defaults_validate() {
        let config = SyncConfig::new(key());
        assert!(config.validate().is_ok());
        assert_eq!(config.output_formats(), vec![OutputFormat::Json]);
        assert_eq!(config.interval(), Duration::from_secs(60));
        assert_eq!(config.concurrency, 5);
    }

    #[test]
    fn test_rejects_bad_master_key_and_zero_limits() {
        assert!(SyncConfig::new("nope").validate().is_err());

        let mut config = SyncConfig::new(key());
        config.concurrency = 0;
        assert!(config.validate().is_err());

        let mut config = SyncConfig::new(key());
        config.interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_jsonp_requires_callback() {
        let mut config = SyncConfig::new(key());
        config.formats = FormatSelection::Both;
        assert!(config.validate().is_err());

        config.callback_name = Some("alert(1)//".to_string());
        assert!(config.validate().is_err());

        config.callback_name = Some("app.onSheet".to_string());
        assert!(config.validate().is_ok());
        assert_eq!(
            config.output_formats(),
            vec![
                OutputFormat::Json,
                OutputFormat::Jsonp {
                    callback: "app.onSheet".to_string()
                }
            ]
        );
    }

    #[test]
    fn test_format_selection_from_str() {
        assert_eq!("JSONP".parse::<FormatSelection>().unwrap(), FormatSelection::Jsonp);
        assert_eq!("both".parse::<FormatSelection>().unwrap(), FormatSelection::Both);
        assert!("xml".parse::<FormatSelection>().is_err());
    }

    #[test]
    #[serial]
    fn test_from_env() {
        std::env::set_var("SHEETSYNC_MASTER_KEY", format!(" {} ", key()));
        std::env::set_var("SHEETSYNC_DEST_FOLDER", "sheets/");
        std::env::set_var("SHEETSYNC_CONCURRENCY", "3");
        std::env::set_var("SHEETSYNC_STATUS_FILE", "");

        let config = SyncConfig::from_env();

        for var in [
            "SHEETSYNC_MASTER_KEY",
            "SHEETSYNC_DEST_FOLDER",
            "SHEETSYNC_CONCURRENCY",
            "SHEETSYNC_STATUS_FILE",
        ] {
            std::env::remove_var(var);
        }

        let config = config.unwrap();
        assert_eq!(config.master_key, key());
        assert_eq!(config.dest_folder, "sheets/");
        assert_eq!(config.concurrency, 3);
        assert_eq!(config.status_file, None);
    }

    #[test]
    #[serial]
    fn test_from_env_requires_master_key() {
        std::env::remove_var("SHEETSYNC_MASTER_KEY");
        assert!(SyncConfig::from_env().is_err());
    }
}
