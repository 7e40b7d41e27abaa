//! Sheetsync
//!
//! Publishes spreadsheets as static JSON. Every cycle reads a master
//! spreadsheet listing the spreadsheets to publish, fetches each of them with
//! bounded concurrency, renders JSON (and optionally JSONP) documents, and
//! uploads them to an S3-compatible bucket with cache headers. A status log
//! for the cycle is written locally and uploaded alongside.
//!
//! # Modules
//!
//! - [`sheets`]: spreadsheet fetching and row normalisation
//! - [`manifest`]: parsing the master spreadsheet
//! - [`upload`]: document formatting and publishing
//! - [`storage`]: object store backends
//! - [`sync`]: batch orchestration, status log and scheduling
//! - [`config`]: environment configuration
//!
//! # Example
//!
//! ```no_run
//! use sheetsync::config::Config;
//! use sheetsync::sheets::GoogleSheetsClient;
//! use sheetsync::storage::{config::StorageConfig, S3Storage};
//! use sheetsync::sync::CycleRunner;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let source = Arc::new(GoogleSheetsClient::new(config.sheets.clone())?);
//!     let store = Arc::new(S3Storage::new(StorageConfig::from_env()?).await?);
//!
//!     let report = CycleRunner::from_config(&config.sync, source, store).run_cycle().await;
//!     println!("{:?}", report.outcome());
//!     Ok(())
//! }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod config;
pub mod manifest;
pub mod sheets;
pub mod storage;
pub mod sync;
pub mod upload;
