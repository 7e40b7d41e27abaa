//! Sheetsync Common Library
//!
//! Shared error handling, logging and time utilities for the sheetsync workspace.
//!
//! # Overview
//!
//! - **Error Handling**: [`SyncError`] covers every failure a sync cycle can hit
//! - **Logging**: [`logging::init_logging`] sets up the global `tracing` subscriber
//! - **Time**: [`time::human_timestamp`] renders the `updated` stamp embedded in
//!   published documents
//!
//! # Example
//!
//! ```no_run
//! use sheetsync_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = LogConfig::from_env()?;
//!     init_logging(&config)?;
//!     Ok(())
//! }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod error;
pub mod logging;
pub mod time;

// Re-export commonly used types
pub use error::{Result, SyncError};
