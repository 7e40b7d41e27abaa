//! Formatting and publishing of spreadsheet documents

pub mod formatter;
pub mod publisher;

pub use formatter::{OutputFormat, UploadFormatter, UploadObject};
pub use publisher::{ObjectStorePublisher, NO_CACHE};
