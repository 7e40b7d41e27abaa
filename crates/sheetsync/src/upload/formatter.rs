//! Fetched spreadsheet to uploadable document
//!
//! Pure transformation: everything that varies between calls (the clock
//! included) comes in through arguments.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use sheetsync_common::time::human_timestamp;
use sheetsync_common::{Result, SyncError};

use crate::manifest::ManifestEntry;
use crate::sheets::{Row, Sheets};

/// A ready-to-publish document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadObject {
    pub destination_path: String,
    pub body: String,
    pub content_type: String,
    pub cache_control: String,
}

/// Serialisation of one spreadsheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    /// JSON wrapped in a call to `callback`
    Jsonp { callback: String },
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Jsonp { .. } => "jsonp",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            OutputFormat::Json => "application/json",
            OutputFormat::Jsonp { .. } => "application/javascript",
        }
    }
}

#[derive(Serialize)]
struct Document<'a> {
    sheets: IndexMap<&'a str, &'a [Row]>,
    updated: String,
    name: &'a str,
}

#[derive(Debug, Clone)]
pub struct UploadFormatter {
    folder: String,
    formats: Vec<OutputFormat>,
}

impl UploadFormatter {
    /// `folder` is prepended verbatim to every destination path
    pub fn new(folder: impl Into<String>, formats: Vec<OutputFormat>) -> Self {
        Self {
            folder: folder.into(),
            formats,
        }
    }

    pub fn formats(&self) -> &[OutputFormat] {
        &self.formats
    }

    /// Destination path for an arbitrary object name under the folder
    pub fn path_for(&self, name: &str) -> String {
        format!("{}{}", self.folder, name)
    }

    /// One object per configured output format
    pub fn format(
        &self,
        entry: &ManifestEntry,
        sheets: &Sheets,
        updated: DateTime<Utc>,
    ) -> Result<Vec<UploadObject>> {
        let json = document_json(entry, sheets, updated)?;

        Ok(self
            .formats
            .iter()
            .map(|format| self.wrap(entry, &json, format))
            .collect())
    }

    /// A single object in the given format
    pub fn format_as(
        &self,
        entry: &ManifestEntry,
        sheets: &Sheets,
        updated: DateTime<Utc>,
        format: &OutputFormat,
    ) -> Result<UploadObject> {
        let json = document_json(entry, sheets, updated)?;
        Ok(self.wrap(entry, &json, format))
    }

    fn wrap(&self, entry: &ManifestEntry, json: &str, format: &OutputFormat) -> UploadObject {
        let body = match format {
            OutputFormat::Json => json.to_string(),
            OutputFormat::Jsonp { callback } => format!("{}({});", callback, json),
        };

        UploadObject {
            destination_path: self.path_for(&format!("{}.{}", entry.key.trim(), format.extension())),
            body,
            content_type: format.content_type().to_string(),
            cache_control: cache_control(entry),
        }
    }
}

pub fn cache_control(entry: &ManifestEntry) -> String {
    format!("max-age={}, public", entry.cache_age_secs())
}

/// Sub-sheets to publish: the filter's names that exist, or everything
pub fn select_sheets<'a>(entry: &'a ManifestEntry, sheets: &'a Sheets) -> Vec<(&'a str, &'a [Row])> {
    if entry.sheet_filter.is_empty() {
        return sheets
            .iter()
            .map(|(name, rows)| (name.as_str(), rows.as_slice()))
            .collect();
    }

    entry
        .sheet_filter
        .iter()
        .filter_map(|name| {
            sheets
                .get_key_value(name.as_str())
                .map(|(name, rows)| (name.as_str(), rows.as_slice()))
        })
        .collect()
}

fn document_json(entry: &ManifestEntry, sheets: &Sheets, updated: DateTime<Utc>) -> Result<String> {
    let document = Document {
        sheets: select_sheets(entry, sheets).into_iter().collect(),
        updated: human_timestamp(updated),
        name: entry.display_name(),
    };

    let json = serde_json::to_string(&document).map_err(|e| SyncError::Format {
        key: entry.key.clone(),
        reason: e.to_string(),
    })?;

    // Stored as a single line
    Ok(json.replace(['\r', '\n'], ""))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::{json, Value};

    fn key() -> String {
        "k".repeat(44)
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    fn rows(value: Value) -> Vec<Row> {
        serde_json::from_value(value).unwrap()
    }

    /// Two tabs, deliberately not in alphabetical order
    fn sample() -> Sheets {
        Sheets::from([
            ("Sheet1".to_string(), rows(json!([{"a": 1}]))),
            ("Other".to_string(), rows(json!([{"b": "two\nlines\r\n"}]))),
        ])
    }

    fn json_formatter() -> UploadFormatter {
        UploadFormatter::new("sheets/", vec![OutputFormat::Json])
    }

    #[test]
    fn test_json_object() {
        let entry = ManifestEntry::new(key()).with_name("Budget").with_cache_age(300);
        let objects = json_formatter().format(&entry, &sample(), at()).unwrap();

        assert_eq!(objects.len(), 1);
        let object = &objects[0];
        assert_eq!(object.destination_path, format!("sheets/{}.json", key()));
        assert_eq!(object.content_type, "application/json");
        assert_eq!(object.cache_control, "max-age=300, public");

        let body: Value = serde_json::from_str(&object.body).unwrap();
        assert_eq!(body["name"], "Budget");
        assert_eq!(body["updated"], "Mon Oct 19 2026 12:00:00 GMT+0000 (UTC)");
        assert_eq!(body["sheets"]["Sheet1"], json!([{"a": 1}]));
    }

    #[test]
    fn test_jsonp_object() {
        let formatter = UploadFormatter::new(
            "",
            vec![OutputFormat::Jsonp {
                callback: "handleSheet".to_string(),
            }],
        );
        let objects = formatter.format(&ManifestEntry::new(key()), &sample(), at()).unwrap();
        let object = &objects[0];

        assert_eq!(object.destination_path, format!("{}.jsonp", key()));
        assert_eq!(object.content_type, "application/javascript");
        assert!(object.body.starts_with("handleSheet({"));
        assert!(object.body.ends_with("});"));
    }

    #[test]
    fn test_both_formats_share_one_document() {
        let formatter = UploadFormatter::new(
            "f/",
            vec![
                OutputFormat::Json,
                OutputFormat::Jsonp {
                    callback: "cb".to_string(),
                },
            ],
        );
        let objects = formatter.format(&ManifestEntry::new(key()), &sample(), at()).unwrap();

        assert_eq!(objects.len(), 2);
        assert_eq!(objects[1].body, format!("cb({});", objects[0].body));
    }

    #[test]
    fn test_defaults_for_name_and_cache_age() {
        let entry = ManifestEntry::new(key()).with_name("");
        let object = json_formatter()
            .format_as(&entry, &sample(), at(), &OutputFormat::Json)
            .unwrap();

        let body: Value = serde_json::from_str(&object.body).unwrap();
        assert_eq!(body["name"], "undefined");
        assert_eq!(object.cache_control, "max-age=60, public");
    }

    #[test]
    fn test_body_is_single_line() {
        let object = json_formatter()
            .format_as(&ManifestEntry::new(key()), &sample(), at(), &OutputFormat::Json)
            .unwrap();

        assert!(!object.body.contains('\n'));
        assert!(!object.body.contains('\r'));
    }

    #[test]
    fn test_deterministic_for_fixed_clock() {
        let entry = ManifestEntry::new(key()).with_sheet_filter(["Other"]);
        let first = json_formatter().format(&entry, &sample(), at()).unwrap();
        let second = json_formatter().format(&entry, &sample(), at()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_filter_drops_unknown_and_unlisted_sheets() {
        let entry = ManifestEntry::new(key()).with_sheet_filter(["Sheet1", "Ghost"]);
        let object = json_formatter()
            .format_as(&entry, &sample(), at(), &OutputFormat::Json)
            .unwrap();

        let body: Value = serde_json::from_str(&object.body).unwrap();
        let names: Vec<&String> = body["sheets"].as_object().unwrap().keys().collect();
        assert_eq!(names, vec!["Sheet1"]);
    }

    #[test]
    fn test_empty_filter_keeps_every_sheet() {
        let input = sample();
        let entry = ManifestEntry::new(key());
        let selected = select_sheets(&entry, &input);

        let names: Vec<&str> = selected.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, vec!["Sheet1", "Other"]);
    }

    #[test]
    fn test_document_keeps_tab_order() {
        let object = json_formatter()
            .format_as(&ManifestEntry::new(key()), &sample(), at(), &OutputFormat::Json)
            .unwrap();

        let first = object.body.find(r#""Sheet1""#).unwrap();
        let second = object.body.find(r#""Other""#).unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_filter_order_decides_document_order() {
        let entry = ManifestEntry::new(key()).with_sheet_filter(["Other", "Sheet1"]);
        let object = json_formatter()
            .format_as(&entry, &sample(), at(), &OutputFormat::Json)
            .unwrap();

        let first = object.body.find(r#""Other""#).unwrap();
        let second = object.body.find(r#""Sheet1""#).unwrap();
        assert!(first < second);
    }
}
