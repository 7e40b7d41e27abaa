//! Cell grid to row objects
//!
//! The first grid row is the header. Header cells are normalised to lowercase
//! ASCII alphanumerics and `-` ("Cache Age" -> "cacheage"), so manifest and
//! data columns can be addressed without caring about spacing or case.

use serde_json::{Number, Value};

use super::Row;

/// Normalise a header cell into a column name
pub fn normalize_header(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Convert a grid of cells into row objects.
///
/// Columns whose header normalises to nothing are dropped, blank rows are
/// skipped and missing trailing cells become empty strings.
pub fn grid_to_rows(grid: &[Vec<Value>], parse_numbers: bool) -> Vec<Row> {
    let Some((header, body)) = grid.split_first() else {
        return Vec::new();
    };

    let columns: Vec<(usize, String)> = header
        .iter()
        .enumerate()
        .filter_map(|(idx, cell)| {
            let name = normalize_header(&cell_text(cell));
            (!name.is_empty()).then_some((idx, name))
        })
        .collect();

    body.iter()
        .filter(|cells| !is_blank_row(cells))
        .map(|cells| {
            columns
                .iter()
                .map(|(idx, name)| {
                    let value = cells
                        .get(*idx)
                        .map(|cell| convert_cell(cell, parse_numbers))
                        .unwrap_or_else(|| Value::String(String::new()));
                    (name.clone(), value)
                })
                .collect()
        })
        .collect()
}

fn is_blank_row(cells: &[Value]) -> bool {
    cells.iter().all(|cell| cell_text(cell).trim().is_empty())
}

fn cell_text(cell: &Value) -> String {
    match cell {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn convert_cell(cell: &Value, parse_numbers: bool) -> Value {
    match cell {
        Value::String(s) if parse_numbers => parse_number(s).unwrap_or_else(|| cell.clone()),
        Value::Null => Value::String(String::new()),
        other => other.clone(),
    }
}

/// Parse a cell as a JSON number; integers stay integers
pub fn parse_number(text: &str) -> Option<Value> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(int) = text.parse::<i64>() {
        return Some(Value::Number(int.into()));
    }
    // Integers too large for i64 would lose digits as floats
    if text.trim_start_matches('-').chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    text.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite() && !text.chars().any(|c| c.is_ascii_alphabetic()))
        .and_then(Number::from_f64)
        .map(Value::Number)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn grid(value: Value) -> Vec<Vec<Value>> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("Cache Age"), "cacheage");
        assert_eq!(normalize_header("first-name"), "first-name");
        assert_eq!(normalize_header("Price (£)"), "price");
        assert_eq!(normalize_header("  "), "");
    }

    #[test]
    fn test_grid_to_rows() {
        let rows = grid_to_rows(
            &grid(json!([
                ["Name", "Score", "Notes"],
                ["Ann", "12", "ok"],
                ["", "", ""],
                ["Bob", "3.5"]
            ])),
            true,
        );

        assert_eq!(rows.len(), 2);
        assert_eq!(Value::Object(rows[0].clone()), json!({"name": "Ann", "score": 12, "notes": "ok"}));
        assert_eq!(Value::Object(rows[1].clone()), json!({"name": "Bob", "score": 3.5, "notes": ""}));
    }

    #[test]
    fn test_numbers_left_alone_when_disabled() {
        let rows = grid_to_rows(&grid(json!([["n"], ["42"]])), false);
        assert_eq!(rows[0]["n"], json!("42"));
    }

    #[test]
    fn test_unnamed_columns_dropped() {
        let rows = grid_to_rows(&grid(json!([["a", "", "b"], ["1", "ignored", "2"]])), true);
        assert_eq!(rows[0].len(), 2);
        assert!(rows[0].contains_key("a") && rows[0].contains_key("b"));
    }

    #[test]
    fn test_parse_number_rejects_words() {
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("1e3"), None);
        assert_eq!(parse_number("-7"), Some(json!(-7)));
        assert_eq!(parse_number(" 0.25 "), Some(json!(0.25)));
        assert_eq!(parse_number(&"9".repeat(44)), None);
    }

    #[test]
    fn test_empty_grid() {
        assert!(grid_to_rows(&[], true).is_empty());
        assert!(grid_to_rows(&grid(json!([["only", "header"]])), true).is_empty());
    }
}
