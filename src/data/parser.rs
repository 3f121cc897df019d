use serde::{Deserialize, Serialize};

use crate::data::value::coerce_number;

/// Column names read from the header line of `label,value` text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnNames {
    pub x: String,
    /// `None` when the header has a single cell.
    pub y: Option<String>,
}

impl ColumnNames {
    pub fn new(x: impl Into<String>, y: impl Into<String>) -> Self {
        Self {
            x: x.into(),
            y: Some(y.into()),
        }
    }

    /// Read `X,Y` (or a lone `X`) as column names, trimming each name.
    pub fn parse(spec: &str) -> Self {
        match spec.split_once(',') {
            Some((x, y)) => Self::new(x.trim(), y.trim()),
            None => Self {
                x: spec.trim().to_string(),
                y: None,
            },
        }
    }
}

/// One labelled data row: the label is kept as text, the value coerced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataRow {
    pub x: String,
    pub y: f64,
}

/// Header plus rows of a two-column text dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedText {
    pub columns: ColumnNames,
    pub rows: Vec<DataRow>,
}

/// Parse comma-separated `label,value` text whose first line names the columns.
///
/// Blank lines are skipped and rows may have any number of cells; only the
/// first two are read. Quotes carry no meaning: every comma splits. A row
/// without a value cell gets a NaN value. Returns `None` when fewer than two non-empty lines exist.
pub fn parse_labeled_text(text: &str) -> Option<ParsedText> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b',')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(text.as_bytes());

    let mut records: Vec<Vec<String>> = Vec::new();
    for result in reader.records() {
        match result {
            Ok(record) => {
                let row: Vec<String> = record.iter().map(|s| s.to_string()).collect();
                if !row.is_empty() {
                    records.push(row);
                }
            }
            Err(e) => {
                tracing::debug!("Skipping unreadable line: {e}");
                continue;
            }
        }
    }

    if records.len() < 2 {
        return None;
    }

    let header = &records[0];
    let columns = ColumnNames {
        x: header.first().map(|s| s.trim().to_string()).unwrap_or_default(),
        y: header.get(1).map(|s| s.trim().to_string()),
    };

    let rows = records[1..]
        .iter()
        .map(|row| DataRow {
            x: row.first().map(|s| s.trim().to_string()).unwrap_or_default(),
            y: row.get(1).map(|s| coerce_number(s)).unwrap_or(f64::NAN),
        })
        .collect();

    Some(ParsedText { columns, rows })
}
