use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Header line of every normalized dataset.
pub const CSV_HEADER: &str = "Year,Value";

/// Returned when no year/value pair can be recovered at all.
pub const PLACEHOLDER_CSV: &str = "Label,Value\nA,1";

// Numeric cell: optional sign, 1-3 integer digits, optional `.`/`,` fraction.
const NUMBER: &str = r"[-+]?\d{1,3}(?:[.,]\d+)?";

static STRICT_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"^(\d{{4}})\s+({NUMBER})%?$")).unwrap());

static YEAR_CELL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{4}$").unwrap());

static NUMBER_CELL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"^({NUMBER})%?$")).unwrap());

// A year in 1900-2099, then later a number that does not continue a longer digit run.
static SENTENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\b((?:19|20)\d{{2}})\b(?:.*?[^\d.,+\-])?({NUMBER})(?:%|\b|$)"
    ))
    .unwrap()
});

static GLOBAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?s)\b((?:19|20)\d{{2}})\b[^\d]*?({NUMBER})(?:%|\b|$)")).unwrap()
});

/// A (year, value) pair lifted out of free text. The value is kept as
/// normalized numeric text (`3,90%` becomes `3.90`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearValueRow {
    pub year: String,
    pub value: String,
}

impl YearValueRow {
    fn new(year: &str, value: &str) -> Self {
        Self {
            year: year.to_string(),
            value: normalize_value(value),
        }
    }

    fn year_number(&self) -> u32 {
        self.year.parse().unwrap_or(0)
    }
}

/// Output of the normalizer: CSV text plus how it was obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedCsv {
    pub csv: String,
    pub explanation: String,
}

/// Which extraction produced the rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanPath {
    Lines { considered: usize },
    Global,
}

/// Turn loosely formatted text into a chronologically ordered `Year,Value` CSV.
///
/// Each line is tried against a strict `YYYY value` layout, then a two-cell
/// (comma or whitespace) layout, then a sentence scan. Lines before the first
/// match are preamble. If no line matches, the whole text is scanned for
/// year/value pairs; if that fails too, a one-row placeholder is returned.
pub fn normalize_text_to_two_column_csv(text: &str) -> NormalizedCsv {
    let (mut rows, path) = match scan_lines(text) {
        (rows, considered) if !rows.is_empty() => (rows, ScanPath::Lines { considered }),
        _ => (scan_global(text), ScanPath::Global),
    };

    if rows.is_empty() {
        tracing::debug!("No year/value pairs found, returning placeholder dataset");
        return NormalizedCsv {
            csv: PLACEHOLDER_CSV.to_string(),
            explanation: "Parsed 0 lines; no year/value pairs found, returning a placeholder dataset."
                .to_string(),
        };
    }

    // Stable: rows sharing a year keep their order of appearance
    rows.sort_by_key(YearValueRow::year_number);

    let explanation = match path {
        ScanPath::Lines { considered } => format!(
            "Parsed {} of {} considered lines as Year,Value pairs.",
            rows.len(),
            considered
        ),
        ScanPath::Global => format!(
            "No line matched a year/value layout; recovered {} pairs by scanning the whole text.",
            rows.len()
        ),
    };
    tracing::debug!(rows = rows.len(), "{explanation}");

    NormalizedCsv {
        csv: to_csv(&rows),
        explanation,
    }
}

/// Line-by-line pass. Returns the rows and the number of non-blank lines
/// considered from the first match onward.
fn scan_lines(text: &str) -> (Vec<YearValueRow>, usize) {
    let mut rows = Vec::new();
    let mut started = false;
    let mut considered = 0;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match parse_line(line) {
            Some(row) => {
                started = true;
                considered += 1;
                rows.push(row);
            }
            None if started => considered += 1,
            None => {}
        }
    }

    (rows, considered)
}

fn parse_line(line: &str) -> Option<YearValueRow> {
    if let Some(caps) = STRICT_LINE.captures(line) {
        return Some(YearValueRow::new(&caps[1], &caps[2]));
    }
    if let Some(row) = parse_two_cells(line) {
        return Some(row);
    }
    SENTENCE
        .captures(line)
        .map(|caps| YearValueRow::new(&caps[1], &caps[2]))
}

fn parse_two_cells(line: &str) -> Option<YearValueRow> {
    let cells: Vec<&str> = if line.contains(',') {
        line.split(',').map(str::trim).collect()
    } else {
        line.split_whitespace().collect()
    };
    if cells.len() < 2 || !YEAR_CELL.is_match(cells[0]) {
        return None;
    }
    NUMBER_CELL
        .captures(cells[1])
        .map(|caps| YearValueRow::new(cells[0], &caps[1]))
}

fn scan_global(text: &str) -> Vec<YearValueRow> {
    GLOBAL
        .captures_iter(text)
        .map(|caps| YearValueRow::new(&caps[1], &caps[2]))
        .collect()
}

fn normalize_value(value: &str) -> String {
    value.replace(',', ".").replace('%', "")
}

fn to_csv(rows: &[YearValueRow]) -> String {
    let mut out = String::from(CSV_HEADER);
    for row in rows {
        out.push('\n');
        out.push_str(&row.year);
        out.push(',');
        out.push_str(&row.value);
    }
    out
}
