use chrono::{Datelike, NaiveDate};

/// Date layouts accepted for rate entries, tried in order.
pub const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y", "%d/%m/%Y"];

/// Parse a calendar date with the first matching format.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

/// Build a `YYYY-MM` label for an entry filed under `year`.
///
/// The month comes from the entry's date. Dates that do not parse fall back
/// to their second `-` separated field, so `2024-13` still yields `2024-13`.
pub fn month_label(year: i32, date: &str) -> String {
    match parse_date(date) {
        Some(d) => format!("{year}-{:02}", d.month()),
        None => {
            let month = date.split('-').nth(1).unwrap_or("");
            format!("{year}-{month}")
        }
    }
}

/// Whether a column name reads like a time axis (case-insensitive substring).
pub fn is_time_column(name: &str, keywords: &[String]) -> bool {
    let lower = name.to_lowercase();
    keywords.iter().any(|k| lower.contains(&k.to_lowercase()))
}
