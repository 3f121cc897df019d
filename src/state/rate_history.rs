use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::data::datetime::month_label;
use crate::data::value::format_number;

/// One published rate observation. `value` is absent for months with no data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateEntry {
    pub date: String,
    #[serde(default)]
    pub value: Option<f64>,
}

/// History of a single policy rate, filed by year. Serializes as a JSON
/// object keyed by year: `{"2024": [{"date": "2024-01-01", "value": 4.5}]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RateHistory {
    pub years: BTreeMap<i32, Vec<RateEntry>>,
}

/// Several named histories, e.g. `refi`, `deposit`, `lending`.
pub type RateBook = BTreeMap<String, RateHistory>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateTrend {
    Increasing,
    Decreasing,
    Unchanged,
}

impl RateTrend {
    pub fn label(&self) -> &'static str {
        match self {
            RateTrend::Increasing => "\u{2197} Increasing",
            RateTrend::Decreasing => "\u{2198} Decreasing",
            RateTrend::Unchanged => "\u{2194} No change",
        }
    }
}

/// Latest published value and its direction against the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateSnapshot {
    pub value: Option<f64>,
    pub previous: Option<f64>,
    pub trend: RateTrend,
}

impl RateSnapshot {
    /// Display text for the value, `?` when nothing was published.
    pub fn display_value(&self) -> String {
        match self.value {
            Some(v) => format!("{}%", format_number(v)),
            None => "?".to_string(),
        }
    }
}

/// Labels with optional values, in chart order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabeledSeries {
    pub labels: Vec<String>,
    pub values: Vec<Option<f64>>,
}

impl LabeledSeries {
    /// Drop everything from the first label starting with `prefix` onward.
    pub fn truncate_at_prefix(&mut self, prefix: &str) {
        if let Some(cut) = self.labels.iter().position(|l| l.starts_with(prefix)) {
            self.labels.truncate(cut);
            self.values.truncate(cut);
        }
    }

    /// Two-column CSV (`{label_column},Value`) of the points that have values.
    pub fn to_csv(&self, label_column: &str) -> String {
        let mut out = format!("{label_column},Value");
        for (label, value) in self.labels.iter().zip(&self.values) {
            if let Some(v) = value {
                out.push('\n');
                out.push_str(label);
                out.push(',');
                out.push_str(&format_number(*v));
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl RateHistory {
    pub fn latest_year(&self) -> Option<i32> {
        self.years.keys().next_back().copied()
    }

    /// Walk newest to oldest and compare the two most recent published values.
    pub fn latest_with_trend(&self) -> RateSnapshot {
        let mut published = self
            .years
            .values()
            .rev()
            .flat_map(|entries| entries.iter().rev())
            .filter_map(|e| e.value);
        let value = published.next();
        let previous = published.next();

        let trend = match (value, previous) {
            (Some(latest), Some(prev)) if latest > prev => RateTrend::Increasing,
            (Some(latest), Some(prev)) if latest < prev => RateTrend::Decreasing,
            _ => RateTrend::Unchanged,
        };
        RateSnapshot {
            value,
            previous,
            trend,
        }
    }

    /// Every entry in year order, labelled `YYYY-MM`, optionally cut at the
    /// first label starting with `cutoff_prefix`.
    pub fn monthly_series(&self, cutoff_prefix: Option<&str>) -> LabeledSeries {
        let mut series = LabeledSeries::default();
        for (year, entries) in &self.years {
            for entry in entries {
                series.labels.push(month_label(*year, &entry.date));
                series.values.push(entry.value);
            }
        }
        if let Some(prefix) = cutoff_prefix {
            series.truncate_at_prefix(prefix);
        }
        series
    }

    /// One year's entries labelled by their dates; the latest year when
    /// `year` is `None`. `None` if the year is not on file.
    pub fn year_series(&self, year: Option<i32>, cutoff_prefix: Option<&str>) -> Option<LabeledSeries> {
        let year = year.or_else(|| self.latest_year())?;
        let entries = self.years.get(&year)?;
        let mut series = LabeledSeries {
            labels: entries.iter().map(|e| e.date.clone()).collect(),
            values: entries.iter().map(|e| e.value).collect(),
        };
        if let Some(prefix) = cutoff_prefix {
            series.truncate_at_prefix(prefix);
        }
        Some(series)
    }
}

/// A labelled span of history, bounds given as `YYYY-MM` labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextPeriod {
    pub label: String,
    pub start: String,
    pub end: String,
    pub description: String,
}

impl ContextPeriod {
    fn new(label: &str, start: &str, end: &str, description: &str) -> Self {
        Self {
            label: label.to_string(),
            start: start.to_string(),
            end: end.to_string(),
            description: description.to_string(),
        }
    }
}

/// Eras of euro-area monetary policy shown alongside the rate charts.
pub fn ecb_context_periods() -> Vec<ContextPeriod> {
    vec![
        ContextPeriod::new(
            "1999\u{2013}2001: The Beginning & Euro Stabilization",
            "1999-01",
            "2001-12",
            "Rates between 2.5% and 4.75% while the new currency settled.",
        ),
        ContextPeriod::new(
            "2001\u{2013}2003: Economic Slowdown (Dot-com crash, 9/11)",
            "2001-12",
            "2003-12",
            "Aggressive cuts took the main refinancing rate to around 2%.",
        ),
        ContextPeriod::new(
            "2005\u{2013}2008: Economic Boom & Rising Inflation",
            "2005-01",
            "2008-12",
            "Pre-crisis tightening lifted the main refinancing rate to 4.25%.",
        ),
        ContextPeriod::new(
            "2008\u{2013}2012: Financial Crisis & Extreme Rate Cuts",
            "2008-12",
            "2012-01",
            "The main refinancing rate fell from 4.25% to 1%.",
        ),
        ContextPeriod::new(
            "2012\u{2013}2016: Negative Rates & Unconventional Policies",
            "2012-01",
            "2016-12",
            "The deposit rate went negative and the main rate reached 0%.",
        ),
        ContextPeriod::new(
            "2016\u{2013}2021: Long Period of Ultra-Low Rates",
            "2016-12",
            "2021-12",
            "Deposit rate near -0.5% with the main rate held at 0%.",
        ),
        ContextPeriod::new(
            "2022\u{2013}2023: Post-COVID Inflation Shock",
            "2022-01",
            "2023-12",
            "The fastest hiking cycle on record, main rate up to about 4%.",
        ),
        ContextPeriod::new(
            "2024\u{2013}2025: Slight Rate Cuts",
            "2024-01",
            "2025-06",
            "Gradual cuts as inflation eased.",
        ),
    ]
}

/// Index range of a period over sorted labels: the first label `>= start`
/// (`None` if there is none) and one past the last label `<= end`.
pub fn period_indices(labels: &[String], start: &str, end: &str) -> (Option<usize>, usize) {
    let start_idx = labels.iter().position(|l| l.as_str() >= start);
    let end_idx = labels
        .iter()
        .position(|l| l.as_str() > end)
        .unwrap_or(labels.len());
    (start_idx, end_idx)
}

/// Periods whose span covers the label at `index`.
pub fn periods_at<'a>(
    labels: &[String],
    index: usize,
    periods: &'a [ContextPeriod],
) -> Vec<&'a ContextPeriod> {
    if index >= labels.len() {
        return Vec::new();
    }
    periods
        .iter()
        .filter(|p| {
            let (start_idx, end_idx) = period_indices(labels, &p.start, &p.end);
            let Some(start_idx) = start_idx else {
                return false;
            };
            // An empty span falls back to the final label.
            let last_idx = end_idx.checked_sub(1).unwrap_or(labels.len() - 1);
            start_idx <= index && index <= last_idx
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(date: &str, value: Option<f64>) -> RateEntry {
        RateEntry {
            date: date.to_string(),
            value,
        }
    }

    fn history() -> RateHistory {
        let mut years = BTreeMap::new();
        years.insert(
            2024,
            vec![entry("2024-11-01", Some(3.4)), entry("2024-12-01", Some(3.15))],
        );
        years.insert(
            2025,
            vec![
                entry("2025-06-01", Some(2.15)),
                entry("2025-07-01", Some(2.15)),
                entry("2025-08-01", None),
            ],
        );
        RateHistory { years }
    }

    #[test]
    fn deserializes_year_keyed_json() {
        let json = r#"{"2025": [{"date": "2025-01-01", "value": 2.9}, {"date": "2025-02-01"}]}"#;
        let h: RateHistory = serde_json::from_str(json).unwrap();
        assert_eq!(h.latest_year(), Some(2025));
        assert_eq!(h.years[&2025][1].value, None);
    }

    #[test]
    fn latest_skips_gaps() {
        let snap = history().latest_with_trend();
        assert_eq!(snap.value, Some(2.15));
        assert_eq!(snap.previous, Some(2.15));
        assert_eq!(snap.trend, RateTrend::Unchanged);
        assert_eq!(snap.display_value(), "2.15%");
    }

    #[test]
    fn latest_trend_across_years() {
        let mut h = history();
        h.years.remove(&2025);
        let snap = h.latest_with_trend();
        assert_eq!(snap.trend, RateTrend::Decreasing);
        assert_eq!(snap.trend.label(), "\u{2198} Decreasing");

        let empty = RateHistory::default().latest_with_trend();
        assert_eq!(empty.display_value(), "?");
        assert_eq!(empty.trend, RateTrend::Unchanged);
    }

    #[test]
    fn monthly_series_cuts_at_prefix() {
        let s = history().monthly_series(Some("2025-07"));
        assert_eq!(s.labels, vec!["2024-11", "2024-12", "2025-06"]);
        assert_eq!(s.values, vec![Some(3.4), Some(3.15), Some(2.15)]);
        assert_eq!(history().monthly_series(None).len(), 5);
    }

    #[test]
    fn year_series_defaults_to_latest() {
        let s = history().year_series(None, None).unwrap();
        assert_eq!(s.labels[0], "2025-06-01");
        assert_eq!(s.to_csv("Date"), "Date,Value\n2025-06-01,2.15\n2025-07-01,2.15");
        assert!(history().year_series(Some(1999), None).is_none());
    }

    #[test]
    fn period_lookup() {
        let labels: Vec<String> = ["2001-11", "2001-12", "2002-01", "2004-01"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(period_indices(&labels, "2001-12", "2003-12"), (Some(1), 3));
        assert_eq!(period_indices(&labels, "2030-01", "2031-01"), (None, 4));

        let periods = ecb_context_periods();
        let hits = periods_at(&labels, 1, &periods);
        assert_eq!(hits.len(), 2);
        assert!(hits[0].label.starts_with("1999"));
        assert!(hits[1].label.starts_with("2001"));
        assert!(periods_at(&labels, 3, &periods).is_empty());
    }
}
