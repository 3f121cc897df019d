use std::fmt;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use crate::data::datetime::is_time_column;
use crate::data::parser::{parse_labeled_text, ColumnNames, DataRow};
use crate::data::value::{format_number, to_fixed, DatasetInput};
use crate::processing::statistics::{
    analyze_dataset_numbers, mean, median, variance, StatisticalSummary, Trend,
};
use crate::state::settings::InsightSettings;

pub const SEASONALITY_NOTE: &str = "Possible seasonality detected (needs deeper analysis).";
pub const CONTEXTUAL_INSIGHTS: &str = "Contextual insights and economic context coming soon.";

/// Why the rich analyzer declined to describe a dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// Text input with fewer than two non-empty lines.
    NotEnoughData,
    /// An empty array of pairs or records.
    EmptyDataset,
    /// Fewer than two data rows after parsing. Carries the column names that
    /// were in effect, so a text header is still reported.
    NotEnoughRows { columns: Option<ColumnNames> },
}

impl AnalysisError {
    pub fn message(&self) -> &'static str {
        match self {
            AnalysisError::NotEnoughData => "Not enough data.",
            AnalysisError::EmptyDataset => "Empty dataset.",
            AnalysisError::NotEnoughRows { .. } => "Not enough data rows.",
        }
    }

    /// Column names detected before the analysis gave up, if any.
    pub fn columns(&self) -> Option<&ColumnNames> {
        match self {
            AnalysisError::NotEnoughRows { columns } => columns.as_ref(),
            _ => None,
        }
    }
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for AnalysisError {}

/// Serializes as `{ "error": message }`.
impl Serialize for AnalysisError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut body = serializer.serialize_struct("AnalysisError", 1)?;
        body.serialize_field("error", self.message())?;
        body.end()
    }
}

/// Caller-supplied metadata. Column names given here are used for array
/// input; text input replaces them with its own header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisMeta {
    pub columns: Option<ColumnNames>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStatistics {
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub variance: f64,
    pub stddev: f64,
}

/// Statistics, anomalies and a narrative for a labelled dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RichAnalysis {
    pub summary_statistics: SummaryStatistics,
    pub trends: Trend,
    pub anomalies: Vec<DataRow>,
    pub patterns: Vec<String>,
    pub contextual_insights: String,
    pub plain_text: String,
    /// Column names in effect: the text header, else the caller's.
    pub columns: Option<ColumnNames>,
}

/// Result of the dispatching entry point.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DatasetAnalysis {
    Numeric(StatisticalSummary),
    Rich(RichAnalysis),
}

/// Route plain numeric arrays (including `[]`) to the numeric analyzer and
/// everything else to the rich analyzer.
pub fn analyze_dataset(
    input: &DatasetInput,
    meta: &AnalysisMeta,
) -> Result<DatasetAnalysis, AnalysisError> {
    analyze_dataset_with(input, meta, &InsightSettings::default())
}

pub fn analyze_dataset_with(
    input: &DatasetInput,
    meta: &AnalysisMeta,
    settings: &InsightSettings,
) -> Result<DatasetAnalysis, AnalysisError> {
    tracing::debug!(kind = input.kind(), "Dispatching dataset analysis");
    match input {
        DatasetInput::Series(values) => Ok(DatasetAnalysis::Numeric(analyze_dataset_numbers(values))),
        _ => analyze_dataset_rich_with(input, meta, settings).map(DatasetAnalysis::Rich),
    }
}

/// Rich analysis with default settings.
pub fn analyze_dataset_rich(
    input: &DatasetInput,
    meta: &AnalysisMeta,
) -> Result<RichAnalysis, AnalysisError> {
    analyze_dataset_rich_with(input, meta, &InsightSettings::default())
}

pub fn analyze_dataset_rich_with(
    input: &DatasetInput,
    meta: &AnalysisMeta,
    settings: &InsightSettings,
) -> Result<RichAnalysis, AnalysisError> {
    let (rows, columns) = collect_rows(input, meta)?;
    if rows.len() < 2 {
        tracing::debug!(rows = rows.len(), "Not enough rows for rich analysis");
        return Err(AnalysisError::NotEnoughRows { columns });
    }

    // Infinite values stay in; only NaN is dropped.
    let values: Vec<f64> = rows.iter().map(|r| r.y).filter(|v| !v.is_nan()).collect();
    let m = mean(&values);
    let med = median(&values);
    let vari = variance(&values);
    let stddev = vari.sqrt();
    let minv = values.iter().copied().fold(f64::INFINITY, f64::min);
    let maxv = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let trend = three_way_trend(&values);

    let anomalies: Vec<DataRow> = rows
        .iter()
        .filter(|r| (r.y - m).abs() > settings.anomaly_sigma * stddev)
        .cloned()
        .collect();

    // Stub: names the possibility only, no actual seasonal decomposition.
    let mut patterns = Vec::new();
    let time_keyed = columns
        .as_ref()
        .is_some_and(|c| is_time_column(&c.x, &settings.seasonal_keywords));
    if rows.len() >= settings.seasonal_min_rows && time_keyed {
        patterns.push(SEASONALITY_NOTE.to_string());
    }

    let value_name = columns
        .as_ref()
        .and_then(|c| c.y.as_deref())
        .unwrap_or("Value");
    let first = &rows[0].x;
    let last = &rows[rows.len() - 1].x;

    let mut plain_text = format!(
        "{value_name} shows a {} trend from {first} to {last}.\n",
        trend.label()
    );
    plain_text.push_str(&format!(
        "Mean: {}, Median: {}, Min: {}, Max: {}, Variance: {}.\n",
        to_fixed(m, 3),
        to_fixed(med, 3),
        format_number(minv),
        format_number(maxv),
        to_fixed(vari, 3)
    ));
    if !anomalies.is_empty() {
        let labels: Vec<&str> = anomalies.iter().map(|a| a.x.as_str()).collect();
        plain_text.push_str(&format!("Anomalies detected at: {}.\n", labels.join(", ")));
    }
    if !patterns.is_empty() {
        plain_text.push_str(&format!("Patterns: {}\n", patterns.join("; ")));
    }
    plain_text.push_str(CONTEXTUAL_INSIGHTS);

    Ok(RichAnalysis {
        summary_statistics: SummaryStatistics {
            mean: m,
            median: med,
            min: minv,
            max: maxv,
            variance: vari,
            stddev,
        },
        trends: trend,
        anomalies,
        patterns,
        contextual_insights: CONTEXTUAL_INSIGHTS.to_string(),
        plain_text,
        columns,
    })
}

/// Bring any input shape down to labelled rows plus the column names in effect.
fn collect_rows(
    input: &DatasetInput,
    meta: &AnalysisMeta,
) -> Result<(Vec<DataRow>, Option<ColumnNames>), AnalysisError> {
    match input {
        DatasetInput::Text(text) => {
            let parsed = parse_labeled_text(text).ok_or(AnalysisError::NotEnoughData)?;
            Ok((parsed.rows, Some(parsed.columns)))
        }
        DatasetInput::Pairs(pairs) if pairs.is_empty() => Err(AnalysisError::EmptyDataset),
        DatasetInput::Pairs(pairs) => {
            let rows = pairs
                .iter()
                .map(|(x, y)| DataRow {
                    x: x.to_string(),
                    y: y.to_number(),
                })
                .collect();
            Ok((rows, meta.columns.clone()))
        }
        DatasetInput::Records(records) if records.is_empty() => Err(AnalysisError::EmptyDataset),
        DatasetInput::Records(records) => {
            let rows = records
                .iter()
                .map(|r| DataRow {
                    x: r.x.to_string(),
                    y: r.y.to_number(),
                })
                .collect();
            Ok((rows, meta.columns.clone()))
        }
        // Bare scalars carry no labels, so they yield no rows.
        DatasetInput::Series(values) if values.is_empty() => Err(AnalysisError::EmptyDataset),
        DatasetInput::Series(_) => Ok((Vec::new(), meta.columns.clone())),
    }
}

/// Stable on exact equality of first and last, unlike the numeric analyzer.
fn three_way_trend(values: &[f64]) -> Trend {
    match (values.first(), values.last()) {
        (Some(first), Some(last)) if first < last => Trend::Increasing,
        (Some(first), Some(last)) if first > last => Trend::Decreasing,
        _ => Trend::Stable,
    }
}
