use serde::{Deserialize, Serialize};

use crate::data::value::{finite_values, RawValue};

/// Direction from a series' first value to its last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

impl Trend {
    pub fn label(&self) -> &'static str {
        match self {
            Trend::Increasing => "increasing",
            Trend::Decreasing => "decreasing",
            Trend::Stable => "stable",
        }
    }
}

/// Arithmetic mean; NaN for an empty series.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Median of a sorted copy; the input is left untouched. NaN when empty.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let count = sorted.len();
    if count % 2 == 0 {
        (sorted[count / 2 - 1] + sorted[count / 2]) / 2.0
    } else {
        sorted[count / 2]
    }
}

/// Population variance (divides by N). Zero, not NaN, below two values.
pub fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

pub fn standard_deviation(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Pearson product-moment correlation.
///
/// `None` when the lengths differ, either side has fewer than two values, or
/// either side is constant.
pub fn pearson_correlation(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.len() != b.len() || a.len() < 2 {
        return None;
    }
    let ma = mean(a);
    let mb = mean(b);
    let denom_a = a.iter().map(|v| (v - ma).powi(2)).sum::<f64>().sqrt();
    let denom_b = b.iter().map(|v| (v - mb).powi(2)).sum::<f64>().sqrt();
    if denom_a == 0.0 || denom_b == 0.0 {
        return None;
    }
    let cov: f64 = a.iter().zip(b).map(|(x, y)| (x - ma) * (y - mb)).sum();
    Some(cov / (denom_a * denom_b))
}

/// Compact numeric summary of one series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticalSummary {
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub range: f64,
    pub variance: f64,
    pub standard_deviation: f64,
    pub trend: Trend,
}

impl StatisticalSummary {
    /// Summary for a series too short to describe: every figure NaN, trend increasing.
    pub fn degenerate() -> Self {
        Self {
            mean: f64::NAN,
            median: f64::NAN,
            min: f64::NAN,
            max: f64::NAN,
            range: f64::NAN,
            variance: f64::NAN,
            standard_deviation: f64::NAN,
            trend: Trend::Increasing,
        }
    }

    /// Summarize already-finite values. Fewer than two values degenerate.
    pub fn compute(values: &[f64]) -> Self {
        let (first, last) = match (values.first(), values.last()) {
            (Some(&first), Some(&last)) if values.len() >= 2 => (first, last),
            _ => return Self::degenerate(),
        };

        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let variance = variance(values);

        Self {
            mean: mean(values),
            median: median(values),
            min,
            max,
            range: max - min,
            variance,
            standard_deviation: variance.sqrt(),
            // Ties count as increasing; this path never reports stable.
            trend: if last >= first {
                Trend::Increasing
            } else {
                Trend::Decreasing
            },
        }
    }

    /// Format as a multi-line report string.
    pub fn report(&self, label: &str) -> String {
        format!(
            "{}:\n  Trend: {}\n  Min: {:.3}\n  Max: {:.3}\n  Range: {:.3}\n  Mean: {:.3}\n  Median: {:.3}\n  Variance: {:.3}\n  Std Dev: {:.3}\n",
            label,
            self.trend.label(),
            self.min,
            self.max,
            self.range,
            self.mean,
            self.median,
            self.variance,
            self.standard_deviation
        )
    }
}

/// Coerce caller values to numbers, drop non-finite ones, and summarize.
pub fn analyze_dataset_numbers(values: &[RawValue]) -> StatisticalSummary {
    let finite = finite_values(values);
    if finite.len() < 2 {
        tracing::debug!(
            kept = finite.len(),
            total = values.len(),
            "Too few finite values, returning degenerate summary"
        );
    }
    StatisticalSummary::compute(&finite)
}

/// Which of two compared series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeriesId {
    A,
    B,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendRelation {
    Same,
    Different,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    /// A minus B.
    pub mean_difference: f64,
    /// A minus B.
    pub median_difference: f64,
    pub more_volatile: SeriesId,
    pub trend_relation: TrendRelation,
    pub correlation: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub dataset_a: StatisticalSummary,
    pub dataset_b: StatisticalSummary,
    pub comparison: Comparison,
}

/// Summarize two series side by side.
///
/// Correlation uses the filtered series, so inputs of equal length can still
/// compare with `None` once non-finite values are dropped.
pub fn compare_datasets(series_a: &[RawValue], series_b: &[RawValue]) -> ComparisonResult {
    let a = finite_values(series_a);
    let b = finite_values(series_b);
    let dataset_a = StatisticalSummary::compute(&a);
    let dataset_b = StatisticalSummary::compute(&b);

    // Undefined spread counts as zero, and A wins ties.
    let spread = |sd: f64| if sd.is_nan() { 0.0 } else { sd };
    let more_volatile = if spread(dataset_a.standard_deviation) >= spread(dataset_b.standard_deviation) {
        SeriesId::A
    } else {
        SeriesId::B
    };

    let correlation = if a.len() == b.len() {
        pearson_correlation(&a, &b)
    } else {
        tracing::debug!(a = a.len(), b = b.len(), "Series lengths differ, skipping correlation");
        None
    };

    let comparison = Comparison {
        mean_difference: dataset_a.mean - dataset_b.mean,
        median_difference: dataset_a.median - dataset_b.median,
        more_volatile,
        trend_relation: if dataset_a.trend == dataset_b.trend {
            TrendRelation::Same
        } else {
            TrendRelation::Different
        },
        correlation,
    };

    ComparisonResult {
        dataset_a,
        dataset_b,
        comparison,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-10;

    fn raw(values: &[f64]) -> Vec<RawValue> {
        values.iter().copied().map(RawValue::Number).collect()
    }

    #[test]
    fn primitives() {
        assert!(mean(&[]).is_nan());
        assert!(median(&[]).is_nan());
        assert!((mean(&[2.0, 4.0, 6.0]) - 4.0).abs() < TOL);
        assert!((median(&[3.0, 1.0, 2.0]) - 2.0).abs() < TOL);
        assert!((median(&[4.0, 1.0, 3.0, 2.0]) - 2.5).abs() < TOL);
        assert_eq!(variance(&[5.0]), 0.0);
        assert_eq!(variance(&[]), 0.0);
        let data = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((variance(&data) - 4.0).abs() < TOL);
        assert!((standard_deviation(&data) - 2.0).abs() < TOL);
    }

    #[test]
    fn median_leaves_input_order() {
        let data = vec![3.0, 1.0, 2.0];
        let _ = median(&data);
        assert_eq!(data, vec![3.0, 1.0, 2.0]);
    }

    #[test]
    fn correlation_cases() {
        let r = pearson_correlation(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]).unwrap();
        assert!((r - 1.0).abs() < TOL);
        let r = pearson_correlation(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]).unwrap();
        assert!((r + 1.0).abs() < TOL);
        assert_eq!(pearson_correlation(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]), None);
        assert_eq!(pearson_correlation(&[1.0, 2.0], &[1.0, 2.0, 3.0]), None);
        assert_eq!(pearson_correlation(&[1.0], &[1.0]), None);
    }

    #[test]
    fn numbers_degenerate_below_two_values() {
        for input in [raw(&[]), raw(&[1.0]), vec![RawValue::from("x"), RawValue::from(4.0)]] {
            let s = analyze_dataset_numbers(&input);
            assert!(s.mean.is_nan() && s.median.is_nan() && s.min.is_nan());
            assert!(s.max.is_nan() && s.range.is_nan());
            assert!(s.variance.is_nan() && s.standard_deviation.is_nan());
            assert_eq!(s.trend, Trend::Increasing);
        }
    }

    #[test]
    fn numbers_summary() {
        let s = analyze_dataset_numbers(&[
            RawValue::from("5"),
            RawValue::from(3.0),
            RawValue::from("oops"),
            RawValue::from(5.0),
        ]);
        assert_eq!(s.trend, Trend::Increasing);
        assert_eq!(s.min, 3.0);
        assert_eq!(s.max, 5.0);
        assert_eq!(s.range, 2.0);
        assert_eq!(s.median, 5.0);
        assert!((s.mean - 13.0 / 3.0).abs() < TOL);
        assert!(s.variance >= 0.0);
        assert!((s.standard_deviation - s.variance.sqrt()).abs() < TOL);

        let s = analyze_dataset_numbers(&raw(&[4.0, 2.0]));
        assert_eq!(s.trend, Trend::Decreasing);
    }

    #[test]
    fn report_lists_every_figure() {
        let text = analyze_dataset_numbers(&raw(&[1.0, 3.0])).report("Refi");
        assert!(text.starts_with("Refi:\n  Trend: increasing\n"));
        assert!(text.contains("  Mean: 2.000\n"));
        assert!(text.contains("  Std Dev: 1.000\n"));
    }

    #[test]
    fn compare_basic() {
        let result = compare_datasets(&raw(&[1.0, 2.0, 3.0]), &raw(&[2.0, 4.0, 6.0]));
        let c = &result.comparison;
        assert!((c.mean_difference + 2.0).abs() < TOL);
        assert!((c.median_difference + 2.0).abs() < TOL);
        assert_eq!(c.more_volatile, SeriesId::B);
        assert_eq!(c.trend_relation, TrendRelation::Same);
        assert!((c.correlation.unwrap() - 1.0).abs() < TOL);
    }

    #[test]
    fn compare_correlation_lost_after_filtering() {
        let a = vec![RawValue::from(1.0), RawValue::from("n/a"), RawValue::from(3.0)];
        let b = raw(&[3.0, 2.0, 1.0]);
        let result = compare_datasets(&a, &b);
        assert_eq!(result.comparison.correlation, None);
        assert_eq!(result.comparison.trend_relation, TrendRelation::Different);
    }

    #[test]
    fn compare_ties_and_degenerate_favor_a() {
        let result = compare_datasets(&raw(&[1.0]), &raw(&[7.0]));
        assert_eq!(result.comparison.more_volatile, SeriesId::A);
        assert!(result.comparison.mean_difference.is_nan());
        let result = compare_datasets(&raw(&[1.0, 3.0]), &raw(&[5.0, 7.0]));
        assert_eq!(result.comparison.more_volatile, SeriesId::A);
    }
}
