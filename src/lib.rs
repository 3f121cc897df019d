//! Descriptive statistics and text-to-series parsing behind the OxideInsight
//! dashboards.
//!
//! The library is pure: callers hand in arrays, CSV text or free text and get
//! plain result values back. Nothing here renders or keeps global state.

pub mod data;
pub mod processing;
pub mod state;

pub use data::normalizer::{normalize_text_to_two_column_csv, NormalizedCsv};
pub use data::value::{DatasetInput, RawValue, Record};
pub use processing::insights::{
    analyze_dataset, analyze_dataset_rich, analyze_dataset_rich_with, analyze_dataset_with,
    AnalysisError, AnalysisMeta, DatasetAnalysis, RichAnalysis,
};
pub use processing::statistics::{
    analyze_dataset_numbers, compare_datasets, pearson_correlation, ComparisonResult,
    StatisticalSummary, Trend,
};
pub use state::settings::InsightSettings;
