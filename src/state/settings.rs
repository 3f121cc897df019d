use std::path::Path;

use serde::{Deserialize, Serialize};

/// Tunables for the rich analyzer. Defaults reproduce the dashboard's fixed
/// behaviour: anomalies beyond two standard deviations, and the seasonality
/// note for twelve or more rows keyed by a month/date/time column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightSettings {
    pub anomaly_sigma: f64,
    pub seasonal_min_rows: usize,
    pub seasonal_keywords: Vec<String>,
}

impl Default for InsightSettings {
    fn default() -> Self {
        Self {
            anomaly_sigma: 2.0,
            seasonal_min_rows: 12,
            seasonal_keywords: vec!["month".to_string(), "date".to_string(), "time".to_string()],
        }
    }
}

impl InsightSettings {
    /// Load settings from a JSON file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self, String> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| format!("Cannot read settings {}: {e}", path.display()))?;
        let settings = Self::from_json(&json)?;
        tracing::info!("Settings loaded from {:?}", path);
        Ok(settings)
    }

    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| format!("Failed to parse settings: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let s = InsightSettings::from_json(r#"{"anomaly_sigma": 3.0}"#).unwrap();
        assert_eq!(s.anomaly_sigma, 3.0);
        assert_eq!(s.seasonal_min_rows, 12);
        assert_eq!(s.seasonal_keywords, InsightSettings::default().seasonal_keywords);
    }

    #[test]
    fn bad_json_is_an_error() {
        let err = InsightSettings::from_json("{not json").unwrap_err();
        assert!(err.starts_with("Failed to parse settings"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = InsightSettings::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(err.starts_with("Cannot read settings"));
    }
}
