use crate::error::ConfigError;
use crate::metrics::hrv::{is_frequency_key, is_known_key, HrvFeatures};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashSet;

/// One feature to keep and the column name it is reported under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedMetric {
    pub source: String,
    pub column: String,
}

impl SelectedMetric {
    pub fn new(source: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            column: column.into(),
        }
    }
}

/// Ordered feature selection; the order is the output column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricSelection(pub Vec<SelectedMetric>);

impl Default for MetricSelection {
    fn default() -> Self {
        Self(vec![
            SelectedMetric::new("HRV_RMSSD", "RMSSD"),
            SelectedMetric::new("HRV_pNN50", "pNN50"),
            SelectedMetric::new("HRV_LFHF", "LF_HF_Ratio"),
        ])
    }
}

impl MetricSelection {
    pub fn columns(&self) -> Vec<String> {
        self.0.iter().map(|m| m.column.clone()).collect()
    }

    pub fn needs_frequency(&self) -> bool {
        self.0.iter().any(|m| is_frequency_key(&m.source))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.0.is_empty() {
            return Err(ConfigError::Invalid("metric selection is empty".into()));
        }
        let mut seen = HashSet::new();
        for metric in &self.0 {
            if !is_known_key(&metric.source) {
                return Err(ConfigError::Invalid(format!(
                    "unknown metric source {}",
                    metric.source
                )));
            }
            if !seen.insert(metric.column.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate output column {}",
                    metric.column
                )));
            }
        }
        Ok(())
    }

    /// Pick and rename the selected features. A source the feature set does
    /// not carry is reported as NaN.
    pub fn apply(&self, features: &HrvFeatures) -> MetricRecord {
        let entries = self
            .0
            .iter()
            .map(|m| {
                let value = features.get(&m.source).unwrap_or(f64::NAN);
                (m.column.clone(), value)
            })
            .collect();
        MetricRecord { entries }
    }
}

/// A single row of selected metrics, in selection order.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRecord {
    entries: Vec<(String, f64)>,
}

impl MetricRecord {
    pub fn from_entries(entries: Vec<(String, f64)>) -> Self {
        Self { entries }
    }

    pub fn get(&self, column: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, v)| *v)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.entries.iter().map(|(_, v)| *v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for MetricRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
