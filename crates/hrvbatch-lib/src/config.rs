use crate::error::ConfigError;
use crate::io::ibi::IbiCsvFormat;
use crate::metrics::hrv::FrequencyConfig;
use crate::metrics::select::MetricSelection;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_OUTPUT_NAME: &str = "final_HRV.xlsx";

/// Subject identifiers `<prefix><first>` through `<prefix><last>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubjectRange {
    pub prefix: String,
    pub first: u32,
    pub last: u32,
}

impl Default for SubjectRange {
    fn default() -> Self {
        Self {
            prefix: "S".into(),
            first: 1,
            last: 10,
        }
    }
}

impl SubjectRange {
    pub fn ids(&self) -> Vec<String> {
        (self.first..=self.last)
            .map(|n| format!("{}{}", self.prefix, n))
            .collect()
    }
}

/// Everything the batch needs, passed explicitly into the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Directory holding one folder per subject.
    pub root_dir: PathBuf,
    pub session_folder: String,
    pub file_name: String,
    /// Reference rate (Hz) used to rebuild peak indices from intervals.
    pub sampling_rate: f64,
    /// Spreadsheet to write; defaults to `<root_dir>/final_HRV.xlsx`.
    pub output: Option<PathBuf>,
    pub subjects: SubjectRange,
    pub csv: IbiCsvFormat,
    pub frequency: FrequencyConfig,
    pub metrics: MetricSelection,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("."),
            session_folder: "Final".into(),
            file_name: "IBI.csv".into(),
            sampling_rate: 64.0,
            output: None,
            subjects: SubjectRange::default(),
            csv: IbiCsvFormat::default(),
            frequency: FrequencyConfig::default(),
            metrics: MetricSelection::default(),
        }
    }
}

impl BatchConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg: BatchConfig = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.sampling_rate.is_finite() && self.sampling_rate > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "sampling_rate must be positive, got {}",
                self.sampling_rate
            )));
        }
        if self.subjects.first > self.subjects.last {
            return Err(ConfigError::Invalid(format!(
                "subject range {}..{} is empty",
                self.subjects.first, self.subjects.last
            )));
        }
        if self.file_name.is_empty() {
            return Err(ConfigError::Invalid("file_name is empty".into()));
        }
        if self.csv.delimiter_byte().is_none() {
            return Err(ConfigError::Invalid(format!(
                "csv delimiter {:?} is not a single ASCII character",
                self.csv.delimiter
            )));
        }
        let freq = &self.frequency;
        if !(freq.interpolation_rate > 0.0 && freq.min_frequency > 0.0) {
            return Err(ConfigError::Invalid(
                "frequency.interpolation_rate and frequency.min_frequency must be positive".into(),
            ));
        }
        let bands = &freq.bands;
        for (name, (lo, hi)) in [
            ("vlf", bands.vlf),
            ("lf", bands.lf),
            ("hf", bands.hf),
            ("vhf", bands.vhf),
        ] {
            if !(lo >= 0.0 && lo < hi) {
                return Err(ConfigError::Invalid(format!(
                    "frequency band {name} [{lo}, {hi}) is invalid"
                )));
            }
        }
        self.metrics.validate()
    }

    pub fn subject_ids(&self) -> Vec<String> {
        self.subjects.ids()
    }

    /// `<root_dir>/<subject>/<session_folder>/<file_name>`
    pub fn subject_path(&self, subject: &str) -> PathBuf {
        self.root_dir
            .join(subject)
            .join(&self.session_folder)
            .join(&self.file_name)
    }

    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.root_dir.join(DEFAULT_OUTPUT_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::select::SelectedMetric;
    use tempfile::tempdir;

    #[test]
    fn defaults_cover_ten_subjects() {
        let cfg = BatchConfig::default();
        let ids = cfg.subject_ids();
        assert_eq!(ids.len(), 10);
        assert_eq!(ids.first().map(String::as_str), Some("S1"));
        assert_eq!(ids.last().map(String::as_str), Some("S10"));
        assert_eq!(cfg.sampling_rate, 64.0);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn subject_path_follows_folder_convention() {
        let cfg = BatchConfig {
            root_dir: PathBuf::from("/data/exam"),
            ..BatchConfig::default()
        };
        assert_eq!(
            cfg.subject_path("S3"),
            PathBuf::from("/data/exam/S3/Final/IBI.csv")
        );
        assert_eq!(cfg.output_path(), PathBuf::from("/data/exam/final_HRV.xlsx"));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hrvbatch.toml");
        fs::write(
            &path,
            r#"
root_dir = "/data/study"
session_folder = "Baseline"

[subjects]
prefix = "P"
first = 3
last = 5

[[metrics]]
source = "HRV_SDNN"
column = "SDNN"
"#,
        )
        .unwrap();
        let cfg = BatchConfig::load(&path).unwrap();
        assert_eq!(cfg.subject_ids(), vec!["P3", "P4", "P5"]);
        assert_eq!(cfg.file_name, "IBI.csv");
        assert_eq!(cfg.sampling_rate, 64.0);
        assert_eq!(
            cfg.metrics,
            MetricSelection(vec![SelectedMetric::new("HRV_SDNN", "SDNN")])
        );
        assert_eq!(
            cfg.subject_path("P4"),
            PathBuf::from("/data/study/P4/Baseline/IBI.csv")
        );
    }

    #[test]
    fn shipped_example_matches_defaults() {
        let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        let path = manifest_dir
            .parent()
            .and_then(|p| p.parent())
            .expect("workspace root")
            .join("configs/hrvbatch.toml");
        let cfg = BatchConfig::load(&path).unwrap();
        let defaults = BatchConfig::default();
        assert_eq!(cfg.subjects, defaults.subjects);
        assert_eq!(cfg.csv, defaults.csv);
        assert_eq!(cfg.frequency, defaults.frequency);
        assert_eq!(cfg.metrics, defaults.metrics);
        assert_eq!(
            cfg.output_path(),
            PathBuf::from("data/exam_stress/final_HRV.xlsx")
        );
    }

    #[test]
    fn default_config_survives_toml() {
        let cfg = BatchConfig::default();
        let text = cfg.to_toml().unwrap();
        let parsed: BatchConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn rejects_bad_values() {
        let cfg = BatchConfig {
            sampling_rate: 0.0,
            ..BatchConfig::default()
        };
        assert!(cfg.validate().is_err());

        let mut cfg = BatchConfig::default();
        cfg.subjects.first = 11;
        assert!(cfg.validate().is_err());

        let mut cfg = BatchConfig::default();
        cfg.frequency.bands.hf = (0.4, 0.15);
        assert!(cfg.validate().is_err());

        let mut cfg = BatchConfig::default();
        cfg.metrics = MetricSelection(vec![SelectedMetric::new("HRV_Nope", "Nope")]);
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn unreadable_config_reports_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.toml");
        let err = BatchConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("missing.toml"));
    }
}
