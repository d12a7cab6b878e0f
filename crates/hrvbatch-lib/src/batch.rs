//! Cohort driver: one IBI export per subject in, one summary table out.
//!
//! Subjects are processed sequentially. A subject whose file is missing or
//! whose computation fails is logged and skipped; it never stops the run.

use crate::config::BatchConfig;
use crate::error::{IbiError, SubjectError};
use crate::io::ibi::read_ibi_csv;
use crate::io::table::write_table;
use crate::metrics::hrv::hrv_features;
use crate::metrics::select::MetricRecord;
use crate::signal::intervals_to_peaks;
use crate::table::{ResultTable, SubjectRecord};
use anyhow::{anyhow, Context, Result};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

/// Parse, convert, rebuild peaks, extract features and keep the selected ones.
pub fn compute_selected_hrv(path: &Path, cfg: &BatchConfig) -> Result<MetricRecord, SubjectError> {
    let ibi = read_ibi_csv(path, &cfg.csv).map_err(|err| match err {
        IbiError::NotFound(path) => SubjectError::NotFound { path },
        other => computation(path, anyhow!(other)),
    })?;
    let rr = ibi.to_rr_ms();
    debug!(
        "{}: {} intervals spanning {:.1} s",
        path.display(),
        rr.len(),
        rr.duration_s()
    );
    let peaks = intervals_to_peaks(&rr, cfg.sampling_rate)
        .context("reconstructing peaks")
        .map_err(|err| computation(path, err))?;
    let features = hrv_features(&peaks, &cfg.frequency, cfg.metrics.needs_frequency())
        .context("computing HRV features")
        .map_err(|err| computation(path, err))?;
    Ok(cfg.metrics.apply(&features))
}

fn computation(path: &Path, source: anyhow::Error) -> SubjectError {
    SubjectError::Computation {
        path: path.to_path_buf(),
        source,
    }
}

#[derive(Debug)]
pub struct SubjectOutcome {
    pub subject: String,
    pub path: PathBuf,
    pub result: Result<MetricRecord, SubjectError>,
}

impl SubjectOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Debug)]
pub struct BatchReport {
    pub outcomes: Vec<SubjectOutcome>,
    /// None when no subject succeeded.
    pub table: Option<ResultTable>,
}

impl BatchReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &SubjectOutcome> {
        self.outcomes.iter().filter(|o| o.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = (&SubjectOutcome, &SubjectError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o, e)))
    }
}

/// Process every configured subject. The config is taken as given; call
/// [`BatchConfig::validate`] first, or use [`run_and_write`] which does.
pub fn run_batch(cfg: &BatchConfig) -> BatchReport {
    let mut outcomes = Vec::new();
    let mut records = Vec::new();
    for subject in cfg.subject_ids() {
        let path = cfg.subject_path(&subject);
        let result = compute_selected_hrv(&path, cfg);
        match &result {
            Ok(metrics) => {
                info!("finished {}", subject);
                records.push(SubjectRecord {
                    subject: subject.clone(),
                    metrics: metrics.clone(),
                });
            }
            Err(SubjectError::NotFound { path }) => {
                warn!("{}: file not found: {}", subject, path.display());
            }
            Err(err) => {
                warn!("{}: {}", subject, err);
            }
        }
        outcomes.push(SubjectOutcome {
            subject,
            path,
            result,
        });
    }
    let table = if records.is_empty() {
        None
    } else {
        Some(ResultTable::from_records(cfg.metrics.columns(), &records))
    };
    BatchReport { outcomes, table }
}

/// Validate the config, run the batch and write the table to
/// `cfg.output_path()`. Nothing is written when every subject failed.
pub fn run_and_write(cfg: &BatchConfig) -> Result<BatchReport> {
    cfg.validate()?;
    let report = run_batch(cfg);
    match &report.table {
        Some(table) => {
            let out = cfg.output_path();
            write_table(&out, table).with_context(|| format!("writing {}", out.display()))?;
            info!("wrote {} subject(s) to {}", table.len(), out.display());
        }
        None => warn!("no subject succeeded; check the paths and data format"),
    }
    Ok(report)
}
