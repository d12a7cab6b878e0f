use std::path::PathBuf;
use thiserror::Error;

/// Failures while reading an IBI export.
#[derive(Debug, Error)]
pub enum IbiError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row} has no column {column}")]
    MissingColumn { row: usize, column: usize },
    #[error("row {row} is not a finite number: {value:?}")]
    InvalidValue { row: usize, value: String },
    #[error("delimiter {0:?} is not a single ASCII character")]
    InvalidDelimiter(char),
    #[error("no IBI samples found")]
    Empty,
}

#[derive(Debug, Error, PartialEq)]
pub enum HrvError {
    #[error("sampling rate must be positive, got {0}")]
    InvalidSamplingRate(f64),
    #[error("interval {index} must be positive, got {value}")]
    InvalidInterval { index: usize, value: f64 },
    #[error("need at least {needed} beats, got {got}")]
    InsufficientBeats { needed: usize, got: usize },
    #[error("interval {index} pushes the peak timeline past the addressable range")]
    TimelineOverflow { index: usize },
    #[error("recording spans {duration_s:.1} s, too long to resample at {rate} Hz")]
    RecordingTooLong { duration_s: f64, rate: f64 },
    #[error("need at least {needed} resampled points, got {got}")]
    SignalTooShort { needed: usize, got: usize },
    #[error("spectrum: {0}")]
    Spectrum(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Why a single subject dropped out of the batch.
#[derive(Debug, Error)]
pub enum SubjectError {
    #[error("file not found: {}", path.display())]
    NotFound { path: PathBuf },
    #[error("{} failed: {source:#}", path.display())]
    Computation {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
}

impl SubjectError {
    pub fn path(&self) -> &std::path::Path {
        match self {
            SubjectError::NotFound { path } | SubjectError::Computation { path, .. } => path,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SubjectError::NotFound { .. } => "not_found",
            SubjectError::Computation { .. } => "computation",
        }
    }
}
