use crate::error::IbiError;
use crate::signal::IbiSeries;
use csv::{ReaderBuilder, Trim};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

/// Where the interval column lives inside an IBI export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IbiCsvFormat {
    /// Zero-based column holding the interval in seconds.
    pub column: usize,
    /// Leading rows to discard (the export's header line).
    pub skip_rows: usize,
    pub delimiter: char,
}

impl Default for IbiCsvFormat {
    fn default() -> Self {
        Self {
            column: 1,
            skip_rows: 1,
            delimiter: ',',
        }
    }
}

impl IbiCsvFormat {
    pub fn delimiter_byte(&self) -> Option<u8> {
        u8::try_from(self.delimiter).ok().filter(|b| b.is_ascii())
    }
}

/// Read one IBI export from disk.
pub fn read_ibi_csv(path: &Path, format: &IbiCsvFormat) -> Result<IbiSeries, IbiError> {
    let file = File::open(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => IbiError::NotFound(path.to_path_buf()),
        _ => IbiError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;
    parse_ibi_csv(file, format)
}

/// Parse IBI rows from any reader. Blank lines are ignored; row numbers in
/// errors count from 1 and include the skipped header rows.
pub fn parse_ibi_csv<R: Read>(reader: R, format: &IbiCsvFormat) -> Result<IbiSeries, IbiError> {
    let delimiter = format
        .delimiter_byte()
        .ok_or(IbiError::InvalidDelimiter(format.delimiter))?;
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .delimiter(delimiter)
        .from_reader(reader);
    let mut ibi = Vec::new();
    for (idx, record) in reader.records().enumerate().skip(format.skip_rows) {
        let record = record?;
        let row = idx + 1;
        let raw = record.get(format.column).ok_or(IbiError::MissingColumn {
            row,
            column: format.column,
        })?;
        let value = raw
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| IbiError::InvalidValue {
                row,
                value: raw.to_string(),
            })?;
        ibi.push(value);
    }
    if ibi.is_empty() {
        return Err(IbiError::Empty);
    }
    Ok(IbiSeries { ibi })
}
