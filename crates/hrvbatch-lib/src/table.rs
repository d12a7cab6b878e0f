use crate::metrics::select::MetricRecord;
use serde::Serialize;

/// A successful subject and its selected metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectRecord {
    pub subject: String,
    pub metrics: MetricRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub subject: String,
    pub values: Vec<f64>,
}

/// Summary table indexed by subject, with a fixed column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultTable {
    columns: Vec<String>,
    rows: Vec<TableRow>,
}

impl ResultTable {
    /// Rows keep record order; each row is laid out by `columns`, whatever
    /// order its record carried. Absent columns become NaN.
    pub fn from_records(columns: Vec<String>, records: &[SubjectRecord]) -> Self {
        let rows = records
            .iter()
            .map(|record| TableRow {
                subject: record.subject.clone(),
                values: columns
                    .iter()
                    .map(|c| record.metrics.get(c).unwrap_or(f64::NAN))
                    .collect(),
            })
            .collect();
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    pub fn subjects(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.subject.as_str()).collect()
    }

    pub fn row(&self, subject: &str) -> Option<&[f64]> {
        self.rows
            .iter()
            .find(|r| r.subject == subject)
            .map(|r| r.values.as_slice())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
