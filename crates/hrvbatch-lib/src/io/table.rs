use crate::table::ResultTable;
use anyhow::{bail, Context, Result};
use csv::WriterBuilder;
use rust_xlsxwriter::{Format, Workbook};
use std::fs;
use std::path::Path;

pub const SHEET_NAME: &str = "HRV";
pub const INDEX_HEADER: &str = "Subject";

/// Write the table, picking the format from the file extension
/// (`xlsx`, `csv` or `tsv`).
pub fn write_table(path: &Path, table: &ResultTable) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("xlsx") => write_xlsx(path, table),
        Some("csv") => write_delimited(path, table, b','),
        Some("tsv") => write_delimited(path, table, b'\t'),
        _ => bail!(
            "unsupported output format for {} (expected .xlsx, .csv or .tsv)",
            path.display()
        ),
    }
}

/// One sheet: bold header row, subject index in column A, blank cells for
/// values that are not finite.
pub fn write_xlsx(path: &Path, table: &ResultTable) -> Result<()> {
    ensure_parent(path)?;
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;
    sheet.write_string_with_format(0, 0, INDEX_HEADER, &bold)?;
    for (col, name) in table.columns().iter().enumerate() {
        sheet.write_string_with_format(0, col as u16 + 1, name.as_str(), &bold)?;
    }
    for (idx, row) in table.rows().iter().enumerate() {
        let r = idx as u32 + 1;
        sheet.write_string_with_format(r, 0, row.subject.as_str(), &bold)?;
        for (col, value) in row.values.iter().enumerate() {
            if value.is_finite() {
                sheet.write_number(r, col as u16 + 1, *value)?;
            }
        }
    }
    workbook
        .save(path)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

pub fn write_delimited(path: &Path, table: &ResultTable, delimiter: u8) -> Result<()> {
    ensure_parent(path)?;
    let file =
        fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = WriterBuilder::new().delimiter(delimiter).from_writer(file);
    let mut header = vec![INDEX_HEADER.to_string()];
    header.extend(table.columns().iter().cloned());
    writer.write_record(&header)?;
    for row in table.rows() {
        let mut record = vec![row.subject.clone()];
        record.extend(row.values.iter().map(|v| {
            if v.is_finite() {
                v.to_string()
            } else {
                String::new()
            }
        }));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory {}", parent.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::select::MetricRecord;
    use crate::table::SubjectRecord;
    use tempfile::tempdir;

    fn table() -> ResultTable {
        let records = vec![
            SubjectRecord {
                subject: "S1".into(),
                metrics: MetricRecord::from_entries(vec![
                    ("RMSSD".into(), 42.5),
                    ("pNN50".into(), 12.0),
                    ("LF_HF_Ratio".into(), 1.25),
                ]),
            },
            SubjectRecord {
                subject: "S4".into(),
                metrics: MetricRecord::from_entries(vec![
                    ("RMSSD".into(), 30.0),
                    ("pNN50".into(), 5.0),
                    ("LF_HF_Ratio".into(), f64::NAN),
                ]),
            },
        ];
        let columns = vec!["RMSSD".into(), "pNN50".into(), "LF_HF_Ratio".into()];
        ResultTable::from_records(columns, &records)
    }

    #[test]
    fn csv_has_subject_index_and_blank_nan() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out/final_HRV.csv");
        write_table(&path, &table()).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Subject,RMSSD,pNN50,LF_HF_Ratio");
        assert_eq!(lines[1], "S1,42.5,12,1.25");
        assert_eq!(lines[2], "S4,30,5,");
    }

    #[test]
    fn tsv_uses_tabs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("final_HRV.tsv");
        write_table(&path, &table()).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("Subject\tRMSSD\tpNN50\tLF_HF_Ratio"));
    }

    #[test]
    fn xlsx_is_a_zip_container() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("final_HRV.xlsx");
        write_table(&path, &table()).unwrap();
        let bytes = fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("final_HRV.ods");
        assert!(write_table(&path, &table()).is_err());
        assert!(!path.exists());
    }
}
