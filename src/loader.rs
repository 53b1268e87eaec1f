//! Spreadsheet input loader.

use crate::config::{ColumnConfig, InputConfig};
use crate::indicator::{refang, IndicatorBatch};
use calamine::{open_workbook_auto, Data, Range, Reader, Sheets};
use std::fmt;
use std::io::{Read, Seek, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Fatal input error. Missing sheets and columns are not errors.
#[derive(Debug)]
pub enum LoaderError {
    /// The workbook could not be opened or parsed.
    Open { path: PathBuf, source: calamine::Error },
    /// A sheet exists but its contents could not be read.
    Sheet { sheet: String, source: calamine::Error },
}

impl fmt::Display for LoaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoaderError::Open { path, source } => {
                write!(f, "failed to open workbook {}: {}", path.display(), source)
            }
            LoaderError::Sheet { sheet, source } => {
                write!(f, "failed to read sheet '{}': {}", sheet, source)
            }
        }
    }
}

impl std::error::Error for LoaderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoaderError::Open { source, .. } | LoaderError::Sheet { source, .. } => Some(source),
        }
    }
}

/// Anything that can hand out worksheets by name.
pub trait SheetSource {
    /// Names of all worksheets.
    fn sheet_names(&self) -> Vec<String>;

    /// Cell range of a worksheet known to exist.
    fn sheet_range(&mut self, name: &str) -> Result<Range<Data>, LoaderError>;
}

impl<RS: Read + Seek> SheetSource for Sheets<RS> {
    fn sheet_names(&self) -> Vec<String> {
        Reader::sheet_names(self)
    }

    fn sheet_range(&mut self, name: &str) -> Result<Range<Data>, LoaderError> {
        self.worksheet_range(name).map_err(|source| LoaderError::Sheet {
            sheet: name.to_string(),
            source,
        })
    }
}

/// Open a workbook. The format is picked from the file extension.
pub fn open(path: &Path) -> Result<Sheets<std::io::BufReader<std::fs::File>>, LoaderError> {
    open_workbook_auto(path).map_err(|source| LoaderError::Open {
        path: path.to_path_buf(),
        source,
    })
}

/// Load every configured indicator column and echo the values to stdout.
pub fn load_batch(config: &InputConfig) -> Result<IndicatorBatch, LoaderError> {
    info!(path = %config.path.display(), "Loading indicator workbook");
    let mut workbook = open(&config.path)?;

    let batch = IndicatorBatch {
        hashes: load_column(&mut workbook, &config.hashes, false)?,
        ips: load_column(&mut workbook, &config.ips, true)?,
        domains: load_column(&mut workbook, &config.domains, true)?,
    };

    if let Err(e) = echo_values(&batch, &mut std::io::stdout().lock()) {
        warn!(error = %e, "Failed to print loaded indicators");
    }

    info!(
        hashes = batch.hashes.len(),
        ips = batch.ips.len(),
        domains = batch.domains.len(),
        "Indicator workbook loaded"
    );

    Ok(batch)
}

/// Write every loaded value, one per line: hashes, then IPs, then domains.
fn echo_values<W: Write>(batch: &IndicatorBatch, out: &mut W) -> std::io::Result<()> {
    for values in [&batch.hashes, &batch.ips, &batch.domains] {
        for value in values {
            writeln!(out, "{}", value)?;
        }
    }
    out.flush()
}

/// Read one column from one sheet.
///
/// A missing sheet or column yields an empty list. `refang_values` turns
/// `[.]` back into `.`.
pub fn load_column<S: SheetSource>(
    source: &mut S,
    column: &ColumnConfig,
    refang_values: bool,
) -> Result<Vec<String>, LoaderError> {
    if !source.sheet_names().iter().any(|name| name == &column.sheet) {
        warn!(sheet = %column.sheet, "Sheet not found in workbook");
        return Ok(Vec::new());
    }

    let range = source.sheet_range(&column.sheet)?;

    let Some(values) = column_values(&range, &column.column) else {
        warn!(
            sheet = %column.sheet,
            column = %column.column,
            "Column not found in sheet header"
        );
        return Ok(Vec::new());
    };

    let values: Vec<String> = if refang_values {
        values.into_iter().map(|v| refang(&v)).collect()
    } else {
        values
    };

    debug!(sheet = %column.sheet, count = values.len(), "Column loaded");
    Ok(values)
}

/// Values below the header cell named `header`, or None if no such header.
///
/// Empty cells are skipped and values are trimmed.
fn column_values(range: &Range<Data>, header: &str) -> Option<Vec<String>> {
    let mut rows = range.rows();
    let header_row = rows.next()?;
    let index = header_row
        .iter()
        .position(|cell| cell_text(cell).as_deref() == Some(header))?;

    let values = rows
        .filter_map(|row| row.get(index))
        .filter_map(cell_text)
        .collect();

    Some(values)
}

fn cell_text(cell: &Data) -> Option<String> {
    let text = match cell {
        Data::Empty => return None,
        Data::String(s) => s.trim().to_string(),
        other => other.to_string().trim().to_string(),
    };

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;
    use std::collections::HashMap;

    /// In-memory workbook.
    struct MemoryWorkbook {
        sheets: HashMap<String, Range<Data>>,
    }

    impl SheetSource for MemoryWorkbook {
        fn sheet_names(&self) -> Vec<String> {
            self.sheets.keys().cloned().collect()
        }

        fn sheet_range(&mut self, name: &str) -> Result<Range<Data>, LoaderError> {
            Ok(self.sheets.get(name).cloned().unwrap_or_else(Range::empty))
        }
    }

    fn sheet(rows: &[&[&str]]) -> Range<Data> {
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(1) as u32;
        let mut range = Range::new((0, 0), (rows.len() as u32 - 1, width - 1));
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                let cell = if value.is_empty() {
                    Data::Empty
                } else {
                    Data::String(value.to_string())
                };
                range.set_value((r as u32, c as u32), cell);
            }
        }
        range
    }

    fn workbook(sheets: Vec<(&str, Range<Data>)>) -> MemoryWorkbook {
        MemoryWorkbook {
            sheets: sheets
                .into_iter()
                .map(|(name, range)| (name.to_string(), range))
                .collect(),
        }
    }

    fn column(sheet: &str, column: &str) -> ColumnConfig {
        ColumnConfig {
            sheet: sheet.to_string(),
            column: column.to_string(),
        }
    }

    #[test]
    fn test_load_column_values() {
        let mut book = workbook(vec![(
            "HASH",
            sheet(&[&["Comment", "SHA256"], &["a", "aaa"], &["b", "bbb"]]),
        )]);

        let values = load_column(&mut book, &column("HASH", "SHA256"), false).unwrap();
        assert_eq!(values, vec!["aaa", "bbb"]);
    }

    #[test]
    fn test_load_column_refangs() {
        let mut book = workbook(vec![(
            "IP ADDRESS",
            sheet(&[&["IP Address"], &["1[.]2[.]3[.]4"], &["5.6.7.8"]]),
        )]);

        let values = load_column(&mut book, &column("IP ADDRESS", "IP Address"), true).unwrap();
        assert_eq!(values, vec!["1.2.3.4", "5.6.7.8"]);
    }

    #[test]
    fn test_load_column_missing_sheet() {
        let mut book = workbook(vec![("HASH", sheet(&[&["SHA256"], &["aaa"]]))]);

        let values = load_column(&mut book, &column("DOMAIN", "Domain"), true).unwrap();
        assert!(values.is_empty());
    }

    #[test]
    fn test_load_column_missing_column() {
        let mut book = workbook(vec![("DOMAIN", sheet(&[&["Host"], &["example.com"]]))]);

        let values = load_column(&mut book, &column("DOMAIN", "Domain"), true).unwrap();
        assert!(values.is_empty());
    }

    #[test]
    fn test_column_values_skips_blank_cells() {
        let range = sheet(&[&["Domain"], &["example[.]com"], &[""], &["  "], &[" evil.test "]]);
        let values = column_values(&range, "Domain").unwrap();
        assert_eq!(values, vec!["example[.]com", "evil.test"]);
    }

    #[test]
    fn test_column_values_empty_sheet() {
        let range: Range<Data> = Range::empty();
        assert!(column_values(&range, "Domain").is_none());
    }

    #[test]
    fn test_cell_text_numbers() {
        assert_eq!(cell_text(&Data::Int(42)), Some("42".to_string()));
        assert_eq!(cell_text(&Data::Empty), None);
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.xlsx");
        assert!(matches!(open(&path), Err(LoaderError::Open { .. })));
    }

    #[test]
    fn test_load_batch_malformed_workbook() {
        let mut file = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        file.write_all(b"this is not a zip archive").unwrap();
        file.flush().unwrap();

        let config = InputConfig {
            path: file.path().to_path_buf(),
            ..InputConfig::default()
        };
        assert!(load_batch(&config).is_err());
    }

    #[test]
    fn test_echo_values_order() {
        let batch = IndicatorBatch {
            hashes: vec!["aaa".to_string()],
            domains: vec!["example.com".to_string()],
            ips: vec!["1.2.3.4".to_string()],
        };

        let mut out = Vec::new();
        echo_values(&batch, &mut out).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "aaa\n1.2.3.4\nexample.com\n");
    }

    #[test]
    fn test_load_batch_real_workbook_missing_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("iocs.xlsx");

        let mut book = Workbook::new();
        let hashes = book.add_worksheet();
        hashes.set_name("HASH").unwrap();
        hashes.write_string(0, 0, "SHA256").unwrap();
        hashes.write_string(1, 0, "aaa").unwrap();
        hashes.write_string(2, 0, "bbb").unwrap();
        let ips = book.add_worksheet();
        ips.set_name("IP ADDRESS").unwrap();
        ips.write_string(0, 0, "IP Address").unwrap();
        ips.write_string(1, 0, "10[.]0[.]0[.]1").unwrap();
        book.save(&path).unwrap();

        let config = InputConfig {
            path: path.clone(),
            ..InputConfig::default()
        };
        let batch = load_batch(&config).unwrap();

        assert_eq!(batch.hashes, vec!["aaa", "bbb"]);
        assert_eq!(batch.ips, vec!["10.0.0.1"]);
        assert!(batch.domains.is_empty());
    }
}
