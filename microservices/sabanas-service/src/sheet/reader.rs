//! Raw spreadsheet/CSV ingestion (C2, read side).
//!
//! Grounded in `_load_all_sheets` (Telcel/AT&T) and `_read_all_sheets`
//! (Movistar): dispatch on file extension, read every sheet of a workbook
//! with no header assumption, and hand back plain string grids for the
//! block-splitting stage to interpret.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};

use crate::error::{Result, SabanasError};

/// One worksheet (or the sole "sheet" of a CSV/TXT file) as a raw string
/// grid, with the sheet name preserved for diagnostics.
pub struct RawSheet {
    pub name: String,
    pub rows: Vec<Vec<String>>,
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.to_string(),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("#ERR:{e:?}"),
    }
}

fn read_workbook(path: &Path) -> Result<Vec<RawSheet>> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| SabanasError::Parse(format!("cannot open workbook {path:?}: {e}")))?;

    let sheet_names = workbook.sheet_names().to_vec();
    let mut sheets = Vec::with_capacity(sheet_names.len());

    for name in sheet_names {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| SabanasError::Parse(format!("cannot read sheet '{name}': {e}")))?;

        let rows: Vec<Vec<String>> = range
            .rows()
            .map(|row| row.iter().map(cell_to_string).collect())
            .collect();

        sheets.push(RawSheet { name, rows });
    }

    Ok(sheets)
}

fn read_delimited(path: &Path) -> Result<Vec<RawSheet>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| SabanasError::Parse(format!("cannot open delimited file {path:?}: {e}")))?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| SabanasError::Parse(format!("bad csv row: {e}")))?;
        rows.push(record.iter().map(|f| f.trim().to_string()).collect());
    }

    Ok(vec![RawSheet { name: "sheet1".to_string(), rows }])
}

/// Load every sheet of `path` as raw string grids, dispatching on extension
/// the same way the original service's `_load_all_sheets` does: `xlsx`/`xls`
/// through the spreadsheet reader, `csv`/`txt` through the delimited reader.
pub fn load_all_sheets(path: &Path) -> Result<Vec<RawSheet>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "xlsx" | "xls" | "xlsm" => read_workbook(path),
        "csv" | "txt" => read_delimited(path),
        other => Err(SabanasError::Parse(format!("unsupported file extension '{other}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_csv_rows() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "a,b,c").unwrap();
        writeln!(file, "1,2,3").unwrap();
        file.flush().unwrap();

        let sheets = load_all_sheets(file.path()).unwrap();
        assert_eq!(sheets.len(), 1);
        assert_eq!(sheets[0].rows.len(), 2);
        assert_eq!(sheets[0].rows[1], vec!["1", "2", "3"]);
    }

    #[test]
    fn unsupported_extension_errors() {
        let file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        assert!(load_all_sheets(file.path()).is_err());
    }
}
