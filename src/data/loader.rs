use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};

use super::dialect::Dialect;
use super::error::{PipelineError, Result};
use super::model::Table;
use super::sniff::detect_separator;
use super::validate::{self, ValidationReport};
use crate::config::PipelineConfig;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// File families the loader knows how to read, decided by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Tsv,
    /// Plain text with an unknown delimiter; sniffed from the first line.
    Txt,
    Spreadsheet,
    /// Anything else: read as comma-delimited text.
    Other,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "csv" => SourceFormat::Csv,
            "tsv" => SourceFormat::Tsv,
            "txt" => SourceFormat::Txt,
            "xlsx" | "xls" | "xlsm" | "xlsb" => SourceFormat::Spreadsheet,
            _ => SourceFormat::Other,
        }
    }
}

/// An accepted table together with the report of the checks it passed.
#[derive(Debug, Clone)]
pub struct Loaded {
    pub table: Table,
    pub report: ValidationReport,
}

/// Load and validate a tabular file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`  – comma, quoted, leading whitespace trimmed; unquoted retry
/// * `.tsv`  – tab
/// * `.txt`  – delimiter sniffed from the first line
/// * `.xlsx` / `.xls` / `.xlsm` / `.xlsb` – first worksheet
/// * anything else – comma
///
/// Every path goes through the structural validator; a file that fails any
/// check is rejected as a whole.
pub fn load_file(path: &Path, config: &PipelineConfig) -> Result<Loaded> {
    log::info!("Loading {}", path.display());
    let format = SourceFormat::from_path(path);

    let loaded = match format {
        SourceFormat::Spreadsheet => load_spreadsheet(path, config),
        SourceFormat::Csv => load_csv(path, config),
        SourceFormat::Tsv => load_delimited(path, Dialect::delimited('\t'), config),
        SourceFormat::Txt => {
            let text = read_text(path)?;
            let first_line = text.lines().next().unwrap_or("");
            let separator = detect_separator(first_line).ok_or_else(|| {
                PipelineError::SeparatorNotDetected {
                    path: path.to_path_buf(),
                }
            })?;
            log::info!("Detected separator {separator:?}");
            accept_text(path, &text, Dialect::delimited(separator), false, config)
        }
        SourceFormat::Other => load_delimited(path, Dialect::delimited(','), config),
    };

    match &loaded {
        Ok(l) => log::info!(
            "Accepted {}: {} rows x {} columns",
            path.display(),
            l.table.n_rows(),
            l.table.n_cols()
        ),
        Err(e) => log::error!("Rejected {}: {e}", path.display()),
    }
    loaded
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| PipelineError::FileRead {
        path: path.to_path_buf(),
        source,
    })
}

// ---------------------------------------------------------------------------
// Delimited text
// ---------------------------------------------------------------------------

fn load_delimited(path: &Path, dialect: Dialect, config: &PipelineConfig) -> Result<Loaded> {
    let text = read_text(path)?;
    accept_text(path, &text, dialect, false, config)
}

/// Quoted parse first; a parse error triggers one unquoted retry.  Both
/// attempts run the full validation independently.
fn load_csv(path: &Path, config: &PipelineConfig) -> Result<Loaded> {
    let text = read_text(path)?;
    match accept_text(path, &text, Dialect::csv(), true, config) {
        Err(PipelineError::Parse { message, .. }) => {
            log::warn!("Quoted CSV parse failed ({message}); retrying without quoting");
            accept_text(path, &text, Dialect::csv_unquoted(), false, config)
        }
        other => other,
    }
}

fn accept_text(
    path: &Path,
    text: &str,
    dialect: Dialect,
    reject_long_rows: bool,
    config: &PipelineConfig,
) -> Result<Loaded> {
    let table = parse_text(path, text, dialect, reject_long_rows)?;
    log::info!("Parsed table of shape {:?}", table.shape());
    let report = validate::validate_text(
        path,
        &table,
        text,
        dialect,
        &config.sentinels,
        config.completeness_threshold,
    )?;
    Ok(Loaded { table, report })
}

/// Tokenise `text` into a table.  The first record is the header.
///
/// With `reject_long_rows`, a record carrying more fields than the header is
/// a parse error.  Otherwise long rows are truncated and short rows padded;
/// the validator reports both.
pub fn parse_text(path: &Path, text: &str, dialect: Dialect, reject_long_rows: bool) -> Result<Table> {
    let parse_err = |message: String| PipelineError::Parse {
        path: path.to_path_buf(),
        message,
    };

    let mut records = dialect.records(text);
    let header = match records.next() {
        Some(rec) => rec.map_err(|e| parse_err(e.to_string()))?,
        None => return Err(PipelineError::EmptyDataset),
    };
    let width = header.fields.len();

    let mut rows = Vec::new();
    for rec in records {
        let rec = rec.map_err(|e| parse_err(e.to_string()))?;
        if reject_long_rows && rec.fields.len() > width {
            return Err(parse_err(format!(
                "line {}: expected {width} fields, saw {}",
                rec.line,
                rec.fields.len()
            )));
        }
        rows.push(rec.fields);
    }

    Ok(Table::from_raw_rows(header.fields, &rows))
}

// ---------------------------------------------------------------------------
// Spreadsheets
// ---------------------------------------------------------------------------

fn load_spreadsheet(path: &Path, config: &PipelineConfig) -> Result<Loaded> {
    // Surface missing/unreadable files as read errors, not workbook errors.
    std::fs::File::open(path).map_err(|source| PipelineError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let sheet_err = |message: String| PipelineError::Parse {
        path: path.to_path_buf(),
        message,
    };

    let mut workbook = open_workbook_auto(path).map_err(|e| sheet_err(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| sheet_err("workbook has no worksheets".to_string()))?
        .map_err(|e| sheet_err(e.to_string()))?;

    let mut rows = range.rows().map(|row| row.iter().map(sheet_cell_text).collect::<Vec<_>>());
    let header = rows.next().ok_or(PipelineError::EmptyDataset)?;
    let body: Vec<Vec<String>> = rows.collect();

    let table = Table::from_raw_rows(header, &body);
    log::info!("Parsed worksheet of shape {:?}", table.shape());

    // Spreadsheet grids skip the column-count check.
    let report = validate::validate_grid(&table, &config.sentinels, config.completeness_threshold)?;
    Ok(Loaded { table, report })
}

/// Text form of a worksheet cell.  Empty and error cells become blank, which
/// the table turns into `Missing`.
fn sheet_cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Cell, ColumnKind};

    fn write(dir: &tempfile::TempDir, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn dispatch_by_extension() {
        assert_eq!(SourceFormat::from_path(Path::new("a.CSV")), SourceFormat::Csv);
        assert_eq!(SourceFormat::from_path(Path::new("a.xlsb")), SourceFormat::Spreadsheet);
        assert_eq!(SourceFormat::from_path(Path::new("a.txt")), SourceFormat::Txt);
        assert_eq!(SourceFormat::from_path(Path::new("a.dat")), SourceFormat::Other);
        assert_eq!(SourceFormat::from_path(Path::new("noext")), SourceFormat::Other);
    }

    #[test]
    fn csv_trims_leading_whitespace() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "d.csv", "a, b\n1, x\n2,  y\n");
        let loaded = load_file(&path, &PipelineConfig::default()).unwrap();
        let t = loaded.table;
        assert_eq!(t.column_names(), vec!["a", "b"]);
        assert_eq!(t.column("b").unwrap().cells[1], Cell::Text("y".into()));
        assert_eq!(t.column("a").unwrap().kind, ColumnKind::Numeric);
        assert_eq!(loaded.report.separator, Some(','));
    }

    #[test]
    fn long_csv_row_falls_back_to_unquoted_then_reports_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "d.csv", "a,b\n1,2\n3,4,5\n");
        let err = load_file(&path, &PipelineConfig::default()).unwrap_err();
        match err {
            PipelineError::StructuralMismatch { rows, expected, .. } => {
                assert_eq!(rows, vec![3]);
                assert_eq!(expected, 2);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn trailing_comma_is_accepted_by_the_unquoted_retry() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "d.csv", "a,b\n1,2,\n3,4\n");
        let loaded = load_file(&path, &PipelineConfig::default()).unwrap();
        assert!(loaded.report.used_unquoted_fallback);
        assert_eq!(loaded.table.shape(), (2, 2));
        assert_eq!(loaded.table.column("b").unwrap().cells[0], Cell::Integer(2));
    }

    #[test]
    fn blank_line_between_rows_rejects_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "d.csv", "a,b\n1,2\n\n3,4\n");
        let err = load_file(&path, &PipelineConfig::default()).unwrap_err();
        assert!(
            matches!(&err, PipelineError::StructuralMismatch { rows, .. } if *rows == vec![3]),
            "{err:?}"
        );
    }

    #[test]
    fn txt_separator_is_sniffed() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "d.txt", "a;b;c\n1;2;3\n4;5;6\n");
        let loaded = load_file(&path, &PipelineConfig::default()).unwrap();
        assert_eq!(loaded.report.separator, Some(';'));
        assert_eq!(loaded.table.shape(), (2, 3));
    }

    #[test]
    fn txt_without_separator_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "d.txt", "single\n1\n2\n");
        assert!(matches!(
            load_file(&path, &PipelineConfig::default()),
            Err(PipelineError::SeparatorNotDetected { .. })
        ));
    }

    #[test]
    fn tsv_keeps_commas_inside_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "d.tsv", "name\tnote\nann\ta, b\nbob\tc\n");
        let loaded = load_file(&path, &PipelineConfig::default()).unwrap();
        assert_eq!(loaded.table.column("note").unwrap().cells[0], Cell::Text("a, b".into()));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = load_file(Path::new("/definitely/not/here.csv"), &PipelineConfig::default())
            .unwrap_err();
        assert!(matches!(err, PipelineError::FileRead { .. }));
    }

    #[test]
    fn empty_file_is_empty_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "d.tsv", "");
        assert!(matches!(
            load_file(&path, &PipelineConfig::default()),
            Err(PipelineError::EmptyDataset)
        ));
    }

    /// Workbook whose first sheet holds `rows`; `None` leaves the cell unset.
    fn write_workbook(dir: &tempfile::TempDir, name: &str, rows: &[&[Option<&str>]]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                let Some(value) = value else { continue };
                match value.parse::<f64>() {
                    Ok(n) => sheet.write_number(r as u32, c as u16, n).unwrap(),
                    Err(_) => sheet.write_string(r as u32, c as u16, *value).unwrap(),
                };
            }
        }
        // a second sheet that must be ignored
        workbook.add_worksheet().write_string(0, 0, "ignored").unwrap();
        workbook.save(&path).unwrap();
        path
    }

    #[test]
    fn workbook_reads_the_first_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_workbook(
            &dir,
            "w.xlsx",
            &[
                &[Some("id"), Some("city")],
                &[Some("1"), Some("Porto")],
                &[Some("2.5"), Some("Faro")],
            ],
        );
        let loaded = load_file(&path, &PipelineConfig::default()).unwrap();
        assert_eq!(loaded.table.shape(), (2, 2));
        assert_eq!(loaded.table.column_names(), vec!["id", "city"]);
        assert_eq!(loaded.table.column("id").unwrap().kind, ColumnKind::Numeric);
        assert_eq!(loaded.table.column("city").unwrap().cells[1], Cell::Text("Faro".into()));
        assert_eq!(loaded.report.separator, None);
        assert!(loaded.report.column_check_skipped);
    }

    #[test]
    fn ragged_workbook_still_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_workbook(
            &dir,
            "ragged.xlsx",
            &[
                &[Some("a"), Some("b"), Some("c")],
                &[Some("1"), Some("2"), Some("3")],
                &[Some("4")],
                &[Some("5"), Some("6"), Some("7")],
            ],
        );
        let loaded = load_file(&path, &PipelineConfig::default()).unwrap();
        assert_eq!(loaded.table.shape(), (3, 3));
        assert!(loaded.report.malformed_rows.is_empty());
        assert!(loaded.table.column("b").unwrap().cells[1].is_missing());
    }

    #[test]
    fn sparse_workbook_fails_completeness() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_workbook(
            &dir,
            "sparse.xlsx",
            &[
                &[Some("a"), Some("b"), Some("c")],
                &[Some("1"), None, None],
                &[None, None, Some("NA")],
                &[None, Some("2"), None],
            ],
        );
        let err = load_file(&path, &PipelineConfig::default()).unwrap_err();
        assert!(matches!(err, PipelineError::Completeness { .. }), "{err:?}");
    }
}
