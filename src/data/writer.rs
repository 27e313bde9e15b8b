use std::path::Path;

use rust_xlsxwriter::Workbook;

use super::error::{PipelineError, Result};
use super::model::{Cell, Table};

/// Save `table` next to the user's choice of format, decided by extension:
/// `.csv` comma-delimited, `.xlsx`/`.xls` workbook, anything else
/// tab-delimited.  Missing cells, and text that is only whitespace, are
/// written as empty fields.
pub fn save_table(table: &Table, path: &Path) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let write_err = |message: String| PipelineError::Write {
        path: path.to_path_buf(),
        message,
    };

    match ext.as_str() {
        "csv" => write_delimited(table, path, b',').map_err(|e| write_err(e.to_string()))?,
        "xlsx" | "xls" => {
            if ext == "xls" {
                log::warn!("Writing {} as an xlsx workbook", path.display());
            }
            write_workbook(table, path).map_err(|e| write_err(e.to_string()))?
        }
        _ => write_delimited(table, path, b'\t').map_err(|e| write_err(e.to_string()))?,
    }

    log::info!("Dataset saved to {}", path.display());
    Ok(())
}

fn field(cell: &Cell) -> String {
    match cell {
        Cell::Text(s) if s.trim().is_empty() => String::new(),
        other => other.to_field(),
    }
}

fn write_delimited(table: &Table, path: &Path, delimiter: u8) -> csv::Result<()> {
    let mut writer = csv::WriterBuilder::new().delimiter(delimiter).from_path(path)?;
    writer.write_record(table.column_names())?;
    for i in 0..table.n_rows() {
        writer.write_record(table.row(i).into_iter().map(field))?;
    }
    writer.flush()?;
    Ok(())
}

fn write_workbook(table: &Table, path: &Path) -> std::result::Result<(), rust_xlsxwriter::XlsxError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    for (c, col) in table.columns().iter().enumerate() {
        let c = c as u16;
        sheet.write_string(0, c, col.name.as_str())?;
        for (r, cell) in col.cells.iter().enumerate() {
            let r = r as u32 + 1;
            match cell {
                Cell::Integer(i) => {
                    sheet.write_number(r, c, *i as f64)?;
                }
                Cell::Float(v) if v.is_finite() => {
                    sheet.write_number(r, c, *v)?;
                }
                Cell::Text(s) if !s.trim().is_empty() => {
                    sheet.write_string(r, c, s.as_str())?;
                }
                _ => {}
            }
        }
    }

    workbook.save(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Column;

    #[test]
    fn csv_writes_missing_and_blank_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let t = Table::new(vec![
            Column::new("a", vec![Cell::Integer(1), Cell::Missing]),
            Column::new("b", vec![Cell::Text("  ".into()), Cell::Text("x, y".into())]),
        ]);
        save_table(&t, &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "a,b\n1,\n,\"x, y\"\n");
    }

    #[test]
    fn unknown_extension_writes_tabs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.dat");
        let t = Table::new(vec![
            Column::new("a", vec![Cell::Float(0.5)]),
            Column::new("b", vec![Cell::Text("q".into())]),
        ]);
        save_table(&t, &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a\tb\n0.5\tq\n");
    }

    #[test]
    fn unwritable_path_is_a_write_error() {
        let t = Table::new(vec![Column::new("a", vec![Cell::Integer(1)])]);
        let err = save_table(&t, Path::new("/no/such/dir/out.csv")).unwrap_err();
        assert!(matches!(err, PipelineError::Write { .. }));
    }
}
