use std::path::Path;

use serde::Serialize;

use super::dialect::Dialect;
use super::error::{PipelineError, Result};
use super::model::Table;
use crate::config::SentinelSet;

// ---------------------------------------------------------------------------
// Validation report
// ---------------------------------------------------------------------------

/// Outcome of an accepted load.  Rejections are reported as errors instead.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    /// Fill ratio in percent (0–100).
    pub completeness: f64,
    /// 1-based line numbers of rows with the wrong field count.  Always empty
    /// on an accepted load; kept so callers can log what was checked.
    pub malformed_rows: Vec<usize>,
    /// Separator used for text formats, `None` for spreadsheets.
    pub separator: Option<char>,
    pub column_check_skipped: bool,
    pub used_unquoted_fallback: bool,
}

// ---------------------------------------------------------------------------
// Completeness
// ---------------------------------------------------------------------------

/// Percentage of cells that hold a real value: not `Missing` and, after
/// trimming, not one of the sentinel tokens.  An empty table scores 0.
pub fn completeness(table: &Table, sentinels: &SentinelSet) -> f64 {
    let total = table.size();
    if total == 0 {
        return 0.0;
    }
    let filled: usize = table
        .columns()
        .iter()
        .map(|col| {
            col.cells
                .iter()
                .filter(|c| !c.is_missing() && !sentinels.matches(&c.to_field()))
                .count()
        })
        .sum();
    filled as f64 / total as f64 * 100.0
}

fn check_completeness(table: &Table, sentinels: &SentinelSet, threshold: f64) -> Result<f64> {
    let ratio = completeness(table, sentinels);
    log::info!("Data completeness: {ratio:.2}%");
    if ratio < threshold {
        return Err(PipelineError::Completeness { ratio, threshold });
    }
    Ok(ratio)
}

// ---------------------------------------------------------------------------
// Column-count check
// ---------------------------------------------------------------------------

/// Re-tokenise every physical line after the header with `dialect` and
/// return the line numbers whose field count differs from `expected`.  An
/// empty line has no fields, so it is always reported.
pub fn malformed_rows(text: &str, dialect: Dialect, expected: usize) -> csv::Result<Vec<usize>> {
    let mut bad = Vec::new();
    for (line, actual) in dialect.line_field_counts(text)? {
        if actual != expected {
            log::warn!("Line {line}: expected {expected} columns, found {actual}");
            bad.push(line as usize);
        }
    }
    Ok(bad)
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Validate a table parsed from delimited text: completeness first, then the
/// column-count check.  A single malformed row rejects the whole file.
pub fn validate_text(
    path: &Path,
    table: &Table,
    text: &str,
    dialect: Dialect,
    sentinels: &SentinelSet,
    threshold: f64,
) -> Result<ValidationReport> {
    let completeness = check_completeness(table, sentinels, threshold)?;

    let expected = table.n_cols();
    let rows = malformed_rows(text, dialect, expected).map_err(|e| PipelineError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    if !rows.is_empty() {
        log::error!(
            "{} has rows with the wrong number of columns: {rows:?}",
            path.display()
        );
        return Err(PipelineError::StructuralMismatch {
            path: path.to_path_buf(),
            expected,
            rows,
        });
    }

    Ok(ValidationReport {
        completeness,
        malformed_rows: Vec::new(),
        separator: Some(dialect.separator()),
        column_check_skipped: false,
        used_unquoted_fallback: !dialect.quoting,
    })
}

/// Validate a spreadsheet grid.  Cell grids are structurally sound, so only
/// completeness is checked.
pub fn validate_grid(table: &Table, sentinels: &SentinelSet, threshold: f64) -> Result<ValidationReport> {
    let completeness = check_completeness(table, sentinels, threshold)?;
    Ok(ValidationReport {
        completeness,
        malformed_rows: Vec::new(),
        separator: None,
        column_check_skipped: true,
        used_unquoted_fallback: false,
    })
}

/// Checks run before a table is cleaned and analysed.
pub fn validate_shape(table: &Table) -> Result<()> {
    if table.n_cols() == 0 || table.n_rows() == 0 {
        return Err(PipelineError::EmptyDataset);
    }
    if table.n_cols() < 2 {
        return Err(PipelineError::InsufficientColumns {
            found: table.n_cols(),
        });
    }
    if table.n_rows() < 2 {
        return Err(PipelineError::InsufficientRows {
            found: table.n_rows(),
        });
    }
    if let Some(index) = table.columns().iter().position(|c| c.name.trim().is_empty()) {
        return Err(PipelineError::BlankHeader { index });
    }
    Ok(())
}
