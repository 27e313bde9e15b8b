use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use super::model::{Cell, ColumnKind, Table};
use super::stats;

// ---------------------------------------------------------------------------
// Shape / info
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub kind: ColumnKind,
    pub non_missing: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetInfo {
    pub rows: usize,
    pub columns: usize,
    pub column_info: Vec<ColumnInfo>,
}

pub fn info(table: &Table) -> DatasetInfo {
    DatasetInfo {
        rows: table.n_rows(),
        columns: table.n_cols(),
        column_info: table
            .columns()
            .iter()
            .map(|c| ColumnInfo {
                name: c.name.clone(),
                kind: c.kind,
                non_missing: c.len() - c.missing_count(),
            })
            .collect(),
    }
}

impl fmt::Display for DatasetInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} entries, {} columns", self.rows, self.columns)?;
        let rows = self
            .column_info
            .iter()
            .enumerate()
            .map(|(i, c)| {
                vec![
                    i.to_string(),
                    c.name.clone(),
                    format!("{} non-null", c.non_missing),
                    c.kind.to_string(),
                ]
            })
            .collect();
        write!(f, "{}", render_grid(&["#", "Column", "Non-Null Count", "Type"], rows))?;
        writeln!(f, "Shape: {} rows x {} columns", self.rows, self.columns)
    }
}

// ---------------------------------------------------------------------------
// Descriptive statistics
// ---------------------------------------------------------------------------

pub const DESCRIBE_STATS: [&str; 8] = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];

/// One column of `describe` output, in [`DESCRIBE_STATS`] order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnStats {
    pub name: String,
    pub values: [f64; 8],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Describe {
    pub columns: Vec<ColumnStats>,
}

/// count, mean, sample std, min, quartiles, max for every numeric column.
/// Statistics that are undefined (e.g. std of one value) are NaN.
pub fn describe(table: &Table) -> Describe {
    let columns = table
        .numeric_columns()
        .map(|col| {
            let v = col.numeric_values();
            let [min, q1, q2, q3, max] = stats::five_numbers(&v).unwrap_or([f64::NAN; 5]);
            ColumnStats {
                name: col.name.clone(),
                values: [
                    v.len() as f64,
                    stats::mean(&v).unwrap_or(f64::NAN),
                    stats::std_dev(&v, 1).unwrap_or(f64::NAN),
                    min,
                    q1,
                    q2,
                    q3,
                    max,
                ],
            }
        })
        .collect();
    Describe { columns }
}

impl fmt::Display for Describe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.columns.is_empty() {
            return writeln!(f, "No numeric columns");
        }
        let mut header = vec![""];
        header.extend(self.columns.iter().map(|c| c.name.as_str()));
        let rows = DESCRIBE_STATS
            .iter()
            .enumerate()
            .map(|(i, stat)| {
                let mut row = vec![stat.to_string()];
                row.extend(self.columns.iter().map(|c| fmt_num(c.values[i])));
                row
            })
            .collect();
        write!(f, "{}", render_grid(&header, rows))
    }
}

// ---------------------------------------------------------------------------
// Correlations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CorrelationMethod {
    Pearson,
    Spearman,
}

/// Square matrix over the numeric columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub method: CorrelationMethod,
    pub columns: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    fn compute(table: &Table, method: CorrelationMethod) -> Option<Self> {
        let cols: Vec<_> = table.numeric_columns().collect();
        if cols.is_empty() {
            return None;
        }
        let views: Vec<Vec<Option<f64>>> = cols.iter().map(|c| c.numeric_view()).collect();
        let n = cols.len();
        let mut values = vec![vec![f64::NAN; n]; n];
        for i in 0..n {
            for j in i..n {
                let (x, y) = stats::pairwise_complete(&views[i], &views[j]);
                let r = match method {
                    CorrelationMethod::Pearson => stats::pearson(&x, &y),
                    CorrelationMethod::Spearman => stats::spearman(&x, &y),
                };
                values[i][j] = r;
                values[j][i] = r;
            }
        }
        Some(CorrelationMatrix {
            method,
            columns: cols.iter().map(|c| c.name.clone()).collect(),
            values,
        })
    }

    /// The `n` strongest off-diagonal pairs by absolute coefficient.  NaN
    /// coefficients are left out.
    pub fn top_pairs(&self, n: usize) -> Vec<(String, String, f64)> {
        let mut pairs = Vec::new();
        for i in 0..self.columns.len() {
            for j in i + 1..self.columns.len() {
                let r = self.values[i][j];
                if !r.is_nan() {
                    pairs.push((self.columns[i].clone(), self.columns[j].clone(), r));
                }
            }
        }
        pairs.sort_by(|a, b| b.2.abs().total_cmp(&a.2.abs()));
        pairs.truncate(n);
        pairs
    }
}

impl fmt::Display for CorrelationMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut header = vec![""];
        header.extend(self.columns.iter().map(String::as_str));
        let rows = self
            .columns
            .iter()
            .zip(&self.values)
            .map(|(name, row)| {
                let mut out = vec![name.clone()];
                out.extend(row.iter().map(|v| fmt_num(*v)));
                out
            })
            .collect();
        write!(f, "{}", render_grid(&header, rows))
    }
}

/// Pearson and Spearman matrices, or `None` when no column is numeric.
pub fn correlations(table: &Table) -> Option<(CorrelationMatrix, CorrelationMatrix)> {
    Some((
        CorrelationMatrix::compute(table, CorrelationMethod::Pearson)?,
        CorrelationMatrix::compute(table, CorrelationMethod::Spearman)?,
    ))
}

// ---------------------------------------------------------------------------
// Unique values and value counts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UniqueValues {
    pub column: String,
    /// Distinct values in first-occurrence order, missing included.
    pub values: Vec<Cell>,
}

/// Per column, every distinct value in first-occurrence order.  No
/// truncation, however many there are.
pub fn unique_values(table: &Table) -> Vec<UniqueValues> {
    table
        .columns()
        .iter()
        .map(|col| {
            let mut seen = std::collections::HashSet::new();
            let values = col.cells.iter().filter(|c| seen.insert(*c)).cloned().collect();
            UniqueValues {
                column: col.name.clone(),
                values,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueCounts {
    pub column: String,
    /// Value → frequency, most frequent first.  Equal counts keep their
    /// first-occurrence order.  Missing is counted like any other value.
    pub counts: Vec<(Cell, usize)>,
}

pub fn value_counts(table: &Table) -> Vec<ValueCounts> {
    table
        .columns()
        .iter()
        .map(|col| {
            let mut index: HashMap<&Cell, usize> = HashMap::new();
            let mut counts: Vec<(Cell, usize)> = Vec::new();
            for cell in &col.cells {
                match index.get(cell) {
                    Some(&i) => counts[i].1 += 1,
                    None => {
                        index.insert(cell, counts.len());
                        counts.push((cell.clone(), 1));
                    }
                }
            }
            // Stable sort keeps first-occurrence order among ties.
            counts.sort_by(|a, b| b.1.cmp(&a.1));
            ValueCounts {
                column: col.name.clone(),
                counts,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Bundle
// ---------------------------------------------------------------------------

/// Everything the report and UI layers show, computed in one go from the
/// current table.  Never cached across a table change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryBundle {
    pub info: DatasetInfo,
    pub describe: Describe,
    pub pearson: Option<CorrelationMatrix>,
    pub spearman: Option<CorrelationMatrix>,
    pub unique_values: Vec<UniqueValues>,
    pub value_counts: Vec<ValueCounts>,
}

impl SummaryBundle {
    pub fn compute(table: &Table) -> Self {
        let (pearson, spearman) = match correlations(table) {
            Some((p, s)) => (Some(p), Some(s)),
            None => (None, None),
        };
        SummaryBundle {
            info: info(table),
            describe: describe(table),
            pearson,
            spearman,
            unique_values: unique_values(table),
            value_counts: value_counts(table),
        }
    }
}

// ---------------------------------------------------------------------------
// Text helpers
// ---------------------------------------------------------------------------

pub fn fmt_num(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else {
        format!("{v:.4}")
    }
}

/// Render rows as a right-aligned plain-text grid with a header line.
pub fn render_grid(header: &[&str], rows: Vec<Vec<String>>) -> String {
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let mut out = grid_line(header.iter().copied(), &widths);
    for row in &rows {
        out.push_str(&grid_line(row.iter().map(String::as_str), &widths));
    }
    out
}

fn grid_line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let parts: Vec<String> = cells
        .zip(widths)
        .map(|(c, w)| format!("{c:>w$}", w = *w))
        .collect();
    parts.join("  ").trim_end().to_string() + "\n"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Column;

    fn table() -> Table {
        let col = |name: &str, raw: &[&str]| Column::new(name, raw.iter().map(|s| Cell::from_raw(s)).collect());
        Table::new(vec![
            col("x", &["1", "2", "3", "4", ""]),
            col("y", &["2", "4", "6", "8", "10"]),
            col("k", &["b", "a", "b", "", "a"]),
        ])
    }

    #[test]
    fn info_counts_non_missing() {
        let i = info(&table());
        assert_eq!((i.rows, i.columns), (5, 3));
        assert_eq!(i.column_info[0].non_missing, 4);
        assert_eq!(i.column_info[2].kind, ColumnKind::Categorical);
        assert!(i.to_string().contains("Shape: 5 rows x 3 columns"));
    }

    #[test]
    fn describe_covers_numeric_columns_only() {
        let d = describe(&table());
        assert_eq!(d.columns.len(), 2);
        let x = &d.columns[0].values;
        assert_eq!(x[0], 4.0);
        assert_eq!(x[1], 2.5);
        assert_eq!(x[3], 1.0);
        assert_eq!(x[7], 4.0);
    }

    #[test]
    fn correlations_use_pairwise_complete_rows() {
        let (p, s) = correlations(&table()).unwrap();
        assert_eq!(p.columns, vec!["x", "y"]);
        assert!((p.values[0][1] - 1.0).abs() < 1e-12);
        assert!((s.values[1][0] - 1.0).abs() < 1e-12);
        assert_eq!(p.top_pairs(5), vec![("x".into(), "y".into(), p.values[0][1])]);
    }

    #[test]
    fn no_numeric_columns_means_no_correlations() {
        let t = Table::new(vec![Column::new("k", vec![Cell::Text("a".into())])]);
        assert!(correlations(&t).is_none());
        assert!(SummaryBundle::compute(&t).pearson.is_none());
    }

    #[test]
    fn unique_values_keep_first_occurrence_order() {
        let u = unique_values(&table());
        assert_eq!(
            u[2].values,
            vec![Cell::Text("b".into()), Cell::Text("a".into()), Cell::Missing]
        );
    }

    #[test]
    fn value_counts_sort_by_frequency_and_include_missing() {
        let vc = value_counts(&table());
        assert_eq!(
            vc[2].counts,
            vec![
                (Cell::Text("b".into()), 2),
                (Cell::Text("a".into()), 2),
                (Cell::Missing, 1)
            ]
        );
    }

    #[test]
    fn grid_is_right_aligned() {
        let g = render_grid(&["", "a"], vec![vec!["row".into(), "1.5".into()]]);
        assert_eq!(g, "       a\nrow  1.5\n");
    }
}
