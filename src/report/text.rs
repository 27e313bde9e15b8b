use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};

use crate::data::model::Table;
use crate::data::summary::{SummaryBundle, UniqueValues, ValueCounts};

const NO_DATA: &str = "No data";

fn section(out: &mut String, title: &str, body: &str) {
    let _ = writeln!(out, "{title}");
    let _ = writeln!(out, "{}", "-".repeat(title.chars().count()));
    let _ = writeln!(out, "{}", body.trim_end());
    out.push('\n');
}

pub fn format_unique_values(unique: &[UniqueValues]) -> String {
    let mut out = String::new();
    for u in unique {
        let _ = writeln!(out, "\n{}: ({} unique)", u.column, u.values.len());
        for v in &u.values {
            let _ = writeln!(out, "  {v}");
        }
    }
    out
}

pub fn format_value_counts(counts: &[ValueCounts]) -> String {
    let mut out = String::new();
    for vc in counts {
        let _ = writeln!(out, "\n{}:", vc.column);
        let width = vc
            .counts
            .iter()
            .map(|(v, _)| v.to_string().chars().count())
            .max()
            .unwrap_or(0);
        for (v, n) in &vc.counts {
            let _ = writeln!(out, "  {:<width$}  {n}", v.to_string());
        }
    }
    out
}

/// Plain-text report body.
pub fn render(bundle: &SummaryBundle) -> String {
    let mut out = String::from("Data analysis report\n====================\n\n");
    section(&mut out, "Dataset info", &bundle.info.to_string());
    section(
        &mut out,
        "Shape",
        &format!("({}, {})", bundle.info.rows, bundle.info.columns),
    );
    section(&mut out, "Descriptive statistics", &bundle.describe.to_string());
    section(
        &mut out,
        "Correlations (Pearson)",
        &bundle.pearson.as_ref().map_or(NO_DATA.to_string(), |m| m.to_string()),
    );
    section(
        &mut out,
        "Correlations (Spearman)",
        &bundle.spearman.as_ref().map_or(NO_DATA.to_string(), |m| m.to_string()),
    );
    section(&mut out, "Unique values", &format_unique_values(&bundle.unique_values));
    section(&mut out, "Value counts", &format_value_counts(&bundle.value_counts));
    out
}

/// Write the plain-text report for `table` to `path`.
pub fn export_text(table: &Table, path: &Path) -> Result<()> {
    let body = render(&SummaryBundle::compute(table));
    std::fs::write(path, body).with_context(|| format!("writing {}", path.display()))?;
    log::info!("Text report written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Cell, Column};

    #[test]
    fn report_has_every_section() {
        let t = Table::new(vec![
            Column::new("n", vec![Cell::Integer(1), Cell::Integer(2), Cell::Integer(2)]),
            Column::new("k", vec![Cell::Text("a".into()), Cell::Missing, Cell::Text("a".into())]),
        ]);
        let text = render(&SummaryBundle::compute(&t));
        for heading in [
            "Dataset info",
            "Shape",
            "Descriptive statistics",
            "Correlations (Pearson)",
            "Correlations (Spearman)",
            "Unique values",
            "Value counts",
        ] {
            assert!(text.contains(heading), "missing {heading}");
        }
        assert!(text.contains("(3, 2)"));
        assert!(text.contains("  NaN  1"));
    }

    #[test]
    fn categorical_only_table_reports_no_correlations() {
        let t = Table::new(vec![Column::new("k", vec![Cell::Text("a".into())])]);
        let text = render(&SummaryBundle::compute(&t));
        assert!(text.contains("Correlations (Pearson)\n----------------------\nNo data"));
    }
}
