/// Report export: the current table's summaries written out as a styled
/// HTML page (with embedded charts) or as plain text.
///
/// ```text
///   Table ──► SummaryBundle ──┬──► text::render  ──► .txt
///                             └──► html::render  ──► .html
///                                      ▲
///                  charts::render_all ─┘  (PNG files in a scratch TempDir)
/// ```

pub mod charts;
pub mod html;
pub mod text;

pub use html::export_html;
pub use text::export_text;

use crate::data::model::Table;

/// `(name, present values)` for every numeric column, in column order.
pub fn numeric_series(table: &Table) -> Vec<(String, Vec<f64>)> {
    table
        .numeric_columns()
        .map(|c| (c.name.clone(), c.numeric_values()))
        .collect()
}
