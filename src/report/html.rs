use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use askama_escape::Html;
use base64::Engine;

use super::charts::{self, RenderedChart};
use super::numeric_series;
use crate::color;
use crate::config::PipelineConfig;
use crate::data::model::Table;
use crate::data::summary::{fmt_num, CorrelationMatrix, Describe, SummaryBundle, DESCRIBE_STATS};

const STYLE: &str = r#"
body { font-family: Arial, sans-serif; margin: 20px; }
h1, h2, h3 { color: #333; }
table { border-collapse: collapse; margin: 20px 0; }
th, td { border: 1px solid #ddd; padding: 8px; text-align: right; }
th { background-color: #f5f5f5; }
.info { background-color: #f9f9f9; padding: 15px; border-radius: 5px; white-space: pre; font-family: monospace; }
.plot-container { margin: 20px 0; padding: 15px; background-color: white; border-radius: 5px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }
.plot-container img { max-width: 100%; height: auto; display: block; margin: 10px auto; }
"#;

fn escape(s: &str) -> String {
    askama_escape::escape(s, Html).to_string()
}

fn describe_table(d: &Describe) -> String {
    if d.columns.is_empty() {
        return "<p>No numeric columns</p>".to_string();
    }
    let mut html = String::from("<table><tr><th></th>");
    for c in &d.columns {
        let _ = write!(html, "<th>{}</th>", escape(&c.name));
    }
    html.push_str("</tr>");
    for (i, stat) in DESCRIBE_STATS.iter().enumerate() {
        let _ = write!(html, "<tr><th>{stat}</th>");
        for c in &d.columns {
            let _ = write!(html, "<td>{}</td>", fmt_num(c.values[i]));
        }
        html.push_str("</tr>");
    }
    html.push_str("</table>");
    html
}

/// Matrix as a table whose cells are tinted on the diverging scale.
fn matrix_table(m: Option<&CorrelationMatrix>) -> String {
    let Some(m) = m else {
        return "<p>No data</p>".to_string();
    };
    let mut html = String::from("<table><tr><th></th>");
    for c in &m.columns {
        let _ = write!(html, "<th>{}</th>", escape(c));
    }
    html.push_str("</tr>");
    for (name, row) in m.columns.iter().zip(&m.values) {
        let _ = write!(html, "<tr><th>{}</th>", escape(name));
        for v in row {
            let bg = color::diverging(*v);
            let fg = color::contrast_text(bg);
            let _ = write!(
                html,
                "<td style=\"background-color:{};color:{}\">{}</td>",
                color::hex(bg),
                color::hex(fg),
                fmt_num(*v)
            );
        }
        html.push_str("</tr>");
    }
    html.push_str("</table>");
    html
}

fn unique_values_html(bundle: &SummaryBundle) -> String {
    let mut html = String::from("<div class='unique-values'>");
    for u in &bundle.unique_values {
        let _ = write!(html, "<h3>{} ({} unique)</h3><ul>", escape(&u.column), u.values.len());
        for v in &u.values {
            let _ = write!(html, "<li>{}</li>", escape(&v.to_string()));
        }
        html.push_str("</ul>");
    }
    html.push_str("</div>");
    html
}

fn value_counts_html(bundle: &SummaryBundle) -> String {
    let mut html = String::from("<div class='value-counts'>");
    for vc in &bundle.value_counts {
        let _ = write!(
            html,
            "<h3>{}</h3><table><tr><th>value</th><th>count</th></tr>",
            escape(&vc.column)
        );
        for (v, n) in &vc.counts {
            let _ = write!(html, "<tr><td>{}</td><td>{n}</td></tr>", escape(&v.to_string()));
        }
        html.push_str("</table>");
    }
    html.push_str("</div>");
    html
}

fn charts_html(charts: &[RenderedChart]) -> Result<String> {
    let mut html = String::new();
    for chart in charts {
        let bytes = std::fs::read(&chart.path)
            .with_context(|| format!("reading chart {}", chart.path.display()))?;
        let title = escape(&chart.title);
        let _ = write!(
            html,
            "<div class=\"plot-container\"><h3>{title}</h3>\
             <img src=\"data:image/png;base64,{}\" alt=\"{title}\"></div>",
            STANDARD.encode(bytes)
        );
    }
    Ok(html)
}

/// Full HTML document.  `charts` must still exist on disk; they are inlined
/// as base64 data URIs.
pub fn render(bundle: &SummaryBundle, charts: &[RenderedChart]) -> Result<String> {
    let mut html = String::new();
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Data analysis report</title>\n<style>{STYLE}</style>\n</head>\n<body>\n\
         <h1>Data analysis report</h1>\n"
    );
    let _ = write!(
        html,
        "<h2>Dataset info</h2>\n<div class=\"info\">{}</div>\n",
        escape(&bundle.info.to_string())
    );
    let _ = write!(
        html,
        "<h2>Shape</h2>\n<div class=\"info\">({}, {})</div>\n",
        bundle.info.rows, bundle.info.columns
    );
    let _ = write!(html, "<h2>Descriptive statistics</h2>\n{}\n", describe_table(&bundle.describe));
    let _ = write!(
        html,
        "<h2>Correlations (Pearson)</h2>\n{}\n",
        matrix_table(bundle.pearson.as_ref())
    );
    let _ = write!(
        html,
        "<h2>Correlations (Spearman)</h2>\n{}\n",
        matrix_table(bundle.spearman.as_ref())
    );
    let _ = write!(html, "<h2>Unique values</h2>\n{}\n", unique_values_html(bundle));
    let _ = write!(html, "<h2>Value counts</h2>\n{}\n", value_counts_html(bundle));
    let _ = write!(html, "<h2>Charts</h2>\n{}\n", charts_html(charts)?);
    html.push_str("</body>\n</html>\n");
    Ok(html)
}

/// Render charts into a scratch directory, inline them, write the page.
/// The scratch directory is removed when this returns, on success or error.
pub fn export_html(table: &Table, config: &PipelineConfig, path: &Path) -> Result<()> {
    let bundle = SummaryBundle::compute(table);
    let scratch = tempfile::Builder::new()
        .prefix("rusty-tabula-plots")
        .tempdir()
        .context("creating chart directory")?;

    let charts = charts::render_all(
        scratch.path(),
        bundle.pearson.as_ref(),
        &numeric_series(table),
        config.histogram_bins,
    )?;
    let html = render(&bundle, &charts)?;
    std::fs::write(path, html).with_context(|| format!("writing {}", path.display()))?;

    log::info!("HTML report written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Cell, Column};

    fn table() -> Table {
        Table::new(vec![
            Column::new("a<b", vec![Cell::Integer(1), Cell::Integer(2), Cell::Integer(4)]),
            Column::new("y", vec![Cell::Float(0.5), Cell::Float(1.5), Cell::Float(1.0)]),
            Column::new("k", vec![Cell::Text("x".into()), Cell::Text("y".into()), Cell::Missing]),
        ])
    }

    #[test]
    fn export_embeds_all_charts() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("report.html");
        export_html(&table(), &PipelineConfig::default(), &out).unwrap();

        let html = std::fs::read_to_string(&out).unwrap();
        // heatmap + (histogram, box plot) for two numeric columns
        assert_eq!(html.matches("data:image/png;base64,").count(), 5);
        assert!(html.contains("<h2>Correlations (Spearman)</h2>"));
        assert!(html.contains("a&lt;b"));
        assert!(!html.contains("<th>a<b</th>"));
    }

    #[test]
    fn markup_in_values_is_escaped() {
        assert_eq!(escape(r#"<b>"R&D" 'x'"#), "&lt;b&gt;&quot;R&amp;D&quot; &#x27;x&#x27;");
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn no_numeric_columns_renders_without_charts() {
        let t = Table::new(vec![Column::new("k", vec![Cell::Text("x".into())])]);
        let html = render(&SummaryBundle::compute(&t), &[]).unwrap();
        assert!(html.contains("<p>No data</p>"));
        assert!(html.contains("<p>No numeric columns</p>"));
        assert!(!html.contains("<img"));
    }
}
