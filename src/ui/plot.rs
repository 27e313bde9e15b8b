use eframe::egui::{self, Align2, Color32, FontId, RichText, ScrollArea, Sense, Ui};
use egui_extras::{Column, TableBuilder};
use egui_plot::{Bar, BarChart, BoxElem, BoxPlot, BoxSpread, Plot};
use rusty_tabula::color;
use rusty_tabula::data::model::Table;
use rusty_tabula::data::stats;
use rusty_tabula::data::summary::{fmt_num, CorrelationMatrix, SummaryBundle, DESCRIBE_STATS};
use rusty_tabula::report::numeric_series;

use crate::state::{AppState, Tab};

const TOP_PAIRS: usize = 5;

// ---------------------------------------------------------------------------
// Central panel
// ---------------------------------------------------------------------------

/// Tab strip plus the selected view of the current table.
pub fn central_panel(ui: &mut Ui, state: &mut AppState) {
    let (Some(table), Some(summary)) = (state.session.table(), state.summary.as_ref()) else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a file to get started  (File → Open…)");
        });
        return;
    };

    let mut tab = state.tab;
    ui.horizontal(|ui: &mut Ui| {
        for t in Tab::ALL {
            ui.selectable_value(&mut tab, t, t.label());
        }
    });
    ui.separator();

    match tab {
        Tab::Data => data_table(ui, table),
        Tab::Info => {
            ScrollArea::vertical().show(ui, |ui: &mut Ui| {
                ui.monospace(summary.info.to_string());
            });
        }
        Tab::Describe => describe_grid(ui, summary),
        Tab::Correlations => correlations(ui, summary),
        Tab::UniqueValues => unique_values(ui, summary),
        Tab::ValueCounts => value_counts(ui, summary),
        Tab::Graphs => graphs(ui, table, state.session.config().histogram_bins),
    }

    state.tab = tab;
}

// ---------------------------------------------------------------------------
// Data table
// ---------------------------------------------------------------------------

fn data_table(ui: &mut Ui, table: &Table) {
    let names = table.column_names();
    ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .column(Column::auto())
            .columns(Column::auto().at_least(60.0).resizable(true), names.len())
            .header(20.0, |mut header| {
                header.col(|ui| {
                    ui.strong("#");
                });
                for name in &names {
                    header.col(|ui| {
                        ui.strong(*name);
                    });
                }
            })
            .body(|body| {
                body.rows(18.0, table.n_rows(), |mut row| {
                    let i = row.index();
                    row.col(|ui| {
                        ui.label(RichText::new(i.to_string()).weak());
                    });
                    for cell in table.row(i) {
                        row.col(|ui| {
                            if cell.is_missing() {
                                ui.label(RichText::new("NaN").weak());
                            } else {
                                ui.label(cell.to_string());
                            }
                        });
                    }
                });
            });
    });
}

// ---------------------------------------------------------------------------
// Summary tabs
// ---------------------------------------------------------------------------

fn describe_grid(ui: &mut Ui, summary: &SummaryBundle) {
    let columns = &summary.describe.columns;
    if columns.is_empty() {
        ui.label("No numeric columns.");
        return;
    }
    ScrollArea::both().show(ui, |ui: &mut Ui| {
        egui::Grid::new("describe").striped(true).show(ui, |ui: &mut Ui| {
            ui.label("");
            for c in columns {
                ui.strong(&c.name);
            }
            ui.end_row();
            for (i, stat) in DESCRIBE_STATS.iter().enumerate() {
                ui.strong(*stat);
                for c in columns {
                    ui.monospace(fmt_num(c.values[i]));
                }
                ui.end_row();
            }
        });
    });
}

fn correlations(ui: &mut Ui, summary: &SummaryBundle) {
    let (Some(pearson), Some(spearman)) = (&summary.pearson, &summary.spearman) else {
        ui.label("No numeric columns.");
        return;
    };
    ScrollArea::vertical().show(ui, |ui: &mut Ui| {
        for (title, matrix) in [("Pearson", pearson), ("Spearman", spearman)] {
            ui.heading(title);
            heatmap(ui, matrix);
            ui.add_space(4.0);
            ui.strong(format!("Top {TOP_PAIRS} correlated pairs"));
            for (a, b, r) in matrix.top_pairs(TOP_PAIRS) {
                ui.monospace(format!("{a} – {b}: {r:.4}"));
            }
            ui.separator();
        }
    });
}

/// Square colour grid with the coefficient printed in each cell.
fn heatmap(ui: &mut Ui, matrix: &CorrelationMatrix) {
    const CELL: f32 = 56.0;
    egui::Grid::new(("heatmap", matrix.method as u8))
        .spacing([2.0, 2.0])
        .show(ui, |ui: &mut Ui| {
            ui.label("");
            for name in &matrix.columns {
                ui.label(RichText::new(name).small());
            }
            ui.end_row();

            for (name, row) in matrix.columns.iter().zip(&matrix.values) {
                ui.label(RichText::new(name).small());
                for v in row {
                    let (rect, response) = ui.allocate_exact_size(egui::vec2(CELL, CELL * 0.6), Sense::hover());
                    let [r, g, b] = color::diverging(*v);
                    let [tr, tg, tb] = color::contrast_text([r, g, b]);
                    let painter = ui.painter();
                    painter.rect_filled(rect, 2.0, Color32::from_rgb(r, g, b));
                    painter.text(
                        rect.center(),
                        Align2::CENTER_CENTER,
                        format!("{v:.2}"),
                        FontId::monospace(11.0),
                        Color32::from_rgb(tr, tg, tb),
                    );
                    response.on_hover_text(fmt_num(*v));
                }
                ui.end_row();
            }
        });
}

fn unique_values(ui: &mut Ui, summary: &SummaryBundle) {
    ScrollArea::vertical().show(ui, |ui: &mut Ui| {
        for u in &summary.unique_values {
            egui::CollapsingHeader::new(RichText::new(format!("{}  ({} unique)", u.column, u.values.len())).strong())
                .id_salt(("unique", &u.column))
                .show(ui, |ui: &mut Ui| {
                    for v in &u.values {
                        ui.monospace(v.to_string());
                    }
                });
        }
    });
}

fn value_counts(ui: &mut Ui, summary: &SummaryBundle) {
    ScrollArea::vertical().show(ui, |ui: &mut Ui| {
        for vc in &summary.value_counts {
            egui::CollapsingHeader::new(RichText::new(&vc.column).strong())
                .id_salt(("counts", &vc.column))
                .show(ui, |ui: &mut Ui| {
                    egui::Grid::new(("counts_grid", &vc.column)).striped(true).show(ui, |ui: &mut Ui| {
                        for (v, n) in &vc.counts {
                            ui.monospace(v.to_string());
                            ui.monospace(n.to_string());
                            ui.end_row();
                        }
                    });
                });
        }
    });
}

// ---------------------------------------------------------------------------
// Graphs
// ---------------------------------------------------------------------------

/// Histogram and box plot for each numeric column.
fn graphs(ui: &mut Ui, table: &Table, bins: usize) {
    let series = numeric_series(table);
    if series.is_empty() {
        ui.label("No numeric columns.");
        return;
    }
    let palette = color::generate_palette(series.len());

    ScrollArea::vertical().show(ui, |ui: &mut Ui| {
        for (i, ((name, values), [r, g, b])) in series.iter().zip(palette).enumerate() {
            let fill = Color32::from_rgb(r, g, b);
            ui.heading(name);
            ui.horizontal(|ui: &mut Ui| {
                let bars: Vec<Bar> = stats::histogram(values, bins)
                    .into_iter()
                    .map(|(lo, hi, n)| Bar::new((lo + hi) / 2.0, n as f64).width(hi - lo))
                    .collect();
                Plot::new(("hist", i))
                    .width(ui.available_width() * 0.65)
                    .height(220.0)
                    .x_axis_label(name.as_str())
                    .y_axis_label("Count")
                    .allow_scroll(false)
                    .show(ui, |plot_ui| {
                        plot_ui.bar_chart(BarChart::new(bars).color(fill).name(name.as_str()));
                    });

                if let Some(b) = stats::box_stats(values) {
                    let elem = BoxElem::new(
                        0.0,
                        BoxSpread::new(b.lower_whisker, b.q1, b.median, b.q3, b.upper_whisker),
                    )
                    .fill(fill.linear_multiply(0.4))
                    .stroke(egui::Stroke::new(1.5, fill));
                    Plot::new(("box", i))
                        .height(220.0)
                        .show_x(false)
                        .allow_scroll(false)
                        .show(ui, |plot_ui| {
                            plot_ui.box_plot(BoxPlot::new(vec![elem]).name(name.as_str()));
                        });
                }
            });
            ui.separator();
        }
    });
}
