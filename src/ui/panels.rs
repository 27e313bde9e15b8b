use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use rusty_tabula::data::clean::EncodingMode;

use crate::state::{AppState, Severity};

// ---------------------------------------------------------------------------
// Left side panel – cleaning options
// ---------------------------------------------------------------------------

/// Render the left options panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Cleaning");
    ui.separator();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.checkbox(&mut state.normalize, "Normalize numeric columns");

            ui.add_space(4.0);
            ui.strong("Encoding");
            egui::ComboBox::from_id_salt("encoding")
                .selected_text(state.encoding.to_string())
                .show_ui(ui, |ui: &mut Ui| {
                    for mode in EncodingMode::ALL {
                        ui.selectable_value(&mut state.encoding, mode, mode.to_string());
                    }
                });

            ui.add_space(4.0);
            ui.strong("Missing-value tokens");
            let edit = ui.add(
                egui::TextEdit::singleline(&mut state.sentinel_text)
                    .hint_text("comma separated, e.g. NA,-,null"),
            );
            if edit.changed() {
                state.apply_sentinel_text();
            }

            ui.add_space(8.0);
            let has_source = state.session.source().is_some();
            if ui
                .add_enabled(has_source, egui::Button::new("Reload and clean"))
                .on_hover_text("Reload the current file with these options")
                .clicked()
            {
                state.reload();
            }

            ui.separator();
            dataset_overview(ui, state);
        });
}

fn dataset_overview(ui: &mut Ui, state: &AppState) {
    let Some(source) = state.session.source() else {
        ui.label("No dataset loaded.");
        return;
    };
    ui.strong("Source");
    ui.label(source.display().to_string());

    if let Some(table) = state.session.table() {
        let (rows, cols) = table.shape();
        ui.label(format!("{rows} rows × {cols} columns"));
    }

    if let Some(report) = state.session.last_validation() {
        ui.label(format!("Completeness: {:.1}%", report.completeness));
        match report.separator {
            Some('\t') => ui.label("Separator: tab"),
            Some(' ') => ui.label("Separator: space"),
            Some(c) => ui.label(format!("Separator: {c}")),
            None => ui.label("Spreadsheet"),
        };
        if report.column_check_skipped {
            ui.label(RichText::new("Field-count check skipped").italics());
        }
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            let loaded = state.session.table().is_some();
            if ui.add_enabled(loaded, egui::Button::new("Save…")).clicked() {
                save_file_dialog(state);
                ui.close_menu();
            }
            ui.separator();
            if ui.add_enabled(loaded, egui::Button::new("Export HTML…")).clicked() {
                export_dialog(state, ReportKind::Html);
                ui.close_menu();
            }
            if ui.add_enabled(loaded, egui::Button::new("Export text…")).clicked() {
                export_dialog(state, ReportKind::Text);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(table) = state.session.table() {
            ui.label(format!("{} rows, {} columns", table.n_rows(), table.n_cols()));
            ui.separator();
        }

        if let Some(status) = &state.status {
            let color = match status.severity {
                Severity::Error => Color32::RED,
                Severity::Warning => Color32::YELLOW,
                Severity::Info => ui.visuals().text_color(),
            };
            ui.label(RichText::new(&status.text).color(color));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open dataset")
        .add_filter("Supported files", &["csv", "tsv", "txt", "xlsx", "xls"])
        .add_filter("CSV", &["csv"])
        .add_filter("TSV", &["tsv"])
        .add_filter("Text", &["txt"])
        .add_filter("Excel", &["xlsx", "xls"])
        .pick_file();

    if let Some(path) = file {
        state.load(&path);
    }
}

pub fn save_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Save dataset")
        .add_filter("CSV", &["csv"])
        .add_filter("Excel", &["xlsx"])
        .add_filter("Tab-delimited", &["tsv", "txt"])
        .set_file_name("cleaned.csv")
        .save_file();

    if let Some(path) = file {
        state.save(&path);
    }
}

#[derive(Clone, Copy)]
enum ReportKind {
    Html,
    Text,
}

fn export_dialog(state: &mut AppState, kind: ReportKind) {
    let dialog = rfd::FileDialog::new().set_title("Export report");
    let dialog = match kind {
        ReportKind::Html => dialog.add_filter("HTML", &["html"]).set_file_name("report.html"),
        ReportKind::Text => dialog.add_filter("Text", &["txt"]).set_file_name("report.txt"),
    };

    if let Some(path) = dialog.save_file() {
        match kind {
            ReportKind::Html => state.export_html(&path),
            ReportKind::Text => state.export_text(&path),
        }
    }
}
