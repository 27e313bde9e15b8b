use std::path::Path;

use rusty_tabula::config::{PipelineConfig, SentinelSet};
use rusty_tabula::data::clean::EncodingMode;
use rusty_tabula::data::error::PipelineError;
use rusty_tabula::data::summary::SummaryBundle;
use rusty_tabula::Session;

// ---------------------------------------------------------------------------
// Status sink
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Status {
    pub severity: Severity,
    pub text: String,
}

/// Central-panel tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Data,
    Info,
    Describe,
    Correlations,
    UniqueValues,
    ValueCounts,
    Graphs,
}

impl Tab {
    pub const ALL: [Tab; 7] = [
        Tab::Data,
        Tab::Info,
        Tab::Describe,
        Tab::Correlations,
        Tab::UniqueValues,
        Tab::ValueCounts,
        Tab::Graphs,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Tab::Data => "Data",
            Tab::Info => "Info",
            Tab::Describe => "Describe",
            Tab::Correlations => "Correlations",
            Tab::UniqueValues => "Unique values",
            Tab::ValueCounts => "Value counts",
            Tab::Graphs => "Graphs",
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Owns the live table; every pipeline call goes through it.
    pub session: Session,

    /// Last message shown in the top bar.
    pub status: Option<Status>,

    /// Cleaning options applied after each load.
    pub normalize: bool,
    pub encoding: EncodingMode,

    /// Sentinel tokens as typed, comma separated.
    pub sentinel_text: String,

    /// Summaries of the current table.  Rebuilt whenever the table changes.
    pub summary: Option<SummaryBundle>,

    pub tab: Tab,
}

impl AppState {
    pub fn new(config: PipelineConfig) -> Self {
        let sentinel_text = config.sentinels.to_text();
        Self {
            session: Session::new(config),
            status: None,
            normalize: false,
            encoding: EncodingMode::None,
            sentinel_text,
            summary: None,
            tab: Tab::default(),
        }
    }

    fn set_status(&mut self, severity: Severity, text: impl Into<String>) {
        self.status = Some(Status {
            severity,
            text: text.into(),
        });
    }

    fn report_error(&mut self, context: &str, err: &PipelineError) {
        log::error!("{context}: {err}");
        self.set_status(Severity::Error, format!("{context}: {err}"));
    }

    /// Re-parse the sentinel field.  Called on every edit.
    pub fn apply_sentinel_text(&mut self) {
        self.session.set_sentinels(SentinelSet::parse(&self.sentinel_text));
    }

    /// Load `path`, then clean it with the current options and refresh the
    /// summaries.  A rejected file leaves the previous table on screen.
    pub fn load(&mut self, path: &Path) {
        let loaded = self.session.load(path).map(|report| report.used_unquoted_fallback);
        let fallback = match loaded {
            Ok(fallback) => fallback,
            Err(e) => {
                self.report_error("Load failed", &e);
                return;
            }
        };

        if let Err(e) = self.session.clean(self.normalize, self.encoding) {
            self.report_error("Cleaning failed", &e);
            self.refresh_summary();
            return;
        }
        self.refresh_summary();

        let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        if fallback {
            self.set_status(Severity::Warning, format!("Loaded {name} with quoting disabled"));
        } else {
            self.set_status(Severity::Info, format!("Loaded {name}"));
        }
    }

    /// Reload the current source with the current options.
    pub fn reload(&mut self) {
        if let Some(path) = self.session.source().map(Path::to_path_buf) {
            self.load(&path);
        }
    }

    pub fn refresh_summary(&mut self) {
        self.summary = self.session.summary().ok();
    }

    pub fn save(&mut self, path: &Path) {
        match self.session.save(path) {
            Ok(()) => self.set_status(Severity::Info, format!("Saved to {}", path.display())),
            Err(e) => self.report_error("Save failed", &e),
        }
    }

    pub fn export_html(&mut self, path: &Path) {
        match self.session.export_html(path) {
            Ok(()) => self.set_status(Severity::Info, format!("HTML report written to {}", path.display())),
            Err(e) => self.report_error("Export failed", &e),
        }
    }

    pub fn export_text(&mut self, path: &Path) {
        match self.session.export_text(path) {
            Ok(()) => self.set_status(Severity::Info, format!("Text report written to {}", path.display())),
            Err(e) => self.report_error("Export failed", &e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_cleans_and_summarises() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("d.csv");
        std::fs::write(&path, "a,b\n1,x\nNA,y\n3,x\n").unwrap();

        let mut state = AppState::new(PipelineConfig::default());
        state.load(&path);

        let status = state.status.as_ref().unwrap();
        assert_eq!(status.severity, Severity::Info);
        let summary = state.summary.as_ref().unwrap();
        assert_eq!(summary.info.rows, 3);
        assert_eq!(state.session.table().unwrap().column("a").unwrap().missing_count(), 0);
    }

    #[test]
    fn failed_load_keeps_previous_summary() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.csv");
        std::fs::write(&good, "a,b\n1,2\n3,4\n").unwrap();

        let mut state = AppState::new(PipelineConfig::default());
        state.load(&good);
        state.load(&dir.path().join("missing.csv"));

        assert_eq!(state.status.as_ref().unwrap().severity, Severity::Error);
        assert_eq!(state.summary.as_ref().unwrap().info.rows, 2);
    }

    #[test]
    fn sentinel_field_is_reparsed() {
        let mut state = AppState::new(PipelineConfig::default());
        state.sentinel_text = "?, missing ,".to_string();
        state.apply_sentinel_text();
        assert_eq!(state.session.sentinels().tokens(), ["?", "missing"]);
    }
}
