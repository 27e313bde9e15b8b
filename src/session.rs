use std::path::{Path, PathBuf};

use crate::config::{PipelineConfig, SentinelSet};
use crate::data::clean::{self, CleanOptions, CleanReport, EncodingMode};
use crate::data::error::{PipelineError, Result};
use crate::data::loader;
use crate::data::model::Table;
use crate::data::summary::{self, CorrelationMatrix, DatasetInfo, Describe, SummaryBundle, UniqueValues, ValueCounts};
use crate::data::validate::{self, ValidationReport};
use crate::data::writer;
use crate::report;

// ---------------------------------------------------------------------------
// Session – explicit owner of the live table
// ---------------------------------------------------------------------------

/// Holds the one live table and the configuration (including the sentinel
/// set) every pipeline call works against.  Callers serialise their calls;
/// there is no internal locking.
#[derive(Debug, Default)]
pub struct Session {
    config: PipelineConfig,
    table: Option<Table>,
    source: Option<PathBuf>,
    last_validation: Option<ValidationReport>,
}

impl Session {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn sentinels(&self) -> &SentinelSet {
        &self.config.sentinels
    }

    /// Replace the sentinel set.  Applies to later loads and cleans only.
    pub fn set_sentinels(&mut self, sentinels: SentinelSet) {
        log::info!("Missing-value sentinels updated: {:?}", sentinels.tokens());
        self.config.sentinels = sentinels;
    }

    pub fn table(&self) -> Option<&Table> {
        self.table.as_ref()
    }

    /// Path of the file the live table came from.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn last_validation(&self) -> Option<&ValidationReport> {
        self.last_validation.as_ref()
    }

    fn require_table(&self) -> Result<&Table> {
        self.table.as_ref().ok_or(PipelineError::NoDataLoaded)
    }

    // -- Loading ----------------------------------------------------------

    /// Load and validate `path`.  On success the new table replaces the old
    /// one; on any failure the previous table is kept as it was.
    pub fn load(&mut self, path: &Path) -> Result<&ValidationReport> {
        let loaded = loader::load_file(path, &self.config)?;
        self.table = Some(loaded.table);
        self.source = Some(path.to_path_buf());
        Ok(self.last_validation.insert(loaded.report))
    }

    // -- Cleaning ---------------------------------------------------------

    /// Run pre-use validation, then the cleaning pass.  The cleaned table is
    /// swapped in only if every step succeeds.
    pub fn clean(&mut self, normalize: bool, encoding: EncodingMode) -> Result<CleanReport> {
        let table = self.require_table()?;
        validate::validate_shape(table)?;

        let options = CleanOptions {
            normalize,
            encoding,
            one_hot_max_categories: self.config.one_hot_max_categories,
        };
        let (cleaned, report) = clean::clean(table, &self.config.sentinels, &options)?;
        self.table = Some(cleaned);
        Ok(report)
    }

    // -- Summaries --------------------------------------------------------

    pub fn info(&self) -> Result<DatasetInfo> {
        Ok(summary::info(self.require_table()?))
    }

    pub fn describe(&self) -> Result<Describe> {
        Ok(summary::describe(self.require_table()?))
    }

    /// Pearson and Spearman matrices; `Ok(None)` when no column is numeric.
    pub fn correlations(&self) -> Result<Option<(CorrelationMatrix, CorrelationMatrix)>> {
        Ok(summary::correlations(self.require_table()?))
    }

    pub fn unique_values(&self) -> Result<Vec<UniqueValues>> {
        Ok(summary::unique_values(self.require_table()?))
    }

    pub fn value_counts(&self) -> Result<Vec<ValueCounts>> {
        Ok(summary::value_counts(self.require_table()?))
    }

    pub fn summary(&self) -> Result<SummaryBundle> {
        Ok(SummaryBundle::compute(self.require_table()?))
    }

    // -- Output -----------------------------------------------------------

    pub fn save(&self, path: &Path) -> Result<()> {
        writer::save_table(self.require_table()?, path)
    }

    pub fn export_html(&self, path: &Path) -> Result<()> {
        let table = self.require_table()?;
        report::export_html(table, &self.config, path).map_err(PipelineError::Export)
    }

    pub fn export_text(&self, path: &Path) -> Result<()> {
        let table = self.require_table()?;
        report::export_text(table, path).map_err(PipelineError::Export)
    }
}
