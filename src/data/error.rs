use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong between picking a file and handing a cleaned
/// table to a consumer.  Each variant carries enough context (path, rows) for
/// a human-readable message.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("cannot read {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not determine the field separator of {}", path.display())]
    SeparatorNotDetected { path: PathBuf },

    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("too many empty values: only {ratio:.2}% of cells are filled (need {threshold:.0}%)")]
    Completeness { ratio: f64, threshold: f64 },

    #[error(
        "{} contains rows with the wrong number of columns (expected {expected}): {rows:?}",
        path.display()
    )]
    StructuralMismatch {
        path: PathBuf,
        expected: usize,
        /// 1-based physical line numbers, header is line 1.
        rows: Vec<usize>,
    },

    #[error("dataset is empty")]
    EmptyDataset,

    #[error("too few columns: found {found}, need at least 2")]
    InsufficientColumns { found: usize },

    #[error("too few rows: found {found}, need at least 2")]
    InsufficientRows { found: usize },

    #[error("column {index} has a blank header")]
    BlankHeader { index: usize },

    #[error("no data loaded")]
    NoDataLoaded,

    #[error("cleaning failed: {0}")]
    Clean(#[from] CleanError),

    #[error("failed to write {}: {message}", path.display())]
    Write { path: PathBuf, message: String },

    #[error("report export failed: {0:#}")]
    Export(#[source] anyhow::Error),
}

/// Failures of the clean/transform pass.
#[derive(Debug, Error, PartialEq)]
pub enum CleanError {
    #[error("column '{column}' has no values to impute from")]
    NothingToImpute { column: String },
}

pub type Result<T> = std::result::Result<T, PipelineError>;
