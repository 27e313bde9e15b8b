/// Data layer: table model, loading, validation, cleaning and summaries.
///
/// Architecture:
/// ```text
///  .csv / .tsv / .txt / .xlsx / .xls
///        │
///        ▼
///   ┌──────────┐   sniff + dialect: separator, quoting, trimming
///   │  loader   │  parse file → Table
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ validate  │  completeness, per-row field counts
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  clean    │  sentinels → dedup → impute → scale → encode
///   └──────────┘
///        │
///        ├──► summary  info, describe, correlations, counts
///        └──► writer   .csv / .xlsx / tab-delimited
/// ```

pub mod clean;
pub mod dialect;
pub mod error;
pub mod loader;
pub mod model;
pub mod sniff;
pub mod stats;
pub mod summary;
pub mod validate;
pub mod writer;
