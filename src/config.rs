use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable naming an optional JSON config file.
pub const CONFIG_ENV: &str = "RUSTY_TABULA_CONFIG";

/// Tokens treated as "no value" out of the box.
pub const DEFAULT_SENTINELS: &[&str] = &["", " ", "-", "NA", "N/A", "null", "NULL", "NaN", "nan"];

// ---------------------------------------------------------------------------
// Missing-value sentinels
// ---------------------------------------------------------------------------

/// User-editable set of literal tokens that count as missing.  Cells are
/// compared after trimming, so `" "` and `""` behave the same.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SentinelSet {
    tokens: Vec<String>,
}

impl Default for SentinelSet {
    fn default() -> Self {
        Self {
            tokens: DEFAULT_SENTINELS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl SentinelSet {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse the comma-separated text typed in the UI.  Tokens are trimmed
    /// and empty ones dropped.
    pub fn parse(text: &str) -> Self {
        Self::new(
            text.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty()),
        )
    }

    /// Does this raw cell text count as missing?  Blank text always does.
    pub fn matches(&self, value: &str) -> bool {
        let v = value.trim();
        v.is_empty() || self.tokens.iter().any(|t| t.trim() == v)
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Render back to the comma-separated form shown in the UI.
    pub fn to_text(&self) -> String {
        self.tokens.join(",")
    }
}

// ---------------------------------------------------------------------------
// Pipeline configuration
// ---------------------------------------------------------------------------

fn default_completeness_threshold() -> f64 {
    50.0
}

fn default_one_hot_max_categories() -> usize {
    10
}

fn default_histogram_bins() -> usize {
    20
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub sentinels: SentinelSet,
    /// Minimum fill ratio, in percent, for a load to be accepted.
    #[serde(default = "default_completeness_threshold")]
    pub completeness_threshold: f64,
    /// Categorical columns with more distinct values are not one-hot encoded.
    #[serde(default = "default_one_hot_max_categories")]
    pub one_hot_max_categories: usize,
    #[serde(default = "default_histogram_bins")]
    pub histogram_bins: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sentinels: SentinelSet::default(),
            completeness_threshold: default_completeness_threshold(),
            one_hot_max_categories: default_one_hot_max_categories(),
            histogram_bins: default_histogram_bins(),
        }
    }
}

impl PipelineConfig {
    /// Read a JSON config file; absent keys fall back to defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Config from `$RUSTY_TABULA_CONFIG` when set, defaults otherwise.
    pub fn load() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => {
                let cfg = Self::from_file(Path::new(&path))?;
                log::info!("Loaded configuration from {}", Path::new(&path).display());
                Ok(cfg)
            }
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_trims_and_drops_empty_tokens() {
        let set = SentinelSet::parse(" NA , ,null,, -");
        assert_eq!(set.tokens(), &["NA", "null", "-"]);
    }

    #[test]
    fn matching_is_on_trimmed_text() {
        let set = SentinelSet::parse("NA");
        assert!(set.matches("  NA "));
        assert!(set.matches("   "));
        assert!(!set.matches("na"));
    }

    #[test]
    fn partial_config_uses_defaults() {
        let cfg: PipelineConfig = serde_json::from_str(r#"{"one_hot_max_categories": 4}"#).unwrap();
        assert_eq!(cfg.one_hot_max_categories, 4);
        assert_eq!(cfg.completeness_threshold, 50.0);
        assert_eq!(cfg.sentinels, SentinelSet::default());
    }

    #[test]
    fn config_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        std::fs::write(&path, r#"{"sentinels": ["?", "missing"], "histogram_bins": 8}"#).unwrap();
        let cfg = PipelineConfig::from_file(&path).unwrap();
        assert!(cfg.sentinels.matches("missing"));
        assert!(!cfg.sentinels.matches("NA"));
        assert_eq!(cfg.histogram_bins, 8);
    }
}
