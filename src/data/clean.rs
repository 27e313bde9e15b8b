use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::CleanError;
use super::model::{unique_headers, Cell, Column, ColumnKind, Table};
use super::stats;
use crate::config::SentinelSet;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// How categorical columns are turned into numbers, if at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EncodingMode {
    #[default]
    None,
    /// One integer code per distinct value, in sorted category order.
    Ordinal,
    /// One 1/0 indicator column per distinct value.
    OneHot,
}

impl EncodingMode {
    pub const ALL: [EncodingMode; 3] = [EncodingMode::None, EncodingMode::Ordinal, EncodingMode::OneHot];
}

impl fmt::Display for EncodingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodingMode::None => write!(f, "No encoding"),
            EncodingMode::Ordinal => write!(f, "Ordinal encoding"),
            EncodingMode::OneHot => write!(f, "One-hot encoding"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CleanOptions {
    /// Standardise numeric columns to zero mean, unit variance.
    pub normalize: bool,
    pub encoding: EncodingMode,
    /// Categorical columns with more distinct values are not one-hot encoded.
    pub one_hot_max_categories: usize,
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Value written into the holes of a column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Imputed {
    Median(f64),
    Mode(Cell),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CleanReport {
    pub sentinels_replaced: usize,
    pub duplicates_removed: usize,
    pub imputed: Vec<(String, Imputed)>,
    pub normalized_columns: Vec<String>,
    pub encoded_columns: Vec<String>,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Run the cleaning pass on a copy of `table` and return the result.
///
/// Steps, in order: sentinels → missing, drop duplicate rows, impute
/// (median / mode), optional standardisation, optional encoding.  The input
/// is never touched, so a failure part-way leaves the caller's table intact.
pub fn clean(
    table: &Table,
    sentinels: &SentinelSet,
    options: &CleanOptions,
) -> Result<(Table, CleanReport), CleanError> {
    let mut staged = table.clone();
    let mut report = CleanReport {
        sentinels_replaced: replace_sentinels(&mut staged, sentinels),
        duplicates_removed: drop_duplicates(&mut staged),
        ..Default::default()
    };
    log::info!("Removed {} duplicate rows", report.duplicates_removed);

    report.imputed = impute(&mut staged)?;

    if options.normalize {
        report.normalized_columns = standardize(&mut staged);
        log::info!("Standardised {} numeric columns", report.normalized_columns.len());
    }

    report.encoded_columns = match options.encoding {
        EncodingMode::None => Vec::new(),
        EncodingMode::Ordinal => ordinal_encode(&mut staged),
        EncodingMode::OneHot => one_hot_encode(&mut staged, options.one_hot_max_categories),
    };
    if !report.encoded_columns.is_empty() {
        log::info!("Applied {} to {:?}", options.encoding, report.encoded_columns);
    }

    Ok((staged, report))
}

/// Step 1: replace sentinel tokens with `Missing`, column by column.
/// Returns the number of cells replaced.
pub fn replace_sentinels(table: &mut Table, sentinels: &SentinelSet) -> usize {
    let mut total = 0;
    for col in table.columns_mut() {
        let mut replaced = 0;
        for cell in col.cells.iter_mut() {
            if !cell.is_missing() && sentinels.matches(&cell.to_field()) {
                *cell = Cell::Missing;
                replaced += 1;
            }
        }
        if replaced > 0 {
            col.refresh_kind();
            total += replaced;
        }
    }
    total
}

/// Step 2: drop exact duplicate rows, keeping the first occurrence.
pub fn drop_duplicates(table: &mut Table) -> usize {
    let keep: Vec<bool> = {
        let mut seen: HashSet<Vec<&Cell>> = HashSet::new();
        (0..table.n_rows()).map(|i| seen.insert(table.row(i))).collect()
    };
    let removed = keep.iter().filter(|k| !**k).count();
    if removed > 0 {
        table.retain_rows(&keep);
    }
    removed
}

/// Step 3: fill remaining holes.  Numeric columns take the median of their
/// present values, everything else the most frequent value.
pub fn impute(table: &mut Table) -> Result<Vec<(String, Imputed)>, CleanError> {
    let mut done = Vec::new();
    for col in table.columns_mut() {
        if col.missing_count() == 0 {
            continue;
        }
        let fill = match col.kind {
            ColumnKind::Numeric => stats::median(&col.numeric_values()).map(Imputed::Median),
            ColumnKind::Categorical => mode(col).map(Imputed::Mode),
            ColumnKind::Empty => None,
        }
        .ok_or_else(|| CleanError::NothingToImpute {
            column: col.name.clone(),
        })?;

        let value = match &fill {
            Imputed::Median(m) => Cell::Float(*m),
            Imputed::Mode(c) => c.clone(),
        };
        for cell in col.cells.iter_mut().filter(|c| c.is_missing()) {
            *cell = value.clone();
        }
        log::info!("Filled missing values in '{}' with {:?}", col.name, fill);
        done.push((col.name.clone(), fill));
    }
    Ok(done)
}

/// Most frequent present value.  Ties go to the smallest value, which is
/// the first entry of a sorted mode list.
pub fn mode(col: &Column) -> Option<Cell> {
    let mut counts: BTreeMap<&Cell, usize> = BTreeMap::new();
    for cell in col.cells.iter().filter(|c| !c.is_missing()) {
        *counts.entry(cell).or_default() += 1;
    }
    let best = counts.values().copied().max()?;
    counts
        .into_iter()
        .find(|(_, n)| *n == best)
        .map(|(cell, _)| cell.clone())
}

/// Step 4: standardise every numeric column independently.  Population
/// standard deviation; constant columns become all zeros.
pub fn standardize(table: &mut Table) -> Vec<String> {
    let mut done = Vec::new();
    for col in table.columns_mut().iter_mut().filter(|c| c.is_numeric()) {
        let values = col.numeric_values();
        let (Some(mean), Some(sd)) = (stats::mean(&values), stats::std_dev(&values, 0)) else {
            continue;
        };
        let scale = if sd == 0.0 { 1.0 } else { sd };
        for cell in col.cells.iter_mut() {
            if let Some(v) = cell.as_f64() {
                *cell = Cell::Float((v - mean) / scale);
            }
        }
        done.push(col.name.clone());
    }
    done
}

fn categories(col: &Column) -> BTreeSet<Cell> {
    col.cells.iter().filter(|c| !c.is_missing()).cloned().collect()
}

/// Step 5a: replace each categorical column by integer codes assigned in
/// sorted category order.
pub fn ordinal_encode(table: &mut Table) -> Vec<String> {
    let mut done = Vec::new();
    for col in table.columns_mut().iter_mut().filter(|c| c.kind == ColumnKind::Categorical) {
        let codes: BTreeMap<Cell, i64> = categories(col)
            .into_iter()
            .enumerate()
            .map(|(i, c)| (c, i as i64))
            .collect();
        for cell in col.cells.iter_mut() {
            *cell = codes.get(cell).map_or(Cell::Integer(-1), |&code| Cell::Integer(code));
        }
        col.refresh_kind();
        done.push(col.name.clone());
    }
    done
}

/// Step 5b: expand categorical columns with at most `max_categories`
/// distinct values into `name_value` indicator columns holding 1/0.  The
/// source column is removed and its indicators are appended after the
/// remaining columns.  Wider columns are left as they are.
pub fn one_hot_encode(table: &mut Table, max_categories: usize) -> Vec<String> {
    let mut kept = Vec::new();
    let mut indicators = Vec::new();
    let mut done = Vec::new();

    for col in table.columns() {
        if col.kind != ColumnKind::Categorical {
            kept.push(col.clone());
            continue;
        }
        let values = categories(col);
        if values.len() > max_categories {
            log::info!(
                "Skipping one-hot for '{}': {} categories (limit {max_categories})",
                col.name,
                values.len()
            );
            kept.push(col.clone());
            continue;
        }
        for value in &values {
            let cells = col
                .cells
                .iter()
                .map(|c| Cell::Integer(i64::from(c == value)))
                .collect();
            indicators.push(Column::new(format!("{}_{}", col.name, value), cells));
        }
        done.push(col.name.clone());
    }

    if !done.is_empty() {
        kept.extend(indicators);
        // an indicator may collide with an existing column such as `a_x`
        let names = unique_headers(kept.iter().map(|c| c.name.clone()).collect());
        for (col, name) in kept.iter_mut().zip(names) {
            col.name = name;
        }
        table.set_columns(kept);
    }
    done
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num_col(name: &str, raw: &[&str]) -> Column {
        Column::new(name, raw.iter().map(|s| Cell::from_raw(s)).collect())
    }

    fn opts() -> CleanOptions {
        CleanOptions {
            one_hot_max_categories: 10,
            ..Default::default()
        }
    }

    #[test]
    fn na_is_replaced_by_median() {
        let t = Table::new(vec![
            num_col("x", &["1", "2", "NA", "4"]),
            num_col("y", &["a", "b", "c", "d"]),
        ]);
        assert_eq!(t.column("x").unwrap().kind, ColumnKind::Categorical);

        let (out, report) = clean(&t, &SentinelSet::default(), &opts()).unwrap();
        let x = out.column("x").unwrap();
        assert_eq!(x.kind, ColumnKind::Numeric);
        assert_eq!(x.cells[2], Cell::Float(2.0));
        assert_eq!(report.sentinels_replaced, 1);
        assert_eq!(report.imputed, vec![("x".to_string(), Imputed::Median(2.0))]);
    }

    #[test]
    fn categorical_holes_take_the_mode() {
        let t = Table::new(vec![
            num_col("k", &["b", "a", "b", "-", "a", "z"]),
            num_col("n", &["1", "2", "3", "4", "5", "6"]),
        ]);
        let (out, _) = clean(&t, &SentinelSet::default(), &opts()).unwrap();
        // 'a' and 'b' tie; the smaller value wins.
        assert_eq!(out.column("k").unwrap().cells[3], Cell::Text("a".into()));
    }

    #[test]
    fn duplicates_are_dropped_before_imputation() {
        let t = Table::new(vec![
            num_col("a", &["1", "1", "2", "10"]),
            num_col("b", &["x", "x", "y", ""]),
        ]);
        let (out, report) = clean(&t, &SentinelSet::default(), &opts()).unwrap();
        assert_eq!(report.duplicates_removed, 1);
        assert_eq!(out.n_rows(), 3);
        // Mode over x, y after dedup: tie, smallest is 'x'.
        assert_eq!(out.column("b").unwrap().cells[2], Cell::Text("x".into()));
    }

    #[test]
    fn all_missing_column_fails_and_leaves_input_alone() {
        let t = Table::new(vec![num_col("a", &["1", "2"]), num_col("b", &["NA", ""])]);
        let before = t.clone();
        let err = clean(&t, &SentinelSet::default(), &opts()).unwrap_err();
        assert_eq!(err, CleanError::NothingToImpute { column: "b".into() });
        assert_eq!(t, before);
    }

    #[test]
    fn standardize_gives_zero_mean_unit_variance() {
        let mut t = Table::new(vec![
            num_col("a", &["1", "2", "3", "4"]),
            num_col("c", &["5", "5", "5", "5"]),
        ]);
        standardize(&mut t);
        let a = t.column("a").unwrap().numeric_values();
        assert!(stats::mean(&a).unwrap().abs() < 1e-12);
        assert!((stats::std_dev(&a, 0).unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(t.column("c").unwrap().numeric_values(), vec![0.0; 4]);
    }

    #[test]
    fn ordinal_codes_follow_sorted_categories() {
        let mut t = Table::new(vec![num_col("c", &["red", "blue", "red", "green"])]);
        assert_eq!(ordinal_encode(&mut t), vec!["c"]);
        let c = t.column("c").unwrap();
        assert_eq!(c.kind, ColumnKind::Numeric);
        assert_eq!(c.numeric_values(), vec![2.0, 0.0, 2.0, 1.0]);
    }

    #[test]
    fn one_hot_respects_cardinality_limit() {
        let ten: Vec<String> = (0..10).map(|i| format!("v{i}")).collect();
        let eleven: Vec<String> = (0..11).map(|i| format!("w{i}")).collect();
        let ten_refs: Vec<&str> = ten.iter().chain(ten.iter().take(1)).map(String::as_str).collect();
        let eleven_refs: Vec<&str> = eleven.iter().map(String::as_str).collect();
        let mut t = Table::new(vec![
            num_col("small", &ten_refs),
            num_col("wide", &eleven_refs),
        ]);

        assert_eq!(one_hot_encode(&mut t, 10), vec!["small"]);
        assert_eq!(t.n_cols(), 1 + 10);
        assert_eq!(t.columns()[0].name, "wide");
        assert_eq!(t.column("wide").unwrap().kind, ColumnKind::Categorical);

        for row in 0..t.n_rows() {
            let sum: f64 = t
                .columns()
                .iter()
                .filter(|c| c.name.starts_with("small_"))
                .map(|c| c.cells[row].as_f64().unwrap())
                .sum();
            assert_eq!(sum, 1.0);
        }
        assert!(matches!(t.column("small_v0").unwrap().cells[0], Cell::Integer(1)));
    }

    #[test]
    fn indicator_names_never_collide_with_existing_columns() {
        let mut t = Table::new(vec![
            num_col("a", &["x", "y", "x"]),
            num_col("a_x", &["1", "2", "3"]),
        ]);
        assert_eq!(one_hot_encode(&mut t, 10), vec!["a"]);
        assert_eq!(t.column_names(), ["a_x", "a_x.1", "a_y"]);
        assert_eq!(t.column("a_x").unwrap().numeric_values(), vec![1.0, 2.0, 3.0]);
        assert_eq!(
            t.column("a_x.1").unwrap().cells,
            vec![Cell::Integer(1), Cell::Integer(0), Cell::Integer(1)]
        );
    }

    #[test]
    fn integer_and_float_spellings_are_duplicates() {
        let t = Table::new(vec![
            num_col("a", &["1", "1.0", "2", "3"]),
            num_col("b", &["x", "x", "y", "z"]),
        ]);
        let (out, report) = clean(&t, &SentinelSet::default(), &opts()).unwrap();
        assert_eq!(report.duplicates_removed, 1);
        assert_eq!(out.n_rows(), 3);
    }

    #[test]
    fn imputed_median_counts_with_the_matching_integer() {
        let t = Table::new(vec![
            num_col("x", &["1", "2", "NA", "4"]),
            num_col("y", &["a", "b", "c", "d"]),
        ]);
        let (out, _) = clean(&t, &SentinelSet::default(), &opts()).unwrap();
        let counts = crate::data::summary::value_counts(&out);
        let x = counts.iter().find(|v| v.column == "x").unwrap();
        assert_eq!(x.counts.len(), 3);
        assert_eq!(x.counts[0], (Cell::Integer(2), 2));
        assert_eq!(crate::data::summary::unique_values(&out)[0].values.len(), 3);
    }

    #[test]
    fn cleaning_a_clean_table_changes_nothing() {
        let t = Table::new(vec![
            num_col("a", &["1", "2", "3"]),
            num_col("b", &["x", "y", "z"]),
        ]);
        let (once, _) = clean(&t, &SentinelSet::default(), &opts()).unwrap();
        let (twice, report) = clean(&once, &SentinelSet::default(), &opts()).unwrap();
        assert_eq!(once, t);
        assert_eq!(twice, once);
        assert_eq!(report, CleanReport::default());
    }
}
