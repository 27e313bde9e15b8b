use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Cell – a single value in a column
// ---------------------------------------------------------------------------

/// A dynamically-typed cell.  `Missing` is the canonical "no value" marker
/// and is distinct from any literal sentinel token such as `"NA"`.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Integer(i64),
    Float(f64),
    Text(String),
    Missing,
}

// -- Manual Eq/Ord/Hash so rows can be deduplicated and values counted --
//
// Numbers compare by value regardless of representation: `Integer(2)` and
// `Float(2.0)` are the same value.  Order is Missing < numbers < text.

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Cell {}

impl PartialOrd for Cell {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Cell {
    fn cmp(&self, other: &Self) -> Ordering {
        use Cell::*;
        fn rank(c: &Cell) -> u8 {
            match c {
                Missing => 0,
                Integer(_) | Float(_) => 1,
                Text(_) => 2,
            }
        }
        match (self, other) {
            (Missing, Missing) => Ordering::Equal,
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (Integer(a), Float(b)) => (*a as f64).total_cmp(b),
            (Float(a), Integer(b)) => a.total_cmp(&(*b as f64)),
            (Text(a), Text(b)) => a.cmp(b),
            _ => rank(self).cmp(&rank(other)),
        }
    }
}

impl std::hash::Hash for Cell {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            Cell::Integer(i) => {
                1u8.hash(state);
                (*i as f64).to_bits().hash(state);
            }
            Cell::Float(f) => {
                1u8.hash(state);
                f.to_bits().hash(state);
            }
            Cell::Text(s) => {
                2u8.hash(state);
                s.hash(state);
            }
            Cell::Missing => 0u8.hash(state),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Integer(i) => write!(f, "{i}"),
            // Whole floats keep a trailing ".0" so they reload as floats.
            Cell::Float(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 => {
                write!(f, "{v:.1}")
            }
            Cell::Float(v) => write!(f, "{v}"),
            Cell::Text(s) => write!(f, "{s}"),
            Cell::Missing => write!(f, "NaN"),
        }
    }
}

impl Cell {
    /// Parse a raw field.  Blank text is `Missing`; everything else is kept as
    /// text and only promoted to a number by [`Column::refresh_kind`].
    pub fn from_raw(raw: &str) -> Cell {
        if raw.trim().is_empty() {
            Cell::Missing
        } else {
            Cell::Text(raw.to_string())
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    /// Numeric view of the cell, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Integer(i) => Some(*i as f64),
            Cell::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Text used for sentinel matching and for writing back to disk.
    /// `Missing` renders as the empty string here.
    pub fn to_field(&self) -> String {
        match self {
            Cell::Missing => String::new(),
            other => other.to_string(),
        }
    }

    fn is_numeric_like(&self) -> bool {
        match self {
            Cell::Integer(_) | Cell::Float(_) => true,
            Cell::Text(s) => parse_number(s).is_some(),
            Cell::Missing => false,
        }
    }

    fn into_numeric(self) -> Cell {
        match self {
            Cell::Text(s) => parse_number(&s).unwrap_or(Cell::Text(s)),
            other => other,
        }
    }

    fn into_text(self) -> Cell {
        match self {
            Cell::Integer(_) | Cell::Float(_) => Cell::Text(self.to_string()),
            other => other,
        }
    }
}

/// Parse a number the way a spreadsheet user would read it.  Rust's `f64`
/// parser accepts `"nan"`/`"inf"`, which must stay text here, so at least one
/// digit is required.
pub fn parse_number(s: &str) -> Option<Cell> {
    let t = s.trim();
    if !t.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    if let Ok(i) = t.parse::<i64>() {
        return Some(Cell::Integer(i));
    }
    t.parse::<f64>().ok().map(Cell::Float)
}

// ---------------------------------------------------------------------------
// Column
// ---------------------------------------------------------------------------

/// Type tag of a column, assigned at load and re-evaluated only when the
/// column's values change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Numeric,
    Categorical,
    /// No present values at all.
    Empty,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKind::Numeric => write!(f, "numeric"),
            ColumnKind::Categorical => write!(f, "categorical"),
            ColumnKind::Empty => write!(f, "empty"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
    pub cells: Vec<Cell>,
}

impl Column {
    /// Build a column and infer its kind.
    pub fn new(name: impl Into<String>, cells: Vec<Cell>) -> Self {
        let mut col = Column {
            name: name.into(),
            kind: ColumnKind::Empty,
            cells,
        };
        col.refresh_kind();
        col
    }

    /// Recompute the type tag.  A column whose present values all read as
    /// numbers becomes `Numeric` (text cells are converted); otherwise the
    /// column is `Categorical` and numbers are turned back into text so the
    /// column stays homogeneous.
    pub fn refresh_kind(&mut self) {
        let mut present = self.cells.iter().filter(|c| !c.is_missing()).peekable();
        if present.peek().is_none() {
            self.kind = ColumnKind::Empty;
            return;
        }
        let numeric = present.all(Cell::is_numeric_like);
        let cells = std::mem::take(&mut self.cells);
        if numeric {
            self.cells = cells.into_iter().map(Cell::into_numeric).collect();
            self.kind = ColumnKind::Numeric;
        } else {
            self.cells = cells.into_iter().map(Cell::into_text).collect();
            self.kind = ColumnKind::Categorical;
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn is_numeric(&self) -> bool {
        self.kind == ColumnKind::Numeric
    }

    pub fn missing_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_missing()).count()
    }

    /// Present numeric values, in row order.
    pub fn numeric_values(&self) -> Vec<f64> {
        self.cells.iter().filter_map(Cell::as_f64).collect()
    }

    /// Numeric view aligned with the rows (`None` for missing cells).
    pub fn numeric_view(&self) -> Vec<Option<f64>> {
        self.cells.iter().map(Cell::as_f64).collect()
    }
}

// ---------------------------------------------------------------------------
// Table – the complete loaded dataset
// ---------------------------------------------------------------------------

/// Ordered named columns.  Every column holds the same number of cells.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    /// Wrap already-built columns.  Panics if their lengths disagree; callers
    /// inside this crate always build rectangular grids.
    pub fn new(columns: Vec<Column>) -> Self {
        if let Some(first) = columns.first() {
            assert!(
                columns.iter().all(|c| c.len() == first.len()),
                "all columns must have the same length"
            );
        }
        Table { columns }
    }

    /// Build a table from a header and raw text rows.  Short rows are padded
    /// with `Missing` and long rows truncated, so the grid is always
    /// rectangular; structural problems are reported by the validator, not
    /// here.
    pub fn from_raw_rows(headers: Vec<String>, rows: &[Vec<String>]) -> Self {
        let names = unique_headers(headers);
        let columns = names
            .into_iter()
            .enumerate()
            .map(|(idx, name)| {
                let cells = rows
                    .iter()
                    .map(|row| row.get(idx).map_or(Cell::Missing, |raw| Cell::from_raw(raw)))
                    .collect();
                Column::new(name, cells)
            })
            .collect();
        Table { columns }
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// `(rows, columns)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows(), self.n_cols())
    }

    /// Total number of cells (rows × columns).
    pub fn size(&self) -> usize {
        self.n_rows() * self.n_cols()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn columns_mut(&mut self) -> &mut [Column] {
        &mut self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn numeric_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.is_numeric())
    }

    /// Borrow one row across all columns.
    pub fn row(&self, idx: usize) -> Vec<&Cell> {
        self.columns.iter().map(|c| &c.cells[idx]).collect()
    }

    /// Keep only the rows whose flag is `true`.
    pub fn retain_rows(&mut self, keep: &[bool]) {
        for col in &mut self.columns {
            let mut flags = keep.iter();
            col.cells.retain(|_| *flags.next().unwrap_or(&true));
        }
    }

    /// Replace the column list wholesale (used by one-hot expansion).
    pub fn set_columns(&mut self, columns: Vec<Column>) {
        *self = Table::new(columns);
    }
}

/// Trim header names and make duplicates unique by suffixing `.1`, `.2`, …
/// Blank names are left blank so pre-use validation can reject them.
pub fn unique_headers(raw: Vec<String>) -> Vec<String> {
    let mut existing: HashSet<String> = HashSet::new();
    raw.into_iter()
        .map(|name| {
            let base = name.trim().to_string();
            if base.is_empty() {
                return base;
            }
            let mut candidate = base.clone();
            let mut counter = 1;
            while !existing.insert(candidate.clone()) {
                candidate = format!("{base}.{counter}");
                counter += 1;
            }
            candidate
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|r| r.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    #[test]
    fn numeric_column_is_promoted() {
        let t = Table::from_raw_rows(
            vec!["a".into(), "b".into()],
            &raw(&[&["1", "x"], &["2.5", "y"], &["", "z"]]),
        );
        let a = t.column("a").unwrap();
        assert_eq!(a.kind, ColumnKind::Numeric);
        assert_eq!(a.cells, vec![Cell::Integer(1), Cell::Float(2.5), Cell::Missing]);
        assert_eq!(t.column("b").unwrap().kind, ColumnKind::Categorical);
    }

    #[test]
    fn nan_text_is_not_numeric() {
        let col = Column::new("c", vec![Cell::Text("1".into()), Cell::Text("nan".into())]);
        assert_eq!(col.kind, ColumnKind::Categorical);
        assert_eq!(col.cells[0], Cell::Text("1".into()));
    }

    #[test]
    fn short_rows_are_padded_long_rows_truncated() {
        let t = Table::from_raw_rows(
            vec!["a".into(), "b".into()],
            &raw(&[&["1"], &["1", "2", "3"]]),
        );
        assert_eq!(t.shape(), (2, 2));
        assert!(t.column("b").unwrap().cells[0].is_missing());
    }

    #[test]
    fn duplicate_headers_get_suffixes() {
        let names = unique_headers(vec!["a".into(), " a ".into(), "a".into(), "".into()]);
        assert_eq!(names, vec!["a", "a.1", "a.2", ""]);
    }

    #[test]
    fn whole_floats_display_with_fraction() {
        assert_eq!(Cell::Float(2.0).to_string(), "2.0");
        assert_eq!(Cell::Float(0.25).to_string(), "0.25");
        assert_eq!(Cell::Missing.to_field(), "");
    }

    #[test]
    fn integer_and_whole_float_are_one_value() {
        use std::collections::HashSet;
        assert_eq!(Cell::Integer(2), Cell::Float(2.0));
        assert!(Cell::Integer(2) < Cell::Float(2.5));
        assert!(Cell::Float(1.5) < Cell::Integer(2));
        assert!(Cell::Missing < Cell::Integer(-5));
        assert!(Cell::Float(1e9) < Cell::Text("0".into()));

        let set: HashSet<Cell> = [Cell::Integer(2), Cell::Float(2.0), Cell::Float(2.5)].into();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn retain_rows_drops_flagged() {
        let mut t = Table::from_raw_rows(vec!["a".into()], &raw(&[&["1"], &["2"], &["3"]]));
        t.retain_rows(&[true, false, true]);
        assert_eq!(t.column("a").unwrap().numeric_values(), vec![1.0, 3.0]);
    }
}
