use csv::{ReaderBuilder, StringRecord};

// ---------------------------------------------------------------------------
// Dialect – how a delimited text file is tokenised
// ---------------------------------------------------------------------------

/// Tokenisation settings shared by the loader and the structural validator,
/// so both see exactly the same fields for a given line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
    pub delimiter: u8,
    /// Honour `"..."` quoting.
    pub quoting: bool,
    /// Strip leading whitespace from every field.
    pub trim_leading: bool,
    /// Ignore trailing empty fields when counting a line's fields.
    pub drop_trailing_empty: bool,
}

/// One tokenised record and the 1-based physical line it starts on.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub line: u64,
    pub fields: Vec<String>,
}

impl Dialect {
    /// `.csv`: comma, quoting on, leading whitespace trimmed.
    pub fn csv() -> Self {
        Dialect {
            delimiter: b',',
            quoting: true,
            trim_leading: true,
            drop_trailing_empty: false,
        }
    }

    /// The `.csv` retry after a quoted parse failed.  A trailing run of
    /// empty fields (`1,2,`) does not count against the header width.
    pub fn csv_unquoted() -> Self {
        Dialect {
            quoting: false,
            drop_trailing_empty: true,
            ..Self::csv()
        }
    }

    /// Any other delimiter, quoting on, fields untouched.
    pub fn delimited(separator: char) -> Self {
        debug_assert!(separator.is_ascii(), "separator candidates are ASCII");
        Dialect {
            delimiter: separator as u8,
            quoting: true,
            trim_leading: false,
            drop_trailing_empty: false,
        }
    }

    pub fn separator(&self) -> char {
        self.delimiter as char
    }

    fn reader<'a>(&self, text: &'a str) -> csv::Reader<&'a [u8]> {
        ReaderBuilder::new()
            .delimiter(self.delimiter)
            .quoting(self.quoting)
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes())
    }

    /// Iterate over the non-blank records of `text`.  The header is the first
    /// item.  Lines holding nothing but whitespace are skipped.
    pub fn records<'a>(&self, text: &'a str) -> impl Iterator<Item = csv::Result<Record>> + 'a {
        let dialect = *self;
        self.reader(text)
            .into_records()
            .filter_map(move |res| match res {
                Ok(rec) if is_blank(&rec) => None,
                Ok(rec) => Some(Ok(dialect.to_record(&rec))),
                Err(e) => Some(Err(e)),
            })
    }

    /// Field count of every physical line after the header, as
    /// `(line, count)`.  Empty lines count as zero fields and whitespace-only
    /// lines as one.  A quoted record spanning several lines is reported once,
    /// on the line it starts.
    pub fn line_field_counts(&self, text: &str) -> csv::Result<Vec<(u64, usize)>> {
        let total_lines = text.lines().count() as u64;
        let mut counts = Vec::new();
        // First physical line not yet covered by a record.
        let mut next_line: Option<u64> = None;

        for rec in self.reader(text).into_records() {
            let rec = rec?;
            let start = rec.position().map_or(1, |p| p.line());
            if let Some(from) = next_line {
                // csv skips empty lines without yielding a record
                counts.extend((from..start).map(|line| (line, 0)));
                counts.push((start, self.field_count(&rec)));
            }
            let spanned: u64 = rec.iter().map(|f| f.matches('\n').count() as u64).sum();
            next_line = Some(start + spanned + 1);
        }

        if let Some(from) = next_line {
            counts.extend((from..=total_lines).map(|line| (line, 0)));
        }
        Ok(counts)
    }

    fn field_count(&self, rec: &StringRecord) -> usize {
        if !self.drop_trailing_empty {
            return rec.len();
        }
        let fields: Vec<&str> = rec.iter().collect();
        fields.iter().rposition(|f| !f.trim().is_empty()).map_or(0, |i| i + 1)
    }

    fn to_record(&self, rec: &StringRecord) -> Record {
        let fields = rec
            .iter()
            .map(|f| {
                if self.trim_leading {
                    f.trim_start().to_string()
                } else {
                    f.to_string()
                }
            })
            .collect();
        Record {
            line: rec.position().map_or(0, |p| p.line()),
            fields,
        }
    }
}

fn is_blank(rec: &StringRecord) -> bool {
    rec.iter().all(|f| f.trim().is_empty()) && rec.len() <= 1
}
