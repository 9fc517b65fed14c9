//! In-memory tabular dataset with dataframe-style physical storage.
//!
//! A [`Dataset`] is an ordered set of equally long [`Column`]s. Each column
//! stores its cells in one of four physical representations
//! ([`ColumnValues`]); `None` marks a missing cell. Raw text handed to
//! [`Dataset::from_records`] is classified the way a CSV dataframe reader
//! assigns dtypes: all-numeric columns become numbers, strict `true`/`false`
//! columns without gaps become booleans, everything else stays text.

use std::{
    borrow::Cow,
    collections::{HashMap, HashSet},
};

use anyhow::{Result, ensure};
use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Tokens read as missing values.
const NULL_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

const TRUE_TOKENS: &[&str] = &["True", "TRUE", "true"];
const FALSE_TOKENS: &[&str] = &["False", "FALSE", "false"];

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    Number(Vec<Option<f64>>),
    Boolean(Vec<Option<bool>>),
    DateTime(Vec<Option<NaiveDateTime>>),
    Text(Vec<Option<String>>),
}

impl ColumnValues {
    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Number(v) => v.len(),
            ColumnValues::Boolean(v) => v.len(),
            ColumnValues::DateTime(v) => v.len(),
            ColumnValues::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_null(&self, row: usize) -> bool {
        match self {
            ColumnValues::Number(v) => v.get(row).is_none_or(|cell| cell.is_none()),
            ColumnValues::Boolean(v) => v.get(row).is_none_or(|cell| cell.is_none()),
            ColumnValues::DateTime(v) => v.get(row).is_none_or(|cell| cell.is_none()),
            ColumnValues::Text(v) => v.get(row).is_none_or(|cell| cell.is_none()),
        }
    }

    fn select(&self, rows: &[usize]) -> ColumnValues {
        fn pick<T: Clone>(values: &[Option<T>], rows: &[usize]) -> Vec<Option<T>> {
            rows.iter()
                .map(|&row| values.get(row).cloned().flatten())
                .collect()
        }
        match self {
            ColumnValues::Number(v) => ColumnValues::Number(pick(v, rows)),
            ColumnValues::Boolean(v) => ColumnValues::Boolean(pick(v, rows)),
            ColumnValues::DateTime(v) => ColumnValues::DateTime(pick(v, rows)),
            ColumnValues::Text(v) => ColumnValues::Text(pick(v, rows)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    values: ColumnValues,
}

impl Column {
    pub fn new(name: impl Into<String>, values: ColumnValues) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Builds a column from raw text cells, applying null tokens and dtype detection.
    pub fn from_raw<S: AsRef<str>>(name: impl Into<String>, cells: &[S]) -> Self {
        let cells = cells
            .iter()
            .map(|cell| normalize_cell(cell.as_ref()))
            .collect::<Vec<_>>();
        Self::new(name, classify_cells(cells))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &ColumnValues {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.values, ColumnValues::Number(_))
    }

    /// True for free-form object storage (text, or booleans with gaps).
    pub fn is_text(&self) -> bool {
        matches!(self.values, ColumnValues::Text(_))
    }

    pub fn is_null(&self, row: usize) -> bool {
        self.values.is_null(row)
    }

    pub fn null_count(&self) -> usize {
        (0..self.len()).filter(|&row| self.is_null(row)).count()
    }

    /// Fraction of missing cells; 0 for an empty column.
    pub fn null_ratio(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.null_count() as f64 / self.len() as f64
        }
    }

    /// Canonical text form of a cell, `None` when missing.
    pub fn cell_key(&self, row: usize) -> Option<Cow<'_, str>> {
        match &self.values {
            ColumnValues::Number(v) => v
                .get(row)
                .copied()
                .flatten()
                .map(|n| Cow::Owned(format_number(n))),
            ColumnValues::Boolean(v) => v
                .get(row)
                .copied()
                .flatten()
                .map(|b| Cow::Borrowed(if b { "true" } else { "false" })),
            ColumnValues::DateTime(v) => v
                .get(row)
                .copied()
                .flatten()
                .map(|dt| Cow::Owned(dt.format("%Y-%m-%d %H:%M:%S").to_string())),
            ColumnValues::Text(v) => v
                .get(row)
                .and_then(|cell| cell.as_deref())
                .map(Cow::Borrowed),
        }
    }

    /// Number of distinct non-missing values.
    pub fn distinct_count(&self) -> usize {
        match &self.values {
            ColumnValues::Number(v) => v
                .iter()
                .flatten()
                .map(|n| canonical_bits(*n))
                .collect::<HashSet<_>>()
                .len(),
            ColumnValues::Boolean(v) => v.iter().flatten().collect::<HashSet<_>>().len(),
            ColumnValues::DateTime(v) => v.iter().flatten().collect::<HashSet<_>>().len(),
            ColumnValues::Text(v) => v
                .iter()
                .flatten()
                .map(String::as_str)
                .collect::<HashSet<_>>()
                .len(),
        }
    }

    /// Frequency table over non-missing values, most frequent first.
    /// Equal counts keep the order in which values first appear.
    pub fn value_counts(&self) -> Vec<(String, usize)> {
        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut counts: Vec<(String, usize)> = Vec::new();
        for row in 0..self.len() {
            let Some(key) = self.cell_key(row) else {
                continue;
            };
            match positions.get(key.as_ref()) {
                Some(&idx) => counts[idx].1 += 1,
                None => {
                    positions.insert(key.to_string(), counts.len());
                    counts.push((key.into_owned(), 1));
                }
            }
        }
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts
    }

    /// Non-missing numeric cells in row order; empty for non-numeric storage.
    pub fn numeric_values(&self) -> Vec<f64> {
        match &self.values {
            ColumnValues::Number(v) => v.iter().flatten().copied().collect(),
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
    row_count: usize,
}

impl Dataset {
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let row_count = columns.first().map(Column::len).unwrap_or(0);
        for column in &columns {
            ensure!(
                column.len() == row_count,
                "Column '{}' has {} row(s) but the dataset has {row_count}",
                column.name(),
                column.len()
            );
        }
        Ok(Self { columns, row_count })
    }

    /// Builds typed columns from header names and raw text rows.
    ///
    /// Short rows are padded with missing cells; rows wider than the header
    /// are rejected. Duplicate header names are suffixed `.1`, `.2`, ...
    pub fn from_records(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        let width = headers.len();
        let mut cells: Vec<Vec<Option<String>>> = vec![Vec::with_capacity(rows.len()); width];
        for (row_idx, row) in rows.into_iter().enumerate() {
            ensure!(
                row.len() <= width,
                "Row {} has {} field(s) but the header defines {width}",
                row_idx + 1,
                row.len()
            );
            let mut fields = row.into_iter();
            for column in cells.iter_mut() {
                column.push(fields.next().and_then(|raw| normalize_cell(&raw)));
            }
        }
        let names = dedupe_headers(headers);
        let columns = names
            .into_iter()
            .zip(cells)
            .map(|(name, values)| Column::new(name, classify_cells(values)))
            .collect();
        Self::new(columns)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    /// Hashable image of one row, used for duplicate detection.
    pub fn row_key(&self, row: usize) -> Vec<Option<String>> {
        self.columns
            .iter()
            .map(|column| column.cell_key(row).map(Cow::into_owned))
            .collect()
    }

    /// New dataset holding only `rows`, in the order given.
    pub fn select_rows(&self, rows: &[usize]) -> Dataset {
        Dataset {
            columns: self
                .columns
                .iter()
                .map(|column| Column::new(column.name(), column.values.select(rows)))
                .collect(),
            row_count: rows.len(),
        }
    }
}

fn normalize_cell(raw: &str) -> Option<String> {
    if NULL_TOKENS.contains(&raw) {
        None
    } else {
        Some(raw.to_string())
    }
}

fn classify_cells(cells: Vec<Option<String>>) -> ColumnValues {
    if cells.is_empty() {
        return ColumnValues::Text(cells);
    }
    let numbers = cells
        .iter()
        .map(|cell| match cell {
            Some(raw) => raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| !n.is_nan())
                .map(Some),
            None => Some(None),
        })
        .collect::<Option<Vec<_>>>();
    if let Some(numbers) = numbers {
        return ColumnValues::Number(numbers);
    }
    let booleans = cells
        .iter()
        .map(|cell| cell.as_deref().and_then(parse_bool_token))
        .collect::<Option<Vec<_>>>();
    if let Some(booleans) = booleans {
        return ColumnValues::Boolean(booleans.into_iter().map(Some).collect());
    }
    ColumnValues::Text(cells)
}

fn parse_bool_token(value: &str) -> Option<bool> {
    if TRUE_TOKENS.contains(&value) {
        Some(true)
    } else if FALSE_TOKENS.contains(&value) {
        Some(false)
    } else {
        None
    }
}

fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    headers
        .into_iter()
        .enumerate()
        .map(|(idx, header)| {
            let base = if header.trim().is_empty() {
                format!("Unnamed: {idx}")
            } else {
                header
            };
            let occurrences = seen.entry(base.clone()).or_insert(0);
            let name = if *occurrences == 0 {
                base
            } else {
                format!("{base}.{occurrences}")
            };
            *occurrences += 1;
            name
        })
        .collect()
}

fn canonical_bits(value: f64) -> u64 {
    if value == 0.0 { 0.0f64.to_bits() } else { value.to_bits() }
}

pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

/// Parses a free-form date or timestamp token.
///
/// Month-first slash dates win over day-first ones when both would parse.
pub fn parse_datetime_token(value: &str) -> Option<NaiveDateTime> {
    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
        "%Y/%m/%d %H:%M:%S",
        "%m/%d/%Y %H:%M:%S",
        "%d/%m/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M",
    ];
    const DATE_FORMATS: &[&str] = &[
        "%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%b %d, %Y",
        "%B %d, %Y", "%d %b %Y", "%d %B %Y",
    ];
    const MONTH_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.naive_utc());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(parsed);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(trimmed, fmt) {
            return parsed.and_hms_opt(0, 0, 0);
        }
    }
    // Year-month tokens such as `2024-03` resolve to the first of the month.
    let separator = if trimmed.contains('/') { "/" } else { "-" };
    let padded = format!("{trimmed}{separator}01");
    for fmt in MONTH_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(&padded, fmt) {
            return parsed.and_hms_opt(0, 0, 0);
        }
    }
    None
}
