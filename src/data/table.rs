//! Immutable in-memory table of annotated variant records.

use crate::error::{EnrichError, Result};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::Arc;

/// Raw tokens treated as missing when loading a table.
pub const MISSING_TOKENS: &[&str] = &["", "NA", "N/A", "NaN", "nan", "null", "None", "<NA>"];

const FALSE_TOKENS: &[&str] = &["false", "False", "FALSE", "0", "no", "No", "NO"];
const TRUE_TOKENS: &[&str] = &["true", "True", "TRUE", "1", "yes", "Yes", "YES"];

/// A single cell value.
///
/// Text is stored behind an `Arc` so duplicating a row (for example during
/// multi-value expansion) shares the underlying strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Categorical or free text.
    Text(Arc<str>),
    /// Numeric value.
    Number(f64),
    /// Missing value.
    Missing,
}

impl Value {
    /// Create a text value.
    pub fn text(s: &str) -> Self {
        Value::Text(Arc::from(s))
    }

    /// Check if this is a missing value.
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Try to get as text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// Token used when the value acts as a category or class label.
    ///
    /// Integral numbers render without a fractional part (`3`, not `3.0`).
    pub fn as_token(&self) -> Option<Cow<'_, str>> {
        match self {
            Value::Text(s) => Some(Cow::Borrowed(s)),
            Value::Number(v) => Some(Cow::Owned(format_number(*v))),
            Value::Missing => None,
        }
    }

    /// Truth value of a boolean-like cell.
    ///
    /// Missing values, zero and false-like tokens (`false`, `0`, `no`) are
    /// false; any other value is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Missing => false,
            Value::Number(v) => *v != 0.0 && !v.is_nan(),
            Value::Text(s) => !FALSE_TOKENS.contains(&s.trim()),
        }
    }

    /// Whether the value reads as a boolean (`true`/`false`, `yes`/`no`, 0/1).
    pub fn is_boolean_like(&self) -> bool {
        match self {
            Value::Missing => false,
            Value::Number(v) => *v == 0.0 || *v == 1.0,
            Value::Text(s) => {
                let t = s.trim();
                FALSE_TOKENS.contains(&t) || TRUE_TOKENS.contains(&t)
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::text(s)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Missing)
    }
}

fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}

/// An immutable table: named columns and an ordered sequence of rows.
///
/// Every transform in the crate derives a new table; a loaded table is never
/// modified in place.
#[derive(Debug, Clone)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Create a table from column names and row values.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self> {
        let mut seen = HashSet::new();
        for name in &columns {
            if !seen.insert(name.as_str()) {
                return Err(EnrichError::DuplicateColumn(name.clone()));
            }
        }
        for row in &rows {
            if row.len() != columns.len() {
                return Err(EnrichError::DimensionMismatch {
                    expected: columns.len(),
                    actual: row.len(),
                });
            }
        }
        Ok(Self { columns, rows })
    }

    /// Load a table from a TSV file with a header row.
    ///
    /// A column becomes numeric if every non-missing value parses as a number,
    /// otherwise it is kept as text. See [`MISSING_TOKENS`].
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Load a table from any TSV reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let columns: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        if columns.is_empty() || (columns.len() == 1 && columns[0].is_empty()) {
            return Err(EnrichError::EmptyData("TSV has no header".to_string()));
        }
        let n_columns = columns.len();

        // First pass: raw fields, to infer column types
        let mut raw_rows: Vec<Vec<String>> = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            if record.len() > n_columns {
                return Err(EnrichError::DimensionMismatch {
                    expected: n_columns,
                    actual: record.len(),
                });
            }
            let mut fields: Vec<String> = record.iter().map(str::to_string).collect();
            fields.resize(n_columns, String::new());
            raw_rows.push(fields);
        }

        let numeric: Vec<bool> = (0..n_columns)
            .map(|col| {
                let mut any_value = false;
                let all_numeric = raw_rows.iter().all(|fields| {
                    let raw = fields[col].trim();
                    if is_missing_token(raw) {
                        return true;
                    }
                    any_value = true;
                    raw.parse::<f64>().is_ok()
                });
                all_numeric && any_value
            })
            .collect();

        // Second pass: typed values, sharing repeated text per column
        let mut interned: Vec<HashMap<String, Arc<str>>> = vec![HashMap::new(); n_columns];
        let rows = raw_rows
            .into_iter()
            .map(|fields| {
                fields
                    .into_iter()
                    .enumerate()
                    .map(|(col, field)| {
                        let raw = field.trim();
                        if is_missing_token(raw) {
                            Value::Missing
                        } else if numeric[col] {
                            raw.parse::<f64>().map(Value::Number).unwrap_or(Value::Missing)
                        } else {
                            let shared = interned[col]
                                .entry(raw.to_string())
                                .or_insert_with(|| Arc::from(raw));
                            Value::Text(Arc::clone(shared))
                        }
                    })
                    .collect()
            })
            .collect();

        Self::new(columns, rows)
    }

    /// Column names in order.
    #[inline]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of rows.
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    #[inline]
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// Check if the table has no rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Check whether a column exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Position of a column, failing with `MissingColumn` if absent.
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| EnrichError::MissingColumn(name.to_string()))
    }

    /// Value at (row, col), if both are in range.
    #[inline]
    pub fn value(&self, row: usize, col: usize) -> Option<&Value> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// View of a single record.
    pub fn record(&self, index: usize) -> Option<Record<'_>> {
        (index < self.rows.len()).then_some(Record { table: self, index })
    }

    /// Iterate over all records in order.
    pub fn records(&self) -> impl Iterator<Item = Record<'_>> + '_ {
        (0..self.rows.len()).map(move |index| Record { table: self, index })
    }

    /// Iterate over the values of one column.
    pub fn column_values(&self, name: &str) -> Result<impl Iterator<Item = &Value> + '_> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(move |row| &row[idx]))
    }

    /// Keep the rows for which `predicate` returns true.
    pub fn filter_rows<F>(&self, predicate: F) -> Table
    where
        F: Fn(&Record<'_>) -> bool,
    {
        let rows = self
            .records()
            .filter(|r| predicate(r))
            .map(|r| r.values().to_vec())
            .collect();
        Table {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Keep the rows whose value in `column` is one of `allowed`.
    ///
    /// Missing values never match.
    pub fn filter_in(&self, column: &str, allowed: &[String]) -> Result<Table> {
        let idx = self.column_index(column)?;
        let allowed: HashSet<&str> = allowed.iter().map(String::as_str).collect();
        Ok(self.filter_rows(|r| {
            r.values()[idx]
                .as_token()
                .map(|t| allowed.contains(&*t))
                .unwrap_or(false)
        }))
    }

    /// Whether every non-missing value of `column` is boolean-like, with at
    /// least one such value.
    pub fn is_boolean_column(&self, column: &str) -> Result<bool> {
        let idx = self.column_index(column)?;
        let mut any_value = false;
        let all_boolean = self.rows.iter().all(|row| match &row[idx] {
            Value::Missing => true,
            value => {
                any_value = true;
                value.is_boolean_like()
            }
        });
        Ok(all_boolean && any_value)
    }

    /// Presence test for the cells of `column`.
    ///
    /// In a boolean column a cell is present when it is truthy; in any other
    /// column when it is not missing.
    pub fn presence_rule(&self, column: &str) -> Result<fn(&Value) -> bool> {
        let rule: fn(&Value) -> bool = if self.is_boolean_column(column)? {
            Value::is_truthy
        } else {
            is_not_missing
        };
        Ok(rule)
    }

    /// Append a text column holding `true`/`false` for presence of `source`.
    ///
    /// See [`presence_rule`](Self::presence_rule).
    pub fn with_presence_column(&self, source: &str, name: &str) -> Result<Table> {
        let idx = self.column_index(source)?;
        if self.has_column(name) {
            return Err(EnrichError::DuplicateColumn(name.to_string()));
        }
        let is_present = self.presence_rule(source)?;
        let yes = Value::text("true");
        let no = Value::text("false");

        let mut columns = self.columns.clone();
        columns.push(name.to_string());
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let mut values = row.clone();
                values.push(if is_present(&row[idx]) { yes.clone() } else { no.clone() });
                values
            })
            .collect();
        Ok(Table { columns, rows })
    }

    /// Raw row values.
    #[inline]
    pub(crate) fn row_values(&self, index: usize) -> &[Value] {
        &self.rows[index]
    }

    /// Build a table whose rows are already known to match `columns`.
    pub(crate) fn from_parts(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        debug_assert!(rows.iter().all(|r| r.len() == columns.len()));
        Self { columns, rows }
    }
}

fn is_not_missing(value: &Value) -> bool {
    !value.is_missing()
}

fn is_missing_token(raw: &str) -> bool {
    MISSING_TOKENS.contains(&raw)
}

/// Borrowed view of one row of a [`Table`].
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    table: &'a Table,
    index: usize,
}

impl<'a> Record<'a> {
    /// Position of the record in its table.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Value of a named column, or `None` if the column does not exist.
    pub fn get(&self, column: &str) -> Option<&'a Value> {
        let col = self.table.columns.iter().position(|c| c == column)?;
        Some(&self.table.rows[self.index][col])
    }

    /// All values in column order.
    #[inline]
    pub fn values(&self) -> &'a [Value] {
        &self.table.rows[self.index]
    }
}
