//! Expansion of delimiter-separated multi-valued columns.

use crate::data::{Table, Value};
use crate::error::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};

/// Separator used by the annotation pipeline for multi-valued fields.
pub const DEFAULT_DELIMITER: char = ';';

/// Characters that suggest a token was meant to be split further or carries
/// nested structure. Such tokens are kept whole and reported.
fn ambiguity_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[;,|\[\]{}]").expect("static pattern"))
}

/// What to do with tokens that are empty after trimming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyTokenPolicy {
    /// Keep empty tokens as their own (empty) category.
    #[default]
    Keep,
    /// Drop empty tokens.
    Drop,
}

/// Options for [`expand_multi_value`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpandOptions {
    /// Token separator.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    /// Handling of tokens that are empty after trimming.
    #[serde(default)]
    pub empty_tokens: EmptyTokenPolicy,
}

fn default_delimiter() -> char {
    DEFAULT_DELIMITER
}

impl Default for ExpandOptions {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
            empty_tokens: EmptyTokenPolicy::Keep,
        }
    }
}

impl ExpandOptions {
    /// Default options: `;` separator, empty tokens kept.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different separator.
    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set the empty-token policy.
    pub fn empty_tokens(mut self, policy: EmptyTokenPolicy) -> Self {
        self.empty_tokens = policy;
        self
    }
}

/// A token kept whole although it looks like a nested or differently
/// delimited list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmbiguousToken {
    /// Index of the source row.
    pub row: usize,
    /// The token as counted.
    pub token: String,
}

/// Output of a multi-value expansion.
#[derive(Debug, Clone)]
pub struct Expansion {
    /// Expanded table: one token per row in the expanded column.
    pub table: Table,
    /// Name of the expanded column.
    pub column: String,
    /// For each expanded row, the index of its source row.
    pub source_rows: Vec<usize>,
    /// Rows in the input table.
    pub n_source_rows: usize,
    /// Input rows excluded because the column was missing.
    pub n_missing: usize,
    /// Tokens removed under [`EmptyTokenPolicy::Drop`].
    pub n_empty_dropped: usize,
    /// Tokens kept whole despite looking like nested lists.
    pub ambiguous: Vec<AmbiguousToken>,
}

impl Expansion {
    /// Rows in the expanded table.
    pub fn n_rows(&self) -> usize {
        self.table.n_rows()
    }

    /// Serializable summary of the expansion.
    pub fn summary(&self) -> ExpansionSummary {
        ExpansionSummary {
            column: self.column.clone(),
            n_source_rows: self.n_source_rows,
            n_missing: self.n_missing,
            n_expanded_rows: self.table.n_rows(),
            n_empty_dropped: self.n_empty_dropped,
            n_ambiguous: self.ambiguous.len(),
        }
    }
}

/// Summary of an expansion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpansionSummary {
    pub column: String,
    pub n_source_rows: usize,
    pub n_missing: usize,
    pub n_expanded_rows: usize,
    pub n_empty_dropped: usize,
    pub n_ambiguous: usize,
}

impl std::fmt::Display for ExpansionSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Expansion of '{}'", self.column)?;
        writeln!(f, "  Source rows:       {}", self.n_source_rows)?;
        writeln!(f, "  Missing (dropped): {}", self.n_missing)?;
        writeln!(f, "  Expanded rows:     {}", self.n_expanded_rows)?;
        writeln!(f, "  Empty tokens dropped: {}", self.n_empty_dropped)?;
        writeln!(f, "  Ambiguous tokens:  {}", self.n_ambiguous)?;
        Ok(())
    }
}

/// Split a multi-valued column into one row per token.
///
/// Every token is trimmed of surrounding whitespace. Rows with a missing
/// value in `column` are excluded; all other columns are carried over
/// unchanged. Numeric values form a single token.
///
/// # Arguments
/// * `table` - Input table (not modified)
/// * `column` - Column to expand
/// * `options` - Separator and empty-token policy
///
/// # Returns
/// The expanded table plus bookkeeping. Fails with `MissingColumn` if
/// `column` does not exist.
pub fn expand_multi_value(
    table: &Table,
    column: &str,
    options: &ExpandOptions,
) -> Result<Expansion> {
    let col = table.column_index(column)?;
    let pattern = ambiguity_pattern();

    let mut rows = Vec::with_capacity(table.n_rows());
    let mut source_rows = Vec::with_capacity(table.n_rows());
    let mut n_missing = 0;
    let mut n_empty_dropped = 0;
    let mut ambiguous = Vec::new();

    for row in 0..table.n_rows() {
        let values = table.row_values(row);
        let tokens: Vec<Value> = match &values[col] {
            Value::Missing => {
                n_missing += 1;
                continue;
            }
            Value::Number(v) => vec![Value::Number(*v)],
            Value::Text(text) => {
                let mut tokens = Vec::new();
                for raw in text.split(options.delimiter) {
                    let token = raw.trim();
                    if token.is_empty() && options.empty_tokens == EmptyTokenPolicy::Drop {
                        n_empty_dropped += 1;
                        continue;
                    }
                    if pattern.is_match(token) {
                        ambiguous.push(AmbiguousToken {
                            row,
                            token: token.to_string(),
                        });
                    }
                    // reuse the source string when nothing was split off
                    if token.len() == text.len() {
                        tokens.push(Value::Text(Arc::clone(text)));
                    } else {
                        tokens.push(Value::text(token));
                    }
                }
                tokens
            }
        };

        for token in tokens {
            let mut expanded = values.to_vec();
            expanded[col] = token;
            rows.push(expanded);
            source_rows.push(row);
        }
    }

    Ok(Expansion {
        table: Table::from_parts(table.columns().to_vec(), rows),
        column: column.to_string(),
        source_rows,
        n_source_rows: table.n_rows(),
        n_missing,
        n_empty_dropped,
        ambiguous,
    })
}
