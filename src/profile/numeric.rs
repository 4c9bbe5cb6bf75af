//! Profile of a numeric annotation (e.g. population allele frequency) within
//! one class.

use crate::data::{Table, Value};
use crate::error::{EnrichError, Result};
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, OrderStatistics, Statistics};

/// Allele frequency above which a variant counts as common.
pub const DEFAULT_COMMON_THRESHOLD: f64 = 0.01;

/// Descriptive statistics of the numeric values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericStats {
    pub mean: f64,
    /// Sample standard deviation (NaN for a single value).
    pub std_dev: f64,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// Numeric annotation profile of one class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumericProfile {
    pub class: String,
    pub column: String,
    /// Rows of the class.
    pub n_rows: usize,
    /// Rows without a usable numeric value.
    pub n_missing: usize,
    /// Rows with a numeric value.
    pub n_values: usize,
    /// Threshold separating common from rare values.
    pub threshold: f64,
    /// Values above the threshold.
    pub n_common: usize,
    /// Values at or below the threshold.
    pub n_rare: usize,
    /// `None` when the class has no numeric values.
    pub stats: Option<NumericStats>,
}

impl std::fmt::Display for NumericProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{} among {}", self.column, self.class)?;
        writeln!(f, "  Rows:        {}", self.n_rows)?;
        writeln!(f, "  With value:  {}", self.n_values)?;
        writeln!(f, "  Missing:     {}", self.n_missing)?;
        writeln!(f, "  Common (>{}): {}", self.threshold, self.n_common)?;
        writeln!(f, "  Rare (<={}):  {}", self.threshold, self.n_rare)?;
        if let Some(s) = &self.stats {
            writeln!(f, "  Mean:   {:.6}", s.mean)?;
            writeln!(f, "  Std:    {:.6}", s.std_dev)?;
            writeln!(f, "  Min:    {:.6}", s.min)?;
            writeln!(f, "  Q1:     {:.6}", s.q1)?;
            writeln!(f, "  Median: {:.6}", s.median)?;
            writeln!(f, "  Q3:     {:.6}", s.q3)?;
            writeln!(f, "  Max:    {:.6}", s.max)?;
        }
        Ok(())
    }
}

/// Coerce a value to a number; unparsable text counts as missing.
fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(v) => Some(*v),
        Value::Text(s) => s.trim().parse::<f64>().ok(),
        Value::Missing => None,
    }
    .filter(|v| !v.is_nan())
}

/// Profile the numeric `column` over the rows of one class.
///
/// # Arguments
/// * `table` - Input table
/// * `class_column` - Column holding the class label
/// * `class` - Class to profile (e.g. "Oncogenic")
/// * `column` - Numeric column (e.g. "gnomAD_AF")
/// * `threshold` - Values above are common, the rest rare
pub fn profile_numeric(
    table: &Table,
    class_column: &str,
    class: &str,
    column: &str,
    threshold: f64,
) -> Result<NumericProfile> {
    if !threshold.is_finite() {
        return Err(EnrichError::InvalidParameter(
            "Common threshold must be finite".to_string(),
        ));
    }
    let class_col = table.column_index(class_column)?;
    let col = table.column_index(column)?;

    let mut n_rows = 0;
    let mut values = Vec::new();
    for record in table.records() {
        let row = record.values();
        if row[class_col].as_token().as_deref() != Some(class) {
            continue;
        }
        n_rows += 1;
        if let Some(v) = numeric(&row[col]) {
            values.push(v);
        }
    }

    let n_values = values.len();
    let n_common = values.iter().filter(|&&v| v > threshold).count();
    let stats = (!values.is_empty()).then(|| describe(values));

    Ok(NumericProfile {
        class: class.to_string(),
        column: column.to_string(),
        n_rows,
        n_missing: n_rows - n_values,
        n_values,
        threshold,
        n_common,
        n_rare: n_values - n_common,
        stats,
    })
}

fn describe(values: Vec<f64>) -> NumericStats {
    let mean = values.iter().mean();
    let std_dev = values.iter().std_dev();
    let n = values.len();
    let mut data = Data::new(values);

    NumericStats {
        mean,
        std_dev,
        min: data.order_statistic(1),
        q1: data.lower_quartile(),
        median: data.median(),
        q3: data.upper_quartile(),
        max: data.order_statistic(n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn create_test_table() -> Table {
        Table::new(
            vec!["ONCOGENIC".into(), "gnomAD_AF".into()],
            vec![
                vec!["Oncogenic".into(), Value::Number(0.001)],
                vec!["Oncogenic".into(), Value::Number(0.5)],
                vec!["Oncogenic".into(), Value::Number(0.02)],
                vec!["Oncogenic".into(), Value::Missing],
                vec!["Oncogenic".into(), Value::Number(0.002)],
                vec!["Oncogenic".into(), Value::Number(0.03)],
                vec!["Oncogenic".into(), "not available".into()],
                vec!["Likely Neutral".into(), Value::Number(0.2)],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_profile_numeric() {
        let profile = profile_numeric(
            &create_test_table(),
            "ONCOGENIC",
            "Oncogenic",
            "gnomAD_AF",
            DEFAULT_COMMON_THRESHOLD,
        )
        .unwrap();

        assert_eq!(profile.n_rows, 7);
        assert_eq!(profile.n_values, 5);
        assert_eq!(profile.n_missing, 2);
        assert_eq!(profile.n_common, 3);
        assert_eq!(profile.n_rare, 2);

        let stats = profile.stats.unwrap();
        assert_relative_eq!(stats.mean, 0.553 / 5.0, epsilon = 1e-12);
        assert_relative_eq!(stats.min, 0.001);
        assert_relative_eq!(stats.max, 0.5);
        assert_relative_eq!(stats.median, 0.02, epsilon = 1e-9);
        assert!(stats.q1 <= stats.median && stats.median <= stats.q3);
    }

    #[test]
    fn test_text_numbers_are_coerced() {
        let table = Table::new(
            vec!["ONCOGENIC".into(), "gnomAD_AF".into()],
            vec![
                vec!["Oncogenic".into(), "0.05".into()],
                vec!["Oncogenic".into(), ".".into()],
            ],
        )
        .unwrap();
        let profile = profile_numeric(&table, "ONCOGENIC", "Oncogenic", "gnomAD_AF", 0.01).unwrap();
        assert_eq!(profile.n_values, 1);
        assert_eq!(profile.n_common, 1);
        assert_eq!(profile.n_missing, 1);
    }

    #[test]
    fn test_class_without_values() {
        let profile = profile_numeric(
            &create_test_table(),
            "ONCOGENIC",
            "Resistance",
            "gnomAD_AF",
            DEFAULT_COMMON_THRESHOLD,
        )
        .unwrap();
        assert_eq!(profile.n_rows, 0);
        assert!(profile.stats.is_none());
    }

    #[test]
    fn test_invalid_threshold() {
        let result = profile_numeric(
            &create_test_table(),
            "ONCOGENIC",
            "Oncogenic",
            "gnomAD_AF",
            f64::NAN,
        );
        assert!(matches!(result, Err(EnrichError::InvalidParameter(_))));
    }
}
