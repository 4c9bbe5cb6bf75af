//! Class distribution over a whole table.

use crate::count::class_category::class_sizes;
use crate::data::Table;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Number of rows carrying one class label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassFrequency {
    pub class: String,
    pub count: u64,
    /// Share of the rows with a class label.
    pub fraction: f64,
}

/// Frequencies of every class label in a column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassDistribution {
    /// Column the labels were read from.
    pub column: String,
    /// Total rows in the table.
    pub n_rows: usize,
    /// Rows without a class label.
    pub n_missing: u64,
    /// Classes by count (descending), ties in name order.
    pub classes: Vec<ClassFrequency>,
}

impl ClassDistribution {
    /// Count for one class, 0 if never seen.
    pub fn count(&self, class: &str) -> u64 {
        self.classes
            .iter()
            .find(|c| c.class == class)
            .map(|c| c.count)
            .unwrap_or(0)
    }

    /// Class labels in frequency order.
    pub fn labels(&self) -> Vec<&str> {
        self.classes.iter().map(|c| c.class.as_str()).collect()
    }
}

impl std::fmt::Display for ClassDistribution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Class Distribution ({})", self.column)?;
        writeln!(f, "  Rows:    {}", self.n_rows)?;
        writeln!(f, "  Missing: {}", self.n_missing)?;
        for c in &self.classes {
            writeln!(f, "  {:<24} {:>8} ({:.1}%)", c.class, c.count, c.fraction * 100.0)?;
        }
        Ok(())
    }
}

/// Count every class label of `class_column`.
pub fn class_distribution(table: &Table, class_column: &str) -> Result<ClassDistribution> {
    let (sizes, n_missing) = class_sizes(table, class_column)?;
    let labelled: u64 = sizes.values().sum();

    let mut classes: Vec<ClassFrequency> = sizes
        .into_iter()
        .map(|(class, count)| ClassFrequency {
            fraction: count as f64 / labelled as f64,
            class,
            count,
        })
        .collect();
    classes.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.class.cmp(&b.class)));

    Ok(ClassDistribution {
        column: class_column.to_string(),
        n_rows: table.n_rows(),
        n_missing,
        classes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Value;
    use crate::error::EnrichError;
    use approx::assert_relative_eq;

    #[test]
    fn test_class_distribution() {
        let table = Table::new(
            vec!["ONCOGENIC".into()],
            vec![
                vec!["Unknown".into()],
                vec!["Oncogenic".into()],
                vec!["Likely Neutral".into()],
                vec!["Oncogenic".into()],
                vec!["Likely Neutral".into()],
                vec!["Oncogenic".into()],
                vec![Value::Missing],
            ],
        )
        .unwrap();

        let dist = class_distribution(&table, "ONCOGENIC").unwrap();
        assert_eq!(dist.n_rows, 7);
        assert_eq!(dist.n_missing, 1);
        assert_eq!(dist.labels(), vec!["Oncogenic", "Likely Neutral", "Unknown"]);
        assert_eq!(dist.count("Oncogenic"), 3);
        assert_eq!(dist.count("Resistance"), 0);
        assert_relative_eq!(dist.classes[0].fraction, 0.5);
    }

    #[test]
    fn test_missing_class_column() {
        let table = Table::new(vec!["HUGO_SYMBOL".into()], vec![vec!["EGFR".into()]]).unwrap();
        assert!(matches!(
            class_distribution(&table, "ONCOGENIC"),
            Err(EnrichError::MissingColumn(_))
        ));
    }
}
