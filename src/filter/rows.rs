//! Row filters on class and category columns.

use crate::data::Table;
use crate::error::{EnrichError, Result};

/// Keep rows whose class is one of `classes`.
///
/// # Arguments
/// * `table` - Input table
/// * `class_column` - Column holding the class label
/// * `classes` - Classes to keep
///
/// # Returns
/// A new table; fails with `EmptyData` if no row remains.
pub fn filter_classes(table: &Table, class_column: &str, classes: &[String]) -> Result<Table> {
    if classes.is_empty() {
        return Err(EnrichError::InvalidParameter(
            "At least one class must be given".to_string(),
        ));
    }
    let filtered = table.filter_in(class_column, classes)?;
    if filtered.is_empty() {
        return Err(EnrichError::EmptyData(format!(
            "No rows with {} in [{}]",
            class_column,
            classes.join(", ")
        )));
    }
    Ok(filtered)
}

/// Keep rows whose category is on the allow-list.
///
/// Unlike the allow-list of a count spec, this removes the rows entirely, so
/// class totals computed afterwards only cover the kept categories.
pub fn filter_categories(table: &Table, column: &str, allowed: &[String]) -> Result<Table> {
    let filtered = table.filter_in(column, allowed)?;
    if filtered.is_empty() {
        return Err(EnrichError::EmptyData(format!(
            "No rows with an allowed {}",
            column
        )));
    }
    Ok(filtered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Value;

    fn create_test_table() -> Table {
        Table::new(
            vec!["ONCOGENIC".into(), "FEATURE_TYPE".into()],
            vec![
                vec!["Oncogenic".into(), "Region".into()],
                vec!["Likely Oncogenic".into(), "Site".into()],
                vec!["Unknown".into(), "Region".into()],
                vec![Value::Missing, "Region".into()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_filter_classes() {
        let classes = vec!["Oncogenic".to_string(), "Likely Oncogenic".to_string()];
        let filtered = filter_classes(&create_test_table(), "ONCOGENIC", &classes).unwrap();
        assert_eq!(filtered.n_rows(), 2);
    }

    #[test]
    fn test_filter_classes_empty_result() {
        let classes = vec!["Resistance".to_string()];
        let result = filter_classes(&create_test_table(), "ONCOGENIC", &classes);
        assert!(matches!(result, Err(EnrichError::EmptyData(_))));
        assert!(filter_classes(&create_test_table(), "ONCOGENIC", &[]).is_err());
    }

    #[test]
    fn test_filter_categories() {
        let filtered =
            filter_categories(&create_test_table(), "FEATURE_TYPE", &["Site".to_string()]).unwrap();
        assert_eq!(filtered.n_rows(), 1);

        let missing = filter_categories(&create_test_table(), "DOMAIN_NAME", &["Site".to_string()]);
        assert!(matches!(missing, Err(EnrichError::MissingColumn(_))));
    }
}
