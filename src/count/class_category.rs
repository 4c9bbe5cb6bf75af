//! Counting of (category, class) pairs.

use crate::data::{
    try_divide, ClassCount, ClassCountSet, Contingency, DivisionPolicy, Matrix, Table,
};
use crate::error::{EnrichError, Result};
use crate::expand::Expansion;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;

/// Which columns to count and which values take part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountSpec {
    /// Column holding the class label.
    pub class_column: String,
    /// Column holding the category.
    pub category_column: String,
    /// Class universe, in output order. `None` uses every observed class in
    /// name order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classes: Option<Vec<String>>,
    /// Allow-list of categories. `None` counts every category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
}

impl CountSpec {
    pub fn new(class_column: &str, category_column: &str) -> Self {
        Self {
            class_column: class_column.to_string(),
            category_column: category_column.to_string(),
            classes: None,
            categories: None,
        }
    }

    /// Restrict counting to these classes, in this order.
    pub fn with_classes(mut self, classes: &[&str]) -> Self {
        self.classes = Some(classes.iter().map(|s| s.to_string()).collect());
        self
    }

    /// Only count these category values.
    pub fn with_categories(mut self, categories: &[&str]) -> Self {
        self.categories = Some(categories.iter().map(|s| s.to_string()).collect());
        self
    }
}

/// How rows map to counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountMode {
    /// One increment per row; the category is taken as a single token.
    Simple,
    /// Counted on an expanded table: one source record can land in several
    /// categories.
    PostExpansion,
}

/// Counts per (category, class) with per-class totals.
///
/// Totals come from the same row universe as the counts: rows whose class is
/// in the class universe and whose category is present. The category
/// allow-list narrows which cells are counted but not the totals.
#[derive(Debug, Clone)]
pub struct CountTable {
    mode: CountMode,
    category_column: String,
    /// categories × classes
    counts: Contingency,
    class_totals: Vec<u64>,
    record_totals: Vec<u64>,
}

impl CountTable {
    #[inline]
    pub fn mode(&self) -> CountMode {
        self.mode
    }

    #[inline]
    pub fn category_column(&self) -> &str {
        &self.category_column
    }

    /// Categories in name order.
    #[inline]
    pub fn categories(&self) -> &[String] {
        self.counts.row_labels()
    }

    /// Classes in universe order.
    #[inline]
    pub fn classes(&self) -> &[String] {
        self.counts.col_labels()
    }

    /// Underlying categories × classes contingency.
    #[inline]
    pub fn contingency(&self) -> &Contingency {
        &self.counts
    }

    /// Check whether a class is part of the table.
    pub fn has_class(&self, class: &str) -> bool {
        self.counts.col_position(class).is_some()
    }

    /// Rows with this category and class.
    pub fn count(&self, category: &str, class: &str) -> u64 {
        self.counts.count(category, class)
    }

    /// Rows of a class in the counted universe (0 for unknown classes).
    pub fn class_total(&self, class: &str) -> u64 {
        self.counts
            .col_position(class)
            .map(|c| self.class_totals[c])
            .unwrap_or(0)
    }

    /// Distinct source records of a class.
    ///
    /// Equal to [`class_total`](Self::class_total) for simple counts.
    pub fn record_total(&self, class: &str) -> u64 {
        self.counts
            .col_position(class)
            .map(|c| self.record_totals[c])
            .unwrap_or(0)
    }

    /// Rows with this category over all classes.
    pub fn category_total(&self, category: &str) -> u64 {
        match self.counts.row_position(category) {
            Some(r) => self.counts.row_dense(r).iter().sum(),
            None => 0,
        }
    }

    /// Total number of counted rows.
    pub fn n_counted(&self) -> u64 {
        self.counts.total()
    }

    /// `count(category, class) / class_total(class)`.
    pub fn fraction(&self, category: &str, class: &str, policy: DivisionPolicy) -> f64 {
        policy.divide(self.count(category, class), self.class_total(class))
    }

    /// Like [`fraction`](Self::fraction), `None` when the class is empty.
    pub fn try_fraction(&self, category: &str, class: &str) -> Option<f64> {
        try_divide(self.count(category, class), self.class_total(class))
    }

    /// Fraction of the class's source records that carry this category.
    ///
    /// After expansion these fractions can sum to more than 1 over
    /// categories, since one record can carry several.
    pub fn record_fraction(&self, category: &str, class: &str, policy: DivisionPolicy) -> f64 {
        policy.divide(self.count(category, class), self.record_total(class))
    }

    /// Share of a category's rows that belong to `class`.
    pub fn composition(&self, category: &str, class: &str, policy: DivisionPolicy) -> f64 {
        policy.divide(self.count(category, class), self.category_total(category))
    }

    /// Every category × class cell in long form.
    pub fn long_form(&self, policy: DivisionPolicy) -> ClassCountSet {
        let mut rows = Vec::with_capacity(self.counts.n_rows() * self.counts.n_cols());
        for (r, category) in self.categories().iter().enumerate() {
            let dense = self.counts.row_dense(r);
            for (c, class) in self.classes().iter().enumerate() {
                rows.push(ClassCount {
                    category: category.clone(),
                    class: class.clone(),
                    count: dense[c],
                    class_total: self.class_totals[c],
                    fraction: policy.divide(dense[c], self.class_totals[c]),
                });
            }
        }
        ClassCountSet {
            category_column: self.category_column.clone(),
            rows,
        }
    }

    /// Write the long form to a TSV file.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P, policy: DivisionPolicy) -> Result<()> {
        self.long_form(policy).to_tsv(path)
    }

    /// Class composition of every category (rows sum to 1).
    pub fn composition_matrix(&self, policy: DivisionPolicy) -> Result<Matrix> {
        let mut values = self.counts.to_dense();
        let totals = self.counts.row_sums();
        for (r, &total) in totals.iter().enumerate() {
            for c in 0..values.ncols() {
                values[(r, c)] = policy.divide(values[(r, c)] as u64, total);
            }
        }
        Matrix::from_dense(self.categories().to_vec(), self.classes().to_vec(), values)
    }

    /// Keep only the named classes, in the given order.
    pub fn restrict_classes(&self, classes: &[&str]) -> Result<CountTable> {
        let positions = classes
            .iter()
            .map(|class| {
                self.counts
                    .col_position(class)
                    .ok_or_else(|| EnrichError::MissingClass(class.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(CountTable {
            mode: self.mode,
            category_column: self.category_column.clone(),
            counts: self.counts.subset_cols(&positions)?,
            class_totals: positions.iter().map(|&c| self.class_totals[c]).collect(),
            record_totals: positions.iter().map(|&c| self.record_totals[c]).collect(),
        })
    }
}

/// Count (category, class) pairs, one increment per row.
///
/// # Arguments
/// * `table` - Input table
/// * `spec` - Columns, class universe and category allow-list
///
/// # Returns
/// A `CountTable`; fails with `MissingColumn` if a column is absent.
pub fn count_classes(table: &Table, spec: &CountSpec) -> Result<CountTable> {
    tally(table, spec, None, CountMode::Simple)
}

/// Count (category, class) pairs on an expanded table.
///
/// Record totals count distinct source records per class, so both the
/// row-based and the record-based denominators are available.
pub fn count_expanded(expansion: &Expansion, spec: &CountSpec) -> Result<CountTable> {
    tally(
        &expansion.table,
        spec,
        Some(&expansion.source_rows),
        CountMode::PostExpansion,
    )
}

fn tally(
    table: &Table,
    spec: &CountSpec,
    source_rows: Option<&[usize]>,
    mode: CountMode,
) -> Result<CountTable> {
    let class_col = table.column_index(&spec.class_column)?;
    let category_col = table.column_index(&spec.category_column)?;

    let class_filter: Option<HashSet<&str>> = spec
        .classes
        .as_ref()
        .map(|c| c.iter().map(String::as_str).collect());
    let category_filter: Option<HashSet<&str>> = spec
        .categories
        .as_ref()
        .map(|c| c.iter().map(String::as_str).collect());

    // (category, class, source record) for every row in the universe
    let mut universe: Vec<(Cow<'_, str>, Cow<'_, str>, usize)> = Vec::new();
    for record in table.records() {
        let values = record.values();
        let Some(class) = values[class_col].as_token() else {
            continue;
        };
        if let Some(filter) = &class_filter {
            if !filter.contains(&*class) {
                continue;
            }
        }
        let Some(category) = values[category_col].as_token() else {
            continue;
        };
        let source = source_rows
            .map(|s| s[record.index()])
            .unwrap_or(record.index());
        universe.push((category, class, source));
    }

    let classes: Vec<String> = match &spec.classes {
        Some(classes) => classes.clone(),
        None => universe
            .iter()
            .map(|(_, class, _)| &**class)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(String::from)
            .collect(),
    };

    let counted = |category: &str| {
        category_filter
            .as_ref()
            .map(|f| f.contains(category))
            .unwrap_or(true)
    };
    let categories: Vec<String> = universe
        .iter()
        .map(|(category, _, _)| &**category)
        .filter(|c| counted(c))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(String::from)
        .collect();

    let counts = Contingency::from_pairs(
        categories,
        classes,
        universe
            .iter()
            .map(|(category, class, _)| (&**category, &**class)),
    )?;

    let mut class_totals = vec![0u64; counts.n_cols()];
    let mut records: HashSet<(usize, usize)> = HashSet::new();
    for (_, class, source) in &universe {
        if let Some(c) = counts.col_position(class) {
            class_totals[c] += 1;
            records.insert((c, *source));
        }
    }
    let mut record_totals = vec![0u64; counts.n_cols()];
    for (c, _) in records {
        record_totals[c] += 1;
    }

    Ok(CountTable {
        mode,
        category_column: spec.category_column.clone(),
        counts,
        class_totals,
        record_totals,
    })
}

/// Count rows per class over the whole table, keyed by class.
pub(crate) fn class_sizes(
    table: &Table,
    class_column: &str,
) -> Result<(HashMap<String, u64>, u64)> {
    let mut sizes: HashMap<String, u64> = HashMap::new();
    let mut n_missing = 0;
    for value in table.column_values(class_column)? {
        match value.as_token() {
            Some(class) => *sizes.entry(class.into_owned()).or_insert(0) += 1,
            None => n_missing += 1,
        }
    }
    Ok((sizes, n_missing))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Value;
    use crate::expand::{expand_multi_value, ExpandOptions};
    use approx::assert_relative_eq;

    const ONCO: &str = "Oncogenic";
    const NEUTRAL: &str = "Likely Neutral";

    fn create_test_table() -> Table {
        Table::new(
            vec!["ONCOGENIC".into(), "DOMAIN_NAME".into()],
            vec![
                vec![ONCO.into(), "Kinase;SH2".into()],
                vec![ONCO.into(), "Kinase".into()],
                vec![NEUTRAL.into(), "Kinase".into()],
                vec![NEUTRAL.into(), Value::Missing],
                vec!["Unknown".into(), "PH".into()],
                vec![Value::Missing, "Kinase".into()],
            ],
        )
        .unwrap()
    }

    fn spec() -> CountSpec {
        CountSpec::new("ONCOGENIC", "DOMAIN_NAME").with_classes(&[ONCO, NEUTRAL])
    }

    #[test]
    fn test_post_expansion_counts() {
        let table = create_test_table();
        let expansion = expand_multi_value(&table, "DOMAIN_NAME", &ExpandOptions::new()).unwrap();
        let counts = count_expanded(&expansion, &spec()).unwrap();

        assert_eq!(counts.mode(), CountMode::PostExpansion);
        assert_eq!(counts.categories(), &["Kinase", "SH2"]);
        assert_eq!(counts.classes(), &[ONCO, NEUTRAL]);
        assert_eq!(counts.count("Kinase", ONCO), 2);
        assert_eq!(counts.count("Kinase", NEUTRAL), 1);
        assert_eq!(counts.count("SH2", ONCO), 1);
        assert_eq!(counts.count("SH2", NEUTRAL), 0);

        // row-based totals from the same universe
        assert_eq!(counts.class_total(ONCO), 3);
        assert_eq!(counts.class_total(NEUTRAL), 1);
        // two oncogenic source records
        assert_eq!(counts.record_total(ONCO), 2);
        assert_relative_eq!(counts.record_fraction("Kinase", ONCO, DivisionPolicy::Zero), 1.0);
    }

    #[test]
    fn test_conservation() {
        let table = create_test_table();
        let expansion = expand_multi_value(&table, "DOMAIN_NAME", &ExpandOptions::new()).unwrap();
        let counts = count_expanded(&expansion, &spec()).unwrap();

        for category in counts.categories() {
            let across_classes: u64 = counts
                .classes()
                .iter()
                .map(|c| counts.count(category, c))
                .sum();
            assert_eq!(across_classes, counts.category_total(category));
        }
        for class in counts.classes() {
            let across_categories: u64 =
                counts.categories().iter().map(|cat| counts.count(cat, class)).sum();
            assert_eq!(across_categories, counts.class_total(class));
        }
    }

    #[test]
    fn test_simple_counts_keep_field_whole() {
        let table = create_test_table();
        let counts = count_classes(&table, &spec()).unwrap();

        assert_eq!(counts.mode(), CountMode::Simple);
        assert_eq!(counts.categories(), &["Kinase", "Kinase;SH2"]);
        assert_eq!(counts.count("Kinase;SH2", ONCO), 1);
        assert_eq!(counts.class_total(ONCO), 2);
        assert_eq!(counts.record_total(ONCO), 2);
    }

    #[test]
    fn test_observed_classes_when_unrestricted() {
        let table = create_test_table();
        let counts = count_classes(&table, &CountSpec::new("ONCOGENIC", "DOMAIN_NAME")).unwrap();
        assert_eq!(counts.classes(), &[NEUTRAL, ONCO, "Unknown"]);
        assert_eq!(counts.count("PH", "Unknown"), 1);
    }

    #[test]
    fn test_category_allow_list_keeps_totals() {
        let table = create_test_table();
        let expansion = expand_multi_value(&table, "DOMAIN_NAME", &ExpandOptions::new()).unwrap();
        let counts = count_expanded(&expansion, &spec().with_categories(&["SH2"])).unwrap();

        assert_eq!(counts.categories(), &["SH2"]);
        assert_eq!(counts.class_total(ONCO), 3);
        assert_relative_eq!(counts.fraction("SH2", ONCO, DivisionPolicy::Zero), 1.0 / 3.0);
    }

    #[test]
    fn test_fraction_of_empty_class() {
        let table = create_test_table();
        let counts = count_classes(
            &table,
            &CountSpec::new("ONCOGENIC", "DOMAIN_NAME").with_classes(&[ONCO, "Resistance"]),
        )
        .unwrap();

        assert_eq!(counts.class_total("Resistance"), 0);
        assert_eq!(counts.fraction("Kinase", "Resistance", DivisionPolicy::Zero), 0.0);
        assert!(counts.fraction("Kinase", "Resistance", DivisionPolicy::NaN).is_nan());
        assert_eq!(counts.try_fraction("Kinase", "Resistance"), None);
    }

    #[test]
    fn test_long_form_is_dense() {
        let table = create_test_table();
        let expansion = expand_multi_value(&table, "DOMAIN_NAME", &ExpandOptions::new()).unwrap();
        let counts = count_expanded(&expansion, &spec()).unwrap();
        let long = counts.long_form(DivisionPolicy::Zero);

        assert_eq!(long.len(), 4);
        let sh2_neutral = long
            .iter()
            .find(|r| r.category == "SH2" && r.class == NEUTRAL)
            .unwrap();
        assert_eq!(sh2_neutral.count, 0);
        assert_eq!(sh2_neutral.fraction, 0.0);
        let kinase_onco = long.for_class(ONCO).find(|r| r.category == "Kinase").unwrap();
        assert_relative_eq!(kinase_onco.fraction, 2.0 / 3.0);
    }

    #[test]
    fn test_composition() {
        let table = create_test_table();
        let expansion = expand_multi_value(&table, "DOMAIN_NAME", &ExpandOptions::new()).unwrap();
        let counts = count_expanded(&expansion, &spec()).unwrap();

        assert_relative_eq!(counts.composition("Kinase", ONCO, DivisionPolicy::Zero), 2.0 / 3.0);
        let matrix = counts.composition_matrix(DivisionPolicy::Zero).unwrap();
        assert_eq!(matrix.shape(), (2, 2));
        assert_relative_eq!(matrix.get("SH2", ONCO).unwrap(), 1.0);
    }

    #[test]
    fn test_restrict_classes() {
        let table = create_test_table();
        let counts = count_classes(&table, &CountSpec::new("ONCOGENIC", "DOMAIN_NAME")).unwrap();
        let restricted = counts.restrict_classes(&[ONCO, NEUTRAL]).unwrap();
        assert_eq!(restricted.classes(), &[ONCO, NEUTRAL]);
        assert_eq!(restricted.class_total(ONCO), 2);

        let missing = counts.restrict_classes(&["Resistance"]);
        assert!(matches!(missing, Err(EnrichError::MissingClass(_))));
    }

    #[test]
    fn test_missing_columns() {
        let table = create_test_table();
        let result = count_classes(&table, &CountSpec::new("ONCOGENIC", "FEATURE_TYPE"));
        assert!(matches!(result, Err(EnrichError::MissingColumn(_))));
    }

    #[test]
    fn test_class_sizes() {
        let table = create_test_table();
        let (sizes, missing) = class_sizes(&table, "ONCOGENIC").unwrap();
        assert_eq!(sizes[ONCO], 2);
        assert_eq!(sizes["Unknown"], 1);
        assert_eq!(missing, 1);
    }
}
