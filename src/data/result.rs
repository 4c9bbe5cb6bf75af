//! Result types handed to the presentation layer.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// What a ratio evaluates to when its denominator is zero.
///
/// An empty denominator (a class with no rows, a category with no support)
/// is an expected data condition, so it resolves to a defined value instead
/// of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DivisionPolicy {
    /// Undefined fractions are 0.
    #[default]
    Zero,
    /// Undefined fractions are NaN.
    #[serde(rename = "nan")]
    NaN,
}

impl DivisionPolicy {
    /// Divide, resolving a zero denominator according to the policy.
    pub fn divide(self, numerator: u64, denominator: u64) -> f64 {
        match try_divide(numerator, denominator) {
            Some(v) => v,
            None => match self {
                DivisionPolicy::Zero => 0.0,
                DivisionPolicy::NaN => f64::NAN,
            },
        }
    }

    /// Get the descriptive name.
    pub fn name(&self) -> &'static str {
        match self {
            DivisionPolicy::Zero => "zero",
            DivisionPolicy::NaN => "nan",
        }
    }
}

/// `numerator / denominator`, or `None` when the denominator is zero.
pub fn try_divide(numerator: u64, denominator: u64) -> Option<f64> {
    (denominator > 0).then(|| numerator as f64 / denominator as f64)
}

/// One (category, class) cell of a count table in long form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassCount {
    /// Category value.
    pub category: String,
    /// Class label.
    pub class: String,
    /// Rows with this category and class.
    pub count: u64,
    /// Rows of this class in the counted universe.
    pub class_total: u64,
    /// `count / class_total`, resolved by the division policy.
    pub fraction: f64,
}

/// Long-form (category, class, count, fraction) table for grouped bar charts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassCountSet {
    /// Column the categories were taken from.
    pub category_column: String,
    /// One row per category × class cell.
    pub rows: Vec<ClassCount>,
}

impl ClassCountSet {
    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate over rows.
    pub fn iter(&self) -> impl Iterator<Item = &ClassCount> {
        self.rows.iter()
    }

    /// Rows for a single class.
    pub fn for_class<'a>(&'a self, class: &'a str) -> impl Iterator<Item = &'a ClassCount> + 'a {
        self.rows.iter().filter(move |r| r.class == class)
    }

    /// Write to a TSV file.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        writeln!(writer, "{}\tclass\tcount\tclass_total\tfraction", self.category_column)?;
        for r in &self.rows {
            writeln!(
                writer,
                "{}\t{}\t{}\t{}\t{:.6}",
                r.category, r.class, r.count, r.class_total, r.fraction
            )?;
        }

        writer.flush()?;
        Ok(())
    }
}

/// Smoothed class ratio for one category (or entity).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentEntry {
    /// Category or entity.
    pub key: String,
    /// Count in the first class.
    pub count_a: u64,
    /// Count in the second class.
    pub count_b: u64,
    /// `(count_a + 1) / (count_b + 1)`.
    pub ratio: f64,
}

/// Per-category enrichment of class A relative to class B.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentTable {
    /// Numerator class.
    pub class_a: String,
    /// Denominator class.
    pub class_b: String,
    /// Entries in key order.
    pub entries: Vec<EnrichmentEntry>,
}

impl EnrichmentTable {
    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entries.
    pub fn iter(&self) -> impl Iterator<Item = &EnrichmentEntry> {
        self.entries.iter()
    }

    /// Ratio for a key, if present.
    pub fn ratio(&self, key: &str) -> Option<f64> {
        self.entries.iter().find(|e| e.key == key).map(|e| e.ratio)
    }

    /// Entries sorted by ratio (descending); ties keep key order.
    pub fn sorted_by_ratio(&self) -> Vec<&EnrichmentEntry> {
        let mut sorted: Vec<_> = self.entries.iter().collect();
        sorted.sort_by(|a, b| b.ratio.total_cmp(&a.ratio));
        sorted
    }

    /// Write to a TSV file.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        writeln!(writer, "key\t{}\t{}\tratio", self.class_a, self.class_b)?;
        for e in &self.entries {
            writeln!(writer, "{}\t{}\t{}\t{:.6}", e.key, e.count_a, e.count_b, e.ratio)?;
        }

        writer.flush()?;
        Ok(())
    }
}

/// Smoothed class ratio for one (entity, category) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairEnrichment {
    pub entity: String,
    pub category: String,
    pub count_a: u64,
    pub count_b: u64,
    pub ratio: f64,
}

/// Pair-level enrichment of class A relative to class B.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairEnrichmentTable {
    pub class_a: String,
    pub class_b: String,
    /// Entries in (entity, category) order.
    pub entries: Vec<PairEnrichment>,
}

impl PairEnrichmentTable {
    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries for one category.
    pub fn for_category<'a>(
        &'a self,
        category: &'a str,
    ) -> impl Iterator<Item = &'a PairEnrichment> + 'a {
        self.entries.iter().filter(move |e| e.category == category)
    }

    /// Write to a TSV file.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        writeln!(writer, "entity\tcategory\t{}\t{}\tratio", self.class_a, self.class_b)?;
        for e in &self.entries {
            writeln!(
                writer,
                "{}\t{}\t{}\t{}\t{:.6}",
                e.entity, e.category, e.count_a, e.count_b, e.ratio
            )?;
        }

        writer.flush()?;
        Ok(())
    }
}

/// An entity's share of one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryShare {
    pub entity: String,
    pub category: String,
    /// Rows for this (entity, category).
    pub count: u64,
    /// Rows for this category over all entities.
    pub category_total: u64,
    /// `count / category_total`.
    pub fraction: f64,
}

/// Shares of every entity within every category, for one class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareTable {
    /// Class the counts were taken from, if restricted to one.
    pub class: Option<String>,
    /// Entries in (entity, category) order; zero-count pairs are omitted.
    pub entries: Vec<CategoryShare>,
}

impl ShareTable {
    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries for one category.
    pub fn for_category<'a>(
        &'a self,
        category: &'a str,
    ) -> impl Iterator<Item = &'a CategoryShare> + 'a {
        self.entries.iter().filter(move |e| e.category == category)
    }

    /// Distinct categories in first-seen order.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.entries
            .iter()
            .filter(|e| seen.insert(e.category.as_str()))
            .map(|e| e.category.as_str())
            .collect()
    }

    /// Sum of shares within one category.
    pub fn category_sum(&self, category: &str) -> f64 {
        self.for_category(category).map(|e| e.fraction).sum()
    }

    /// Write to a TSV file.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        writeln!(writer, "entity\tcategory\tcount\tcategory_total\tfraction")?;
        for e in &self.entries {
            writeln!(
                writer,
                "{}\t{}\t{}\t{}\t{:.6}",
                e.entity, e.category, e.count, e.category_total, e.fraction
            )?;
        }

        writer.flush()?;
        Ok(())
    }
}

/// Support and category share of one entity (e.g. hotspot fraction per gene).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySummary {
    pub entity: String,
    /// Rows of the entity falling into the category.
    pub count: u64,
    /// All rows of the entity.
    pub total: u64,
    /// `count / total`.
    pub fraction: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_division_policy() {
        assert_eq!(DivisionPolicy::Zero.divide(3, 4), 0.75);
        assert_eq!(DivisionPolicy::Zero.divide(0, 0), 0.0);
        assert!(DivisionPolicy::NaN.divide(0, 0).is_nan());
        assert_eq!(try_divide(1, 0), None);
        assert_eq!(try_divide(1, 2), Some(0.5));
    }

    #[test]
    fn test_division_policy_yaml_names() {
        let yaml = serde_yaml::to_string(&DivisionPolicy::NaN).unwrap();
        assert_eq!(yaml.trim(), "nan");
        let parsed: DivisionPolicy = serde_yaml::from_str("zero").unwrap();
        assert_eq!(parsed, DivisionPolicy::Zero);
    }

    #[test]
    fn test_sorted_by_ratio_is_stable() {
        let table = EnrichmentTable {
            class_a: "Oncogenic".into(),
            class_b: "Likely Neutral".into(),
            entries: vec![
                EnrichmentEntry { key: "A".into(), count_a: 1, count_b: 1, ratio: 1.0 },
                EnrichmentEntry { key: "B".into(), count_a: 5, count_b: 0, ratio: 6.0 },
                EnrichmentEntry { key: "C".into(), count_a: 2, count_b: 2, ratio: 1.0 },
            ],
        };
        let keys: Vec<_> = table.sorted_by_ratio().iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["B", "A", "C"]);
        assert_eq!(table.ratio("B"), Some(6.0));
        assert_eq!(table.ratio("Z"), None);
    }

    fn share(entity: &str, category: &str, count: u64, category_total: u64) -> CategoryShare {
        CategoryShare {
            entity: entity.into(),
            category: category.into(),
            count,
            category_total,
            fraction: count as f64 / category_total as f64,
        }
    }

    #[test]
    fn test_share_table_helpers() {
        let table = ShareTable {
            class: Some("Oncogenic".into()),
            entries: vec![
                share("EGFR", "Region", 3, 4),
                share("KRAS", "Binding site", 2, 2),
                share("TP53", "Region", 1, 4),
            ],
        };
        assert_eq!(table.categories(), vec!["Region", "Binding site"]);
        assert!((table.category_sum("Region") - 1.0).abs() < 1e-12);
    }
}
