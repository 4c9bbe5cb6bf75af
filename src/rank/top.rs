//! Top-N selection of categories and entities.

use crate::count::CountTable;
use crate::data::{Contingency, DivisionPolicy, EnrichmentTable};
use crate::error::{EnrichError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A key with its ranking value and 1-based rank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranked {
    pub key: String,
    pub value: f64,
    pub rank: usize,
}

/// Descending order with NaN last.
fn descending(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

/// The `n` items with the largest values.
///
/// The sort is stable: tied items keep their input order, so inputs given in
/// name order break ties by name. NaN values rank last. Asking for more
/// items than exist returns all of them.
///
/// # Arguments
/// * `items` - (key, value) pairs
/// * `n` - Number of items to keep
pub fn top_n<I>(items: I, n: usize) -> Vec<Ranked>
where
    I: IntoIterator<Item = (String, f64)>,
{
    let mut items: Vec<(String, f64)> = items.into_iter().collect();
    items.sort_by(|a, b| descending(a.1, b.1));
    items
        .into_iter()
        .take(n)
        .enumerate()
        .map(|(i, (key, value))| Ranked {
            key,
            value,
            rank: i + 1,
        })
        .collect()
}

/// Value used to rank the categories of a count table.
///
/// In YAML configs the variants are tags: `total`, `!count Oncogenic`,
/// `!fraction Oncogenic`, `!ratio {class_a: Oncogenic, class_b: Likely Neutral}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Rows over all classes.
    Total,
    /// Rows of one class.
    Count(String),
    /// Fraction of one class's rows.
    Fraction(String),
    /// Smoothed ratio of one class over another.
    Ratio { class_a: String, class_b: String },
}

impl Metric {
    /// Get the descriptive name.
    pub fn name(&self) -> String {
        match self {
            Metric::Total => "total".to_string(),
            Metric::Count(class) => format!("count:{}", class),
            Metric::Fraction(class) => format!("fraction:{}", class),
            Metric::Ratio { class_a, class_b } => format!("ratio:{}/{}", class_a, class_b),
        }
    }
}

/// Rank the categories of a count table by `metric`.
///
/// Ratios only cover categories with support in either class.
pub fn rank_categories(counts: &CountTable, metric: &Metric, n: usize) -> Result<Vec<Ranked>> {
    let require = |class: &str| {
        if counts.has_class(class) {
            Ok(())
        } else {
            Err(EnrichError::MissingClass(class.to_string()))
        }
    };

    let scores: Vec<(String, f64)> = match metric {
        Metric::Total => counts
            .categories()
            .iter()
            .map(|c| (c.clone(), counts.category_total(c) as f64))
            .collect(),
        Metric::Count(class) => {
            require(class)?;
            counts
                .categories()
                .iter()
                .map(|c| (c.clone(), counts.count(c, class) as f64))
                .collect()
        }
        Metric::Fraction(class) => {
            require(class)?;
            counts
                .categories()
                .iter()
                .map(|c| (c.clone(), counts.fraction(c, class, DivisionPolicy::Zero)))
                .collect()
        }
        Metric::Ratio { class_a, class_b } => {
            let enrichment = crate::enrich::enrich_categories(counts, class_a, class_b)?;
            return Ok(rank_enrichment(&enrichment, n));
        }
    };

    Ok(top_n(scores, n))
}

/// The `n` keys of an enrichment table with the highest ratios.
pub fn rank_enrichment(enrichment: &EnrichmentTable, n: usize) -> Vec<Ranked> {
    top_n(enrichment.iter().map(|e| (e.key.clone(), e.ratio)), n)
}

/// Rank entities (rows of `volume`) by their total over the given
/// categories; `None` uses every category. Unknown categories are ignored.
///
/// With a category subset, entities without any count in those categories
/// are not ranked.
pub fn rank_entities(
    volume: &Contingency,
    categories: Option<&[String]>,
    n: usize,
) -> Vec<Ranked> {
    let (totals, supported_only) = match categories {
        Some(categories) => {
            let cols: Vec<usize> = categories
                .iter()
                .filter_map(|c| volume.col_position(c))
                .collect();
            (volume.row_sums_over(&cols), true)
        }
        None => (volume.row_sums(), false),
    };

    top_n(
        volume
            .row_labels()
            .iter()
            .cloned()
            .zip(totals)
            .filter(|&(_, total)| !supported_only || total > 0)
            .map(|(entity, total)| (entity, total as f64)),
        n,
    )
}

/// Keys of a ranking, in rank order.
pub fn keys(ranked: &[Ranked]) -> Vec<String> {
    ranked.iter().map(|r| r.key.clone()).collect()
}
