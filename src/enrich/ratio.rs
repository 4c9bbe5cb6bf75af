//! Smoothed class ratios.

use crate::count::{CountTable, EntityCategoryCounts};
use crate::data::{
    DivisionPolicy, EnrichmentEntry, EnrichmentTable, Matrix, PairEnrichment, PairEnrichmentTable,
};
use crate::error::{EnrichError, Result};
use std::collections::BTreeMap;

/// Pseudocount added to both sides of a class ratio (Laplace smoothing).
pub const PSEUDOCOUNT: f64 = 1.0;

/// `(a + 1) / (b + 1)`.
///
/// Always strictly positive and finite; exactly 1.0 when `a == b`.
#[inline]
pub fn smoothed_ratio(a: u64, b: u64) -> f64 {
    (a as f64 + PSEUDOCOUNT) / (b as f64 + PSEUDOCOUNT)
}

fn check_pair(class_a: &str, class_b: &str) -> Result<()> {
    if class_a == class_b {
        return Err(EnrichError::InvalidParameter(format!(
            "Enrichment needs two different classes, got '{}' twice",
            class_a
        )));
    }
    Ok(())
}

/// Enrichment of `class_a` over `class_b` for every category.
///
/// Only categories seen in at least one of the two classes are scored.
///
/// # Arguments
/// * `counts` - Category × class counts
/// * `class_a` - Numerator class (e.g. "Oncogenic")
/// * `class_b` - Denominator class (e.g. "Likely Neutral")
///
/// # Returns
/// An `EnrichmentTable` in category order.
pub fn enrich_categories(
    counts: &CountTable,
    class_a: &str,
    class_b: &str,
) -> Result<EnrichmentTable> {
    check_pair(class_a, class_b)?;
    for class in [class_a, class_b] {
        if !counts.has_class(class) {
            return Err(EnrichError::MissingClass(class.to_string()));
        }
    }

    let entries = counts
        .categories()
        .iter()
        .filter_map(|category| {
            let count_a = counts.count(category, class_a);
            let count_b = counts.count(category, class_b);
            (count_a + count_b > 0).then(|| EnrichmentEntry {
                key: category.clone(),
                count_a,
                count_b,
                ratio: smoothed_ratio(count_a, count_b),
            })
        })
        .collect();

    Ok(EnrichmentTable {
        class_a: class_a.to_string(),
        class_b: class_b.to_string(),
        entries,
    })
}

/// Enrichment of `class_a` over `class_b` for every (entity, category) pair
/// with support in either class.
pub fn enrich_pairs(
    counts: &EntityCategoryCounts,
    class_a: &str,
    class_b: &str,
) -> Result<PairEnrichmentTable> {
    check_pair(class_a, class_b)?;
    let entities = counts.entities();
    let categories = counts.categories();

    let entries = paired_counts(counts, class_a, class_b)?
        .into_iter()
        .map(|((r, c), (count_a, count_b))| PairEnrichment {
            entity: entities[r].clone(),
            category: categories[c].clone(),
            count_a,
            count_b,
            ratio: smoothed_ratio(count_a, count_b),
        })
        .collect();

    Ok(PairEnrichmentTable {
        class_a: class_a.to_string(),
        class_b: class_b.to_string(),
        entries,
    })
}

/// `count_a / (count_a + count_b)` for every (entity, category) cell.
///
/// Cells without support in either class resolve through `policy`.
pub fn pair_class_fractions(
    counts: &EntityCategoryCounts,
    class_a: &str,
    class_b: &str,
    policy: DivisionPolicy,
) -> Result<Matrix> {
    check_pair(class_a, class_b)?;
    let entities = counts.entities();
    let categories = counts.categories();
    let supported = paired_counts(counts, class_a, class_b)?;

    let mut cells = Vec::with_capacity(entities.len() * categories.len());
    for (r, entity) in entities.iter().enumerate() {
        for (c, category) in categories.iter().enumerate() {
            let (count_a, count_b) = supported.get(&(r, c)).copied().unwrap_or((0, 0));
            cells.push((
                entity.as_str(),
                category.as_str(),
                policy.divide(count_a, count_a + count_b),
            ));
        }
    }

    Matrix::build(entities.to_vec(), categories.to_vec(), cells)
}

/// Non-zero cells of two class layers, keyed by (entity, category) position.
fn paired_counts(
    counts: &EntityCategoryCounts,
    class_a: &str,
    class_b: &str,
) -> Result<BTreeMap<(usize, usize), (u64, u64)>> {
    let layer_a = counts.layer(class_a)?;
    let layer_b = counts.layer(class_b)?;

    let mut cells: BTreeMap<(usize, usize), (u64, u64)> = BTreeMap::new();
    for (r, c, v) in layer_a.iter_nonzero() {
        cells.entry((r, c)).or_default().0 += v;
    }
    for (r, c, v) in layer_b.iter_nonzero() {
        cells.entry((r, c)).or_default().1 += v;
    }
    cells.retain(|_, (a, b)| *a + *b > 0);
    Ok(cells)
}
