//! Shares of entities within categories.
//!
//! A share is measured along a different axis from the class ratio: it asks
//! how much of one category's volume comes from a single entity.

use crate::count::EntityCategoryCounts;
use crate::data::{CategoryShare, Contingency, DivisionPolicy, EntitySummary, ShareTable};
use crate::error::Result;

/// Share of every entity within every category of one layer.
///
/// `fraction = count(entity, category) / Σ_entities count(*, category)`, so
/// the shares of one category sum to 1. Zero-count pairs are omitted.
pub fn category_shares(layer: &Contingency) -> ShareTable {
    let category_totals = layer.col_sums();
    let entities = layer.row_labels();
    let categories = layer.col_labels();

    let entries = layer
        .iter_nonzero()
        .map(|(r, c, count)| CategoryShare {
            entity: entities[r].clone(),
            category: categories[c].clone(),
            count,
            category_total: category_totals[c],
            fraction: count as f64 / category_totals[c] as f64,
        })
        .collect();

    ShareTable {
        class: None,
        entries,
    }
}

/// Category shares restricted to one class.
pub fn class_shares(counts: &EntityCategoryCounts, class: &str) -> Result<ShareTable> {
    let mut shares = category_shares(counts.layer(class)?);
    shares.class = Some(class.to_string());
    Ok(shares)
}

/// Share of each entity's rows that fall into `category`.
///
/// Used for views such as the hotspot fraction per gene. Entities without
/// rows in this layer resolve through `policy`; an unknown category gives a
/// count of 0 for every entity.
pub fn entity_shares(
    layer: &Contingency,
    category: &str,
    policy: DivisionPolicy,
) -> Vec<EntitySummary> {
    let totals = layer.row_sums();
    let column = layer.col_position(category);

    layer
        .row_labels()
        .iter()
        .enumerate()
        .map(|(r, entity)| {
            let count = column.map(|c| layer.get(r, c)).unwrap_or(0);
            EntitySummary {
                entity: entity.clone(),
                count,
                total: totals[r],
                fraction: policy.divide(count, totals[r]),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::count::{count_entities, CountSpec};
    use crate::data::Table;
    use approx::assert_relative_eq;

    fn create_test_table() -> Table {
        let rows = [
            ("Oncogenic", "EGFR", "Region"),
            ("Oncogenic", "EGFR", "Region"),
            ("Oncogenic", "EGFR", "Region"),
            ("Oncogenic", "TP53", "Region"),
            ("Oncogenic", "KRAS", "Binding site"),
            ("Oncogenic", "KRAS", "Binding site"),
            ("Oncogenic", "EGFR", "Binding site"),
            ("Likely Neutral", "BRCA2", "Region"),
        ];
        Table::new(
            vec!["ONCOGENIC".into(), "HUGO_SYMBOL".into(), "FEATURE_TYPE".into()],
            rows.iter()
                .map(|(class, gene, feature)| {
                    vec![(*class).into(), (*gene).into(), (*feature).into()]
                })
                .collect(),
        )
        .unwrap()
    }

    fn create_test_counts() -> EntityCategoryCounts {
        count_entities(
            &create_test_table(),
            "HUGO_SYMBOL",
            &CountSpec::new("ONCOGENIC", "FEATURE_TYPE"),
        )
        .unwrap()
    }

    #[test]
    fn test_shares_sum_to_one() {
        let counts = create_test_counts();
        let shares = class_shares(&counts, "Oncogenic").unwrap();

        assert_eq!(shares.class.as_deref(), Some("Oncogenic"));
        for category in shares.categories() {
            assert_relative_eq!(shares.category_sum(category), 1.0);
        }
        let egfr_region = shares
            .for_category("Region")
            .find(|s| s.entity == "EGFR")
            .unwrap();
        assert_eq!(egfr_region.count, 3);
        assert_eq!(egfr_region.category_total, 4);
        assert_relative_eq!(egfr_region.fraction, 0.75);
    }

    #[test]
    fn test_zero_pairs_omitted() {
        let counts = create_test_counts();
        let shares = class_shares(&counts, "Oncogenic").unwrap();
        // BRCA2 only appears in the neutral class
        assert!(shares.entries.iter().all(|s| s.entity != "BRCA2"));
        assert_eq!(shares.len(), 4);
    }

    #[test]
    fn test_entity_shares() {
        let counts = create_test_counts();
        let layer = counts.layer("Oncogenic").unwrap();
        let summaries = entity_shares(layer, "Binding site", DivisionPolicy::Zero);

        let egfr = summaries.iter().find(|s| s.entity == "EGFR").unwrap();
        assert_eq!((egfr.count, egfr.total), (1, 4));
        assert_relative_eq!(egfr.fraction, 0.25);

        let brca2 = summaries.iter().find(|s| s.entity == "BRCA2").unwrap();
        assert_eq!(brca2.total, 0);
        assert_eq!(brca2.fraction, 0.0);

        let nan = entity_shares(layer, "Binding site", DivisionPolicy::NaN);
        assert!(nan.iter().find(|s| s.entity == "BRCA2").unwrap().fraction.is_nan());
    }

    #[test]
    fn test_unknown_category_shares() {
        let counts = create_test_counts();
        let layer = counts.layer("Oncogenic").unwrap();
        let summaries = entity_shares(layer, "Motif", DivisionPolicy::Zero);
        assert!(summaries.iter().all(|s| s.count == 0));
    }
}
