//! Per-class (entity, category) counts.

use crate::count::CountSpec;
use crate::data::{Contingency, Table};
use crate::error::{EnrichError, Result};
use std::borrow::Cow;
use std::collections::{BTreeSet, HashSet};

/// Entity × category counts, one layer per class.
///
/// All layers share the same entity and category labels so they can be
/// summed or compared cell by cell.
#[derive(Debug, Clone)]
pub struct EntityCategoryCounts {
    entity_column: String,
    category_column: String,
    classes: Vec<String>,
    layers: Vec<Contingency>,
}

impl EntityCategoryCounts {
    #[inline]
    pub fn entity_column(&self) -> &str {
        &self.entity_column
    }

    #[inline]
    pub fn category_column(&self) -> &str {
        &self.category_column
    }

    /// Classes in universe order.
    #[inline]
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Entities in name order.
    pub fn entities(&self) -> &[String] {
        self.layers
            .first()
            .map(|l| l.row_labels())
            .unwrap_or(&[])
    }

    /// Categories in name order.
    pub fn categories(&self) -> &[String] {
        self.layers
            .first()
            .map(|l| l.col_labels())
            .unwrap_or(&[])
    }

    /// Entity × category counts for one class.
    pub fn layer(&self, class: &str) -> Result<&Contingency> {
        self.classes
            .iter()
            .position(|c| c == class)
            .map(|i| &self.layers[i])
            .ok_or_else(|| EnrichError::MissingClass(class.to_string()))
    }

    /// Sum of the layers of the given classes; `None` sums every class.
    ///
    /// With no layers to sum (no class observed, or an empty class list) the
    /// result is an all-zero table over the shared labels.
    pub fn volume(&self, classes: Option<&[&str]>) -> Result<Contingency> {
        let layers: Vec<&Contingency> = match classes {
            Some(classes) => classes
                .iter()
                .map(|c| self.layer(c))
                .collect::<Result<_>>()?,
            None => self.layers.iter().collect(),
        };
        if layers.is_empty() {
            return Contingency::from_pairs(
                self.entities().to_vec(),
                self.categories().to_vec(),
                std::iter::empty(),
            );
        }
        Contingency::sum(layers)
    }
}

/// Count (entity, category) pairs separately for each class.
///
/// Rows are skipped when the class is missing or outside the class universe,
/// or when the entity or category is missing. The category allow-list from
/// `spec` applies.
///
/// # Arguments
/// * `table` - Input table, typically an expanded one
/// * `entity_column` - Column holding the entity (e.g. gene symbol)
/// * `spec` - Class and category columns, class universe, allow-list
pub fn count_entities(
    table: &Table,
    entity_column: &str,
    spec: &CountSpec,
) -> Result<EntityCategoryCounts> {
    let class_col = table.column_index(&spec.class_column)?;
    let category_col = table.column_index(&spec.category_column)?;
    let entity_col = table.column_index(entity_column)?;

    let class_filter: Option<HashSet<&str>> = spec
        .classes
        .as_ref()
        .map(|c| c.iter().map(String::as_str).collect());
    let category_filter: Option<HashSet<&str>> = spec
        .categories
        .as_ref()
        .map(|c| c.iter().map(String::as_str).collect());

    let mut observed: Vec<(Cow<'_, str>, Cow<'_, str>, Cow<'_, str>)> = Vec::new();
    for record in table.records() {
        let values = record.values();
        let (Some(class), Some(entity), Some(category)) = (
            values[class_col].as_token(),
            values[entity_col].as_token(),
            values[category_col].as_token(),
        ) else {
            continue;
        };
        if class_filter.as_ref().is_some_and(|f| !f.contains(&*class)) {
            continue;
        }
        if category_filter.as_ref().is_some_and(|f| !f.contains(&*category)) {
            continue;
        }
        observed.push((class, entity, category));
    }

    let classes: Vec<String> = match &spec.classes {
        Some(classes) => classes.clone(),
        None => sorted_labels(observed.iter().map(|(class, _, _)| &**class)),
    };
    let entities = sorted_labels(observed.iter().map(|(_, entity, _)| &**entity));
    let categories = sorted_labels(observed.iter().map(|(_, _, category)| &**category));

    let layers = classes
        .iter()
        .map(|class| {
            Contingency::from_pairs(
                entities.clone(),
                categories.clone(),
                observed
                    .iter()
                    .filter(|(c, _, _)| **c == **class)
                    .map(|(_, entity, category)| (&**entity, &**category)),
            )
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(EntityCategoryCounts {
        entity_column: entity_column.to_string(),
        category_column: spec.category_column.clone(),
        classes,
        layers,
    })
}

fn sorted_labels<'a, I: Iterator<Item = &'a str>>(labels: I) -> Vec<String> {
    labels
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Value;

    fn create_test_table() -> Table {
        Table::new(
            vec!["ONCOGENIC".into(), "HUGO_SYMBOL".into(), "FEATURE_TYPE".into()],
            vec![
                vec!["Oncogenic".into(), "EGFR".into(), "Region".into()],
                vec!["Oncogenic".into(), "EGFR".into(), "Region".into()],
                vec!["Oncogenic".into(), "KRAS".into(), "Binding site".into()],
                vec!["Likely Neutral".into(), "EGFR".into(), "Region".into()],
                vec!["Likely Neutral".into(), "TP53".into(), "Site".into()],
                vec!["Likely Neutral".into(), Value::Missing, "Site".into()],
                vec!["Unknown".into(), "BRAF".into(), "Region".into()],
            ],
        )
        .unwrap()
    }

    fn spec() -> CountSpec {
        CountSpec::new("ONCOGENIC", "FEATURE_TYPE").with_classes(&["Oncogenic", "Likely Neutral"])
    }

    #[test]
    fn test_layers_share_labels() {
        let counts = count_entities(&create_test_table(), "HUGO_SYMBOL", &spec()).unwrap();

        assert_eq!(counts.entities(), &["EGFR", "KRAS", "TP53"]);
        assert_eq!(counts.categories(), &["Binding site", "Region", "Site"]);

        let onco = counts.layer("Oncogenic").unwrap();
        assert_eq!(onco.count("EGFR", "Region"), 2);
        assert_eq!(onco.count("TP53", "Site"), 0);
        assert_eq!(onco.n_rows(), 3);

        let neutral = counts.layer("Likely Neutral").unwrap();
        assert_eq!(neutral.count("TP53", "Site"), 1);
        assert_eq!(neutral.total(), 2);
    }

    #[test]
    fn test_volume() {
        let counts = count_entities(&create_test_table(), "HUGO_SYMBOL", &spec()).unwrap();

        let all = counts.volume(None).unwrap();
        assert_eq!(all.count("EGFR", "Region"), 3);
        assert_eq!(all.total(), 5);

        let onco = counts.volume(Some(&["Oncogenic"])).unwrap();
        assert_eq!(onco.total(), 3);
    }

    #[test]
    fn test_volume_of_empty_universe() {
        let table = Table::new(
            vec!["ONCOGENIC".into(), "HUGO_SYMBOL".into(), "FEATURE_TYPE".into()],
            vec![vec!["Oncogenic".into(), "EGFR".into(), Value::Missing]],
        )
        .unwrap();
        let counts = count_entities(
            &table,
            "HUGO_SYMBOL",
            &CountSpec::new("ONCOGENIC", "FEATURE_TYPE"),
        )
        .unwrap();
        assert!(counts.classes().is_empty());

        let volume = counts.volume(None).unwrap();
        assert_eq!((volume.n_rows(), volume.n_cols()), (0, 0));
        assert_eq!(volume.total(), 0);
    }

    #[test]
    fn test_missing_class_layer() {
        let counts = count_entities(&create_test_table(), "HUGO_SYMBOL", &spec()).unwrap();
        assert!(matches!(counts.layer("Unknown"), Err(EnrichError::MissingClass(_))));
        assert!(counts.volume(Some(&["Unknown"])).is_err());
    }

    #[test]
    fn test_observed_classes() {
        let counts = count_entities(
            &create_test_table(),
            "HUGO_SYMBOL",
            &CountSpec::new("ONCOGENIC", "FEATURE_TYPE").with_categories(&["Region"]),
        )
        .unwrap();
        assert_eq!(counts.classes(), &["Likely Neutral", "Oncogenic", "Unknown"]);
        assert_eq!(counts.categories(), &["Region"]);
        assert_eq!(counts.layer("Unknown").unwrap().count("BRAF", "Region"), 1);
    }

    #[test]
    fn test_missing_entity_column() {
        let result = count_entities(&create_test_table(), "GENE", &spec());
        assert!(matches!(result, Err(EnrichError::MissingColumn(_))));
    }
}
