//! Two-axis (entity × category) grids for heatmaps.

use crate::data::{Contingency, Matrix, ShareTable};
use crate::error::Result;
use crate::rank::top::{keys, rank_entities, top_n, Ranked};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Rows and columns chosen for a heatmap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridSelection {
    /// Top categories by volume (columns).
    pub categories: Vec<Ranked>,
    /// Top entities by volume over the selected categories (rows).
    pub entities: Vec<Ranked>,
}

impl GridSelection {
    /// Selected category labels, in rank order.
    pub fn category_labels(&self) -> Vec<String> {
        keys(&self.categories)
    }

    /// Selected entity labels, in rank order.
    pub fn entity_labels(&self) -> Vec<String> {
        keys(&self.entities)
    }

    /// Raw counts of `layer` over the grid.
    pub fn count_matrix(&self, layer: &Contingency) -> Result<Matrix> {
        let cells: Vec<(&str, &str, f64)> = layer
            .iter_nonzero()
            .map(|(r, c, v)| {
                (
                    layer.row_labels()[r].as_str(),
                    layer.col_labels()[c].as_str(),
                    v as f64,
                )
            })
            .collect();
        Matrix::build(self.entity_labels(), self.category_labels(), cells)
    }

    /// Category shares of `layer` over the grid.
    ///
    /// Shares are taken against each category's total over *all* entities,
    /// so a column of the grid sums to at most 1.
    pub fn share_matrix(&self, layer: &Contingency) -> Result<Matrix> {
        let totals = layer.col_sums();
        let cells: Vec<(&str, &str, f64)> = layer
            .iter_nonzero()
            .map(|(r, c, v)| {
                (
                    layer.row_labels()[r].as_str(),
                    layer.col_labels()[c].as_str(),
                    v as f64 / totals[c] as f64,
                )
            })
            .collect();
        Matrix::build(self.entity_labels(), self.category_labels(), cells)
    }

    /// Cut a full entity × category matrix down to the grid.
    pub fn restrict(&self, matrix: &Matrix) -> Result<Matrix> {
        let entities = self.entity_labels();
        let categories = self.category_labels();
        let mut cells = Vec::with_capacity(entities.len() * categories.len());
        for entity in &entities {
            for category in &categories {
                if let Some(value) = matrix.get(entity, category) {
                    cells.push((entity.as_str(), category.as_str(), value));
                }
            }
        }
        Matrix::build(entities.clone(), categories.clone(), cells)
    }
}

/// Pick the top categories by column volume, then the top entities by
/// volume restricted to those categories.
///
/// Both axes are ranked from the same contingency so the grid is consistent.
///
/// # Arguments
/// * `volume` - Entity × category counts (typically summed over classes)
/// * `n_categories` - Number of columns
/// * `n_entities` - Number of rows
pub fn select_grid(volume: &Contingency, n_categories: usize, n_entities: usize) -> GridSelection {
    let category_totals = volume.col_sums();
    let categories = top_n(
        volume
            .col_labels()
            .iter()
            .cloned()
            .zip(category_totals.into_iter().map(|t| t as f64)),
        n_categories,
    );
    let entities = rank_entities(volume, Some(&keys(&categories)), n_entities);

    GridSelection {
        categories,
        entities,
    }
}

/// Top entities of one category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryTop {
    pub category: String,
    /// Entities by share, largest first.
    pub entities: Vec<Ranked>,
}

/// For every category, the `k` entities with the largest share.
///
/// Categories are processed in parallel; the result is in category name
/// order.
pub fn top_entities_per_category(shares: &ShareTable, k: usize) -> Vec<CategoryTop> {
    let mut categories = shares.categories();
    categories.sort_unstable();

    categories
        .par_iter()
        .map(|&category| CategoryTop {
            category: category.to_string(),
            entities: top_n(
                shares
                    .for_category(category)
                    .map(|s| (s.entity.clone(), s.fraction)),
                k,
            ),
        })
        .collect()
}
