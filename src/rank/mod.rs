//! Ranking and matrix building for presentation.
//!
//! Top-N selection of categories and entities, and the dense entity ×
//! category grids behind heatmaps.

pub mod grid;
pub mod top;

pub use grid::{select_grid, top_entities_per_category, CategoryTop, GridSelection};
pub use top::{keys, rank_categories, rank_enrichment, rank_entities, top_n, Metric, Ranked};
