//! Enrichment scoring.
//!
//! - [`ratio`]: Laplace-smoothed ratio of counts between two classes, per
//!   category or per (entity, category) pair
//! - [`share`]: share of a category's volume contributed by each entity

pub mod ratio;
pub mod share;

pub use ratio::{
    enrich_categories, enrich_pairs, pair_class_fractions, smoothed_ratio, PSEUDOCOUNT,
};
pub use share::{category_shares, class_shares, entity_shares};
