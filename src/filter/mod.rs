//! Filtering primitives for tables and entity summaries.

pub mod entities;
pub mod rows;

pub use entities::filter_entities;
pub use rows::{filter_categories, filter_classes};
