//! Counting of categories per class.
//!
//! Two counting modes are supported:
//! - **Simple**: one increment per row, the category field taken whole
//! - **Post-expansion**: counts over an expanded table, where one record
//!   can contribute to several categories
//!
//! Entity counts split the same rows further by a secondary key (e.g. gene)
//! with one entity × category layer per class.

pub mod class_category;
pub mod entity;

pub use class_category::{count_classes, count_expanded, CountMode, CountSpec, CountTable};
pub use entity::{count_entities, EntityCategoryCounts};
