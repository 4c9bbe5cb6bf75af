//! Composable Categorical Enrichment Library
//!
//! This library provides modular primitives for measuring how categorical
//! annotations (protein domains, functional-site types, hotspot membership)
//! are distributed across classes of variants (e.g. oncogenic vs. likely
//! neutral), and for preparing the results for bar charts and heatmaps.
//!
//! # Overview
//!
//! The library is organized into composable modules:
//!
//! - **data**: Core data structures (Table, Contingency, Matrix, Results)
//! - **expand**: Splitting of multi-valued annotation columns
//! - **count**: Category × class counting, with per-entity layers
//! - **enrich**: Smoothed class ratios and category shares
//! - **rank**: Top-N selection and entity × category grids
//! - **profile**: Class distribution, presence and numeric profiles
//! - **filter**: Row filters and entity thresholds
//! - **pipeline**: Analysis composition and execution
//!
//! # Example
//!
//! ```no_run
//! use composable_enrichment::prelude::*;
//!
//! // Load data
//! let table = Table::from_tsv("variants.tsv").unwrap();
//!
//! // Run analysis
//! let report = Analysis::new("ONCOGENIC")
//!     .filter_classes(&["Oncogenic", "Likely Neutral"])
//!     .expand("DOMAIN_NAME")
//!     .count("DOMAIN_NAME")
//!     .enrich("Oncogenic", "Likely Neutral")
//!     .entity_grid("HUGO_SYMBOL", 15, 20)
//!     .run(&table)
//!     .unwrap();
//! ```

pub mod count;
pub mod data;
pub mod enrich;
pub mod error;
pub mod expand;
pub mod filter;
pub mod pipeline;
pub mod profile;
pub mod rank;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::count::{
        count_classes, count_entities, count_expanded, CountMode, CountSpec, CountTable,
        EntityCategoryCounts,
    };
    pub use crate::data::{
        CategoryShare, ClassCount, ClassCountSet, Contingency, DivisionPolicy, EnrichmentEntry,
        EnrichmentTable, EntitySummary, Matrix, PairEnrichment, PairEnrichmentTable, Record,
        ShareTable, Table, Value,
    };
    pub use crate::enrich::{
        category_shares, class_shares, enrich_categories, enrich_pairs, entity_shares,
        pair_class_fractions, smoothed_ratio, PSEUDOCOUNT,
    };
    pub use crate::error::{EnrichError, Result};
    pub use crate::expand::{
        expand_multi_value, EmptyTokenPolicy, ExpandOptions, Expansion, ExpansionSummary,
    };
    pub use crate::filter::{filter_categories, filter_classes, filter_entities};
    pub use crate::pipeline::{
        run_category_enrichment, Analysis, AnalysisConfig, AnalysisReport, AnalysisStep,
    };
    pub use crate::profile::{
        class_distribution, presence_summary, profile_numeric, ClassDistribution,
        NumericProfile, PresenceSummary, DEFAULT_COMMON_THRESHOLD,
    };
    pub use crate::rank::{
        rank_categories, rank_enrichment, rank_entities, select_grid, top_entities_per_category,
        top_n, CategoryTop, GridSelection, Metric, Ranked,
    };
}
