//! Analysis composition and execution for categorical enrichment.

mod runner;

pub use runner::{
    run_category_enrichment, Analysis, AnalysisConfig, AnalysisReport, AnalysisStep,
    CategoryRanking, EntityTopReport, GridReport,
};
