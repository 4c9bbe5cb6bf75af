//! Data structures for categorical enrichment analysis.

mod contingency;
mod matrix;
mod result;
mod table;

pub use contingency::Contingency;
pub use matrix::Matrix;
pub use result::{
    try_divide, CategoryShare, ClassCount, ClassCountSet, DivisionPolicy, EnrichmentEntry,
    EnrichmentTable, EntitySummary, PairEnrichment, PairEnrichmentTable, ShareTable,
};
pub use table::{Record, Table, Value, MISSING_TOKENS};
