//! Expansion of multi-valued annotation columns into one row per token.

pub mod multi_value;

pub use multi_value::{
    expand_multi_value, AmbiguousToken, EmptyTokenPolicy, ExpandOptions, Expansion,
    ExpansionSummary, DEFAULT_DELIMITER,
};
