//! Data profiling for annotated variant tables.

mod classes;
mod numeric;
mod presence;

pub use classes::{class_distribution, ClassDistribution, ClassFrequency};
pub use numeric::{profile_numeric, NumericProfile, NumericStats, DEFAULT_COMMON_THRESHOLD};
pub use presence::{presence_summary, PresenceRow, PresenceSummary};
