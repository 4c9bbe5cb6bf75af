//! Threshold filtering of per-entity summaries.

use crate::data::EntitySummary;
use crate::error::{EnrichError, Result};

/// Keep entities with enough support and a high enough share.
///
/// An entity passes when `total >= min_total` and
/// `fraction >= min_fraction`; undefined (NaN) fractions never pass. The
/// result is ordered by total, largest first, ties keeping input order.
///
/// # Arguments
/// * `summaries` - Per-entity counts, e.g. from `entity_shares`
/// * `min_total` - Minimum rows of the entity
/// * `min_fraction` - Minimum share (0.0 to 1.0)
pub fn filter_entities(
    summaries: &[EntitySummary],
    min_total: u64,
    min_fraction: f64,
) -> Result<Vec<EntitySummary>> {
    if !(0.0..=1.0).contains(&min_fraction) {
        return Err(EnrichError::InvalidParameter(
            "min_fraction must be between 0 and 1".to_string(),
        ));
    }

    let mut kept: Vec<EntitySummary> = summaries
        .iter()
        .filter(|s| s.total >= min_total && s.fraction >= min_fraction)
        .cloned()
        .collect();
    kept.sort_by(|a, b| b.total.cmp(&a.total));
    Ok(kept)
}
