//! Guidance metrics.
//!
//! - Cache lookups by result
//! - Fallback suggestion sets by reason
//! - Tilt corrections by deciding detector

use metrics::counter;

/// Metric name constants for consistency.
pub mod names {
    /// Cache lookups by result (hit|miss).
    pub const CACHE_LOOKUPS_TOTAL: &str = "shotcoach_cache_lookups_total";

    /// Fixed fallback sets served, by reason.
    pub const FALLBACK_TOTAL: &str = "shotcoach_fallback_total";

    /// Tilt corrections inserted at step 1, by source (geometry|secondary).
    pub const TILT_CORRECTIONS_TOTAL: &str = "shotcoach_tilt_corrections_total";
}

pub fn record_cache_lookup(hit: bool) {
    counter!(
        names::CACHE_LOOKUPS_TOTAL,
        "result" => if hit { "hit" } else { "miss" }
    )
    .increment(1);
}

pub fn record_fallback(reason: &'static str) {
    counter!(names::FALLBACK_TOTAL, "reason" => reason).increment(1);
}

pub fn record_tilt_correction(source: &'static str) {
    counter!(names::TILT_CORRECTIONS_TOTAL, "source" => source).increment(1);
}
