//! Metric descriptions for the catalog counter family.
//!
//! Recorder installation is left to the embedding application; calling
//! [`describe_metrics`] is idempotent and cheap, so services call it at
//! construction time without coordination.

use std::sync::Once;

use metrics::{Unit, describe_counter};

static METRIC_DESCRIPTIONS: Once = Once::new();

pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "folio_catalog_hit_total",
            Unit::Count,
            "Total number of fresh cache hits."
        );
        describe_counter!(
            "folio_catalog_stale_hit_total",
            Unit::Count,
            "Total number of stale cache hits served while revalidating."
        );
        describe_counter!(
            "folio_catalog_miss_total",
            Unit::Count,
            "Total number of cache misses that issued a source request."
        );
        describe_counter!(
            "folio_catalog_coalesced_total",
            Unit::Count,
            "Total number of callers attached to an already in-flight request."
        );
        describe_counter!(
            "folio_catalog_revalidate_total",
            Unit::Count,
            "Total number of background revalidations scheduled."
        );
        describe_counter!(
            "folio_catalog_evict_total",
            Unit::Count,
            "Total number of entries evicted by capacity or retention."
        );
    });
}
