//! Catalog access layer.
//!
//! Wraps the external content source in a caching and deduplication
//! policy:
//!
//! - **Keys**: canonical, insertion-order-invariant request identities
//! - **Policy**: per-resource staleness and retention windows
//! - **Store**: the process-wide cache entry table
//! - **Service**: stale-while-revalidate reads with per-key coalescing
//!
//! ## Configuration
//!
//! Behavior is controlled via `folio.toml`:
//!
//! ```toml
//! cache_capacity = 500
//! content_stale_secs = 300
//! taxonomy_stale_secs = 3600
//! # ... see config.rs for all options
//! ```

mod clock;
mod keys;
mod policy;
mod service;
mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use keys::{ParamSet, QueryKey};
pub use policy::{StalenessPolicy, TtlRule};
pub use service::{CatalogService, QueryOutcome, QueryState};
pub use store::{CacheEntry, CachedValue, CatalogStore};
