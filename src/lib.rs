//! folio — typed catalog access layer for headless-content sites.
//!
//! Fetches collections of typed content items (articles, tools,
//! multi-step courses) from an external content source and caches them
//! with stale-while-revalidate semantics and per-key request coalescing.
//! Pure derivation functions compute language-filtered views, ordered
//! curricula, and "additional resources" selections from cached
//! collections.
//!
//! The content source is consumed through [`source::ContentSource`];
//! this crate owns no transport.

pub mod catalog;
pub mod config;
pub mod curriculum;
pub mod domain;
pub mod error;
pub mod source;
pub mod telemetry;

pub use catalog::{
    CacheEntry, CachedValue, CatalogService, CatalogStore, Clock, ManualClock, ParamSet, QueryKey,
    QueryOutcome, QueryState, StalenessPolicy, SystemClock, TtlRule,
};
pub use config::{CatalogSettings, SettingsError};
pub use curriculum::{additional_resources, filter_by_language, ordered_steps};
pub use domain::{Category, ContentItem, Language, Operation, ResourceType};
pub use error::CatalogError;
pub use source::{ContentSource, ItemPage, ListParams, SortDirection, SortField, SourceError};
