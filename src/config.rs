//! Configuration layer: typed settings with layered precedence
//! (file → environment).

use std::num::NonZeroUsize;
use std::path::Path;

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use time::Duration;

use crate::catalog::{StalenessPolicy, TtlRule};

const LOCAL_CONFIG_BASENAME: &str = "folio";
const ENV_PREFIX: &str = "FOLIO";

const DEFAULT_CACHE_CAPACITY: usize = 500;
const DEFAULT_RETRY_ATTEMPTS: u32 = 0;
const DEFAULT_CONTENT_STALE_SECS: u64 = 300;
const DEFAULT_CONTENT_EVICT_SECS: u64 = 1_800;
const DEFAULT_TAXONOMY_STALE_SECS: u64 = 3_600;
const DEFAULT_TAXONOMY_EVICT_SECS: u64 = 86_400;

/// Catalog configuration from `folio.toml` and `FOLIO_*` environment
/// variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    /// Maximum entries in the cache table.
    pub cache_capacity: usize,
    /// Immediate re-issues after a transport failure. The
    /// stale-while-revalidate design already absorbs transient failures,
    /// so the default is no retries.
    pub retry_attempts: u32,
    /// Staleness window for content lists and details, in seconds.
    pub content_stale_secs: u64,
    /// Retention window for content lists and details, in seconds.
    pub content_evict_secs: u64,
    /// Staleness window for taxonomy data, in seconds.
    pub taxonomy_stale_secs: u64,
    /// Retention window for taxonomy data, in seconds.
    pub taxonomy_evict_secs: u64,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            content_stale_secs: DEFAULT_CONTENT_STALE_SECS,
            content_evict_secs: DEFAULT_CONTENT_EVICT_SECS,
            taxonomy_stale_secs: DEFAULT_TAXONOMY_STALE_SECS,
            taxonomy_evict_secs: DEFAULT_TAXONOMY_EVICT_SECS,
        }
    }
}

impl CatalogSettings {
    /// Load settings with layered precedence: an optional TOML file, then
    /// `FOLIO_*` environment variables. With no explicit path, a local
    /// `folio.toml` is read when present.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let mut builder = Config::builder();
        builder = match path {
            Some(path) => builder.add_source(File::from(path)),
            None => builder.add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false)),
        };
        builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true));
        let settings = builder.build()?.try_deserialize()?;
        Ok(settings)
    }

    /// Cache capacity as NonZeroUsize, clamping to 1 if zero.
    pub fn cache_capacity_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.cache_capacity).unwrap_or(NonZeroUsize::MIN)
    }
}

impl From<&CatalogSettings> for StalenessPolicy {
    fn from(settings: &CatalogSettings) -> Self {
        StalenessPolicy::with_rules(
            TtlRule {
                stale_after: seconds(settings.content_stale_secs),
                evict_after: seconds(settings.content_evict_secs),
            },
            TtlRule {
                stale_after: seconds(settings.taxonomy_stale_secs),
                evict_after: seconds(settings.taxonomy_evict_secs),
            },
        )
    }
}

fn seconds(secs: u64) -> Duration {
    Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX))
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to load catalog settings: {0}")]
    Load(#[from] config::ConfigError),
}
