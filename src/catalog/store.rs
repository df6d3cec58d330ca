//! Cache entry table.
//!
//! One table per process lifetime, owned exclusively by the catalog
//! access layer. Keyed by [`QueryKey`], LRU-capped by configuration, and
//! swept by the time-based retention policy. Installing and evicting are
//! atomic with respect to concurrent readers of the same key.

use std::num::NonZeroUsize;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use lru::LruCache;
use metrics::counter;
use time::OffsetDateTime;
use tracing::warn;

use crate::domain::{Category, ContentItem};
use crate::source::ItemPage;

use super::keys::QueryKey;
use super::policy::StalenessPolicy;

/// The value a cache entry holds, one variant per operation kind.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedValue {
    /// A page of list results.
    Page(ItemPage),
    /// A detail lookup; `None` is a cached not-found answer.
    Item(Option<ContentItem>),
    /// A taxonomy collection.
    Taxonomy(Vec<Category>),
    /// A derived curriculum sequence.
    Steps(Vec<ContentItem>),
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub value: CachedValue,
    pub fetched_at: OffsetDateTime,
}

/// In-memory cache entry table with LRU capacity eviction.
pub struct CatalogStore {
    entries: RwLock<LruCache<QueryKey, CacheEntry>>,
}

impl CatalogStore {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(capacity)),
        }
    }

    /// Read guard over the entry table, recovering from poisoning so one
    /// panicked task cannot take the cache down with it.
    fn read_entries(&self, op: &'static str) -> RwLockReadGuard<'_, LruCache<QueryKey, CacheEntry>> {
        self.entries.read().unwrap_or_else(|poisoned| {
            warn!(op, "entry table lock poisoned by a panicked task, continuing with recovered table");
            poisoned.into_inner()
        })
    }

    fn write_entries(
        &self,
        op: &'static str,
    ) -> RwLockWriteGuard<'_, LruCache<QueryKey, CacheEntry>> {
        self.entries.write().unwrap_or_else(|poisoned| {
            warn!(op, "entry table lock poisoned by a panicked task, continuing with recovered table");
            poisoned.into_inner()
        })
    }

    /// Fetch an entry, bumping its recency.
    pub fn get(&self, key: &QueryKey) -> Option<CacheEntry> {
        self.write_entries("get").get(key).cloned()
    }

    /// Inspect an entry without touching recency or metrics.
    pub fn peek(&self, key: &QueryKey) -> Option<CacheEntry> {
        self.read_entries("peek").peek(key).cloned()
    }

    /// Install or replace the entry for a key.
    ///
    /// `push` hands back the old pair on same-key replacement as well as
    /// on capacity eviction; only the latter counts as an eviction.
    pub fn install(&self, key: QueryKey, value: CachedValue, fetched_at: OffsetDateTime) {
        let evicted = self
            .write_entries("install")
            .push(key.clone(), CacheEntry { value, fetched_at });
        if let Some((evicted_key, _)) = evicted
            && evicted_key != key
        {
            counter!("folio_catalog_evict_total").increment(1);
            tracing::debug!(key = %evicted_key, "catalog entry evicted at capacity");
        }
    }

    pub fn invalidate(&self, key: &QueryKey) -> bool {
        self.write_entries("invalidate").pop(key).is_some()
    }

    /// Drop entries past their retention window. Keys reported active by
    /// `is_active` (an in-flight request references them) are skipped.
    pub fn purge_expired(
        &self,
        policy: &StalenessPolicy,
        now: OffsetDateTime,
        is_active: impl Fn(&QueryKey) -> bool,
    ) -> usize {
        let expired: Vec<QueryKey> = self
            .read_entries("purge_expired.scan")
            .iter()
            .filter(|(key, entry)| {
                policy.is_evictable(key.resource(), entry.fetched_at, now, is_active(key))
            })
            .map(|(key, _)| key.clone())
            .collect();

        let mut guard = self.write_entries("purge_expired.drop");
        let mut dropped = 0;
        for key in &expired {
            if guard.pop(key).is_some() {
                dropped += 1;
            }
        }
        if dropped > 0 {
            counter!("folio_catalog_evict_total").increment(dropped as u64);
        }
        dropped
    }

    pub fn clear(&self) {
        self.write_entries("clear").clear();
    }

    pub fn len(&self) -> usize {
        self.read_entries("len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
