//! Catalog access layer: key derivation, policy decisions, request
//! coalescing and stale-while-revalidate orchestration.
//!
//! For a given key the cache never exposes a response older than the most
//! recently completed request: readers see either the prior cached value
//! or the fully-resolved new one. A caller that stops awaiting does not
//! abort a request other readers share; revalidations run as spawned
//! tasks and always clear their in-flight handle on completion.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use metrics::counter;
use tracing::{debug, warn};

use crate::config::CatalogSettings;
use crate::curriculum;
use crate::domain::{Category, ContentItem, Language, ResourceType};
use crate::error::CatalogError;
use crate::source::{ContentSource, ItemPage, ListParams};

use super::clock::{Clock, SystemClock};
use super::keys::QueryKey;
use super::policy::StalenessPolicy;
use super::store::{CachedValue, CatalogStore};

type SharedFetch = Shared<BoxFuture<'static, Result<CachedValue, Arc<CatalogError>>>>;

/// Tri-state result of a catalog operation.
#[derive(Debug, Clone)]
pub enum QueryOutcome<T> {
    /// The operation was disabled: no fetch, no cache write, no error.
    Disabled,
    Ready(T),
    /// The fetch failed and no cached value was available.
    Failed(Arc<CatalogError>),
}

impl<T> QueryOutcome<T> {
    pub fn is_disabled(&self) -> bool {
        matches!(self, QueryOutcome::Disabled)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, QueryOutcome::Ready(_))
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            QueryOutcome::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_ready(self) -> Option<T> {
        match self {
            QueryOutcome::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&CatalogError> {
        match self {
            QueryOutcome::Failed(error) => Some(error),
            _ => None,
        }
    }
}

/// Non-blocking view of a key's cache position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryState {
    NotCached,
    /// No cached value yet, but a request for this key is in flight.
    Pending,
    Fresh,
    Stale,
}

struct Inner {
    source: Arc<dyn ContentSource>,
    clock: Arc<dyn Clock>,
    policy: StalenessPolicy,
    store: CatalogStore,
    in_flight: DashMap<QueryKey, SharedFetch>,
    retry_attempts: u32,
}

/// Orchestrates typed read operations over the content source with
/// at-most-one-in-flight-request-per-key deduplication.
#[derive(Clone)]
pub struct CatalogService {
    inner: Arc<Inner>,
}

impl CatalogService {
    pub fn new(source: Arc<dyn ContentSource>, settings: &CatalogSettings) -> Self {
        Self::with_clock(source, Arc::new(SystemClock), settings)
    }

    /// Construct with an injected clock so tests can control time.
    pub fn with_clock(
        source: Arc<dyn ContentSource>,
        clock: Arc<dyn Clock>,
        settings: &CatalogSettings,
    ) -> Self {
        crate::telemetry::describe_metrics();
        Self {
            inner: Arc::new(Inner {
                source,
                clock,
                policy: StalenessPolicy::from(settings),
                store: CatalogStore::new(settings.cache_capacity_non_zero()),
                in_flight: DashMap::new(),
                retry_attempts: settings.retry_attempts,
            }),
        }
    }

    /// Fetch one page of a content collection.
    pub async fn list(
        &self,
        resource: ResourceType,
        params: &ListParams,
        enabled: bool,
    ) -> QueryOutcome<ItemPage> {
        if !enabled {
            return QueryOutcome::Disabled;
        }
        if resource.is_taxonomy() {
            return QueryOutcome::Failed(Arc::new(CatalogError::invalid_request(format!(
                "`{}` is a taxonomy namespace; use the taxonomy operation",
                resource.as_str()
            ))));
        }

        let key = QueryKey::list(resource, params);
        let source = Arc::clone(&self.inner.source);
        let params = params.clone();
        let fetch = move || {
            let source = Arc::clone(&source);
            let params = params.clone();
            async move {
                source
                    .fetch_list(resource, &params)
                    .await
                    .map(CachedValue::Page)
                    .map_err(CatalogError::from)
            }
            .boxed()
        };

        match self.read_through(key.clone(), fetch).await {
            Ok(CachedValue::Page(page)) => QueryOutcome::Ready(page),
            Ok(_) => QueryOutcome::Failed(Arc::new(value_kind_mismatch(&key))),
            Err(error) => QueryOutcome::Failed(error),
        }
    }

    /// Look up a single item by slug and language.
    ///
    /// An absent slug resolves to `Ready(None)` without touching the
    /// source, supporting conditional lookups where the identifier is not
    /// yet known. A source-confirmed not-found is cached like any other
    /// successful answer.
    pub async fn detail(
        &self,
        resource: ResourceType,
        slug: Option<&str>,
        language: &Language,
        enabled: bool,
    ) -> QueryOutcome<Option<ContentItem>> {
        if !enabled {
            return QueryOutcome::Disabled;
        }
        let Some(slug) = slug else {
            return QueryOutcome::Ready(None);
        };
        if slug.is_empty() {
            return QueryOutcome::Failed(Arc::new(CatalogError::invalid_request(
                "detail lookup requires a non-empty slug",
            )));
        }
        if resource.is_taxonomy() {
            return QueryOutcome::Failed(Arc::new(CatalogError::invalid_request(format!(
                "`{}` is a taxonomy namespace; use the taxonomy operation",
                resource.as_str()
            ))));
        }

        let key = QueryKey::detail(resource, slug, language);
        let source = Arc::clone(&self.inner.source);
        let slug = slug.to_string();
        let language = language.clone();
        let fetch = move || {
            let source = Arc::clone(&source);
            let slug = slug.clone();
            let language = language.clone();
            async move {
                source
                    .fetch_by_slug(resource, &slug, &language)
                    .await
                    .map(CachedValue::Item)
                    .map_err(CatalogError::from)
            }
            .boxed()
        };

        match self.read_through(key.clone(), fetch).await {
            Ok(CachedValue::Item(item)) => QueryOutcome::Ready(item),
            Ok(_) => QueryOutcome::Failed(Arc::new(value_kind_mismatch(&key))),
            Err(error) => QueryOutcome::Failed(error),
        }
    }

    /// Fetch the category taxonomy serving a resource type.
    pub async fn taxonomy(
        &self,
        resource: ResourceType,
        enabled: bool,
    ) -> QueryOutcome<Vec<Category>> {
        if !enabled {
            return QueryOutcome::Disabled;
        }

        let namespace = resource.taxonomy_namespace();
        let key = QueryKey::taxonomy(namespace);
        let source = Arc::clone(&self.inner.source);
        let fetch = move || {
            let source = Arc::clone(&source);
            async move {
                source
                    .fetch_taxonomy(namespace)
                    .await
                    .map(CachedValue::Taxonomy)
                    .map_err(CatalogError::from)
            }
            .boxed()
        };

        match self.read_through(key.clone(), fetch).await {
            Ok(CachedValue::Taxonomy(categories)) => QueryOutcome::Ready(categories),
            Ok(_) => QueryOutcome::Failed(Arc::new(value_kind_mismatch(&key))),
            Err(error) => QueryOutcome::Failed(error),
        }
    }

    /// Fetch the ordered curriculum for a language, with whole-collection
    /// fallback to a second language when the first yields no steps.
    pub async fn ordered_steps(
        &self,
        language: &Language,
        fallback: Option<&Language>,
        enabled: bool,
    ) -> QueryOutcome<Vec<ContentItem>> {
        if !enabled {
            return QueryOutcome::Disabled;
        }

        let key = QueryKey::ordered_list(language, fallback);
        let source = Arc::clone(&self.inner.source);
        let language = language.clone();
        let fallback = fallback.cloned();
        let fetch = move || {
            let source = Arc::clone(&source);
            let language = language.clone();
            let fallback = fallback.clone();
            async move {
                let page = source
                    .fetch_list(ResourceType::Courses, &ListParams::unpaginated())
                    .await
                    .map_err(CatalogError::from)?;
                let steps = curriculum::ordered_steps(&page.items, &language, fallback.as_ref());
                Ok(CachedValue::Steps(steps))
            }
            .boxed()
        };

        match self.read_through(key.clone(), fetch).await {
            Ok(CachedValue::Steps(steps)) => QueryOutcome::Ready(steps),
            Ok(_) => QueryOutcome::Failed(Arc::new(value_kind_mismatch(&key))),
            Err(error) => QueryOutcome::Failed(error),
        }
    }

    /// Inspect a key's cache position without fetching.
    pub fn state(&self, key: &QueryKey) -> QueryState {
        let now = self.inner.clock.now();
        let active = self.inner.in_flight.contains_key(key);
        if let Some(entry) = self.inner.store.peek(key) {
            let resource = key.resource();
            if self
                .inner
                .policy
                .is_evictable(resource, entry.fetched_at, now, active)
            {
                return QueryState::NotCached;
            }
            if self.inner.policy.is_stale(resource, entry.fetched_at, now) {
                return QueryState::Stale;
            }
            return QueryState::Fresh;
        }
        if active {
            QueryState::Pending
        } else {
            QueryState::NotCached
        }
    }

    /// Drop the cached entry for a key, forcing the next read to fetch.
    pub fn invalidate(&self, key: &QueryKey) -> bool {
        self.inner.store.invalidate(key)
    }

    /// Reset the entry table, e.g. between test cases.
    pub fn clear(&self) {
        self.inner.store.clear();
    }

    /// Retention sweep: drop entries past their eviction window unless a
    /// request for their key is in flight.
    pub fn purge_expired(&self) -> usize {
        let now = self.inner.clock.now();
        self.inner
            .store
            .purge_expired(&self.inner.policy, now, |key| {
                self.inner.in_flight.contains_key(key)
            })
    }

    pub fn entry_count(&self) -> usize {
        self.inner.store.len()
    }

    /// Wait until no request is in flight. Used by tests and by embedding
    /// applications during shutdown.
    ///
    /// Awaits the remaining shared handles rather than spinning, which
    /// also drives requests whose every foreground caller has been torn
    /// down before polling them.
    pub async fn await_idle(&self) {
        loop {
            let pending: Vec<SharedFetch> = self
                .inner
                .in_flight
                .iter()
                .map(|entry| entry.value().clone())
                .collect();
            if pending.is_empty() {
                return;
            }
            for handle in pending {
                let _ = handle.await;
            }
        }
    }

    async fn read_through<F>(
        &self,
        key: QueryKey,
        fetch: F,
    ) -> Result<CachedValue, Arc<CatalogError>>
    where
        F: Fn() -> BoxFuture<'static, Result<CachedValue, CatalogError>> + Send + 'static,
    {
        let now = self.inner.clock.now();
        if let Some(entry) = self.inner.store.get(&key) {
            let resource = key.resource();
            let active = self.inner.in_flight.contains_key(&key);
            if self
                .inner
                .policy
                .is_evictable(resource, entry.fetched_at, now, active)
            {
                self.inner.store.invalidate(&key);
            } else if self.inner.policy.is_stale(resource, entry.fetched_at, now) {
                counter!("folio_catalog_stale_hit_total").increment(1);
                debug!(key = %key, "serving stale catalog entry, scheduling revalidation");
                self.spawn_revalidation(key, fetch);
                return Ok(entry.value);
            } else {
                counter!("folio_catalog_hit_total").increment(1);
                return Ok(entry.value);
            }
        }

        counter!("folio_catalog_miss_total").increment(1);
        let (shared, created) = self.coalesced(key, fetch);
        if !created {
            counter!("folio_catalog_coalesced_total").increment(1);
        }
        shared.await
    }

    /// Obtain the in-flight handle for a key, creating it when absent.
    /// Concurrent callers for the same key share one underlying request.
    /// The flag reports whether this call created the handle; insertion
    /// and the existence check are one atomic entry operation.
    fn coalesced<F>(&self, key: QueryKey, fetch: F) -> (SharedFetch, bool)
    where
        F: Fn() -> BoxFuture<'static, Result<CachedValue, CatalogError>> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        let fut_key = key.clone();
        let fetch_future = async move {
            let result = attempt_fetch(fetch, inner.retry_attempts).await;
            let mapped = match result {
                Ok(value) => {
                    inner
                        .store
                        .install(fut_key.clone(), value.clone(), inner.clock.now());
                    Ok(value)
                }
                Err(error) => Err(Arc::new(error)),
            };
            // Clear the handle on success and failure alike so the next
            // read can issue a new request.
            inner.in_flight.remove(&fut_key);
            mapped
        }
        .boxed()
        .shared();

        match self.inner.in_flight.entry(key) {
            Entry::Occupied(existing) => (existing.get().clone(), false),
            Entry::Vacant(vacant) => {
                vacant.insert(fetch_future.clone());
                (fetch_future, true)
            }
        }
    }

    /// Drive one background refetch for a stale key. The spawned task
    /// keeps the shared request alive even if every foreground caller
    /// stops listening; a failure leaves the stale entry in place. A key
    /// already in flight is left to the task or caller driving it.
    fn spawn_revalidation<F>(&self, key: QueryKey, fetch: F)
    where
        F: Fn() -> BoxFuture<'static, Result<CachedValue, CatalogError>> + Send + 'static,
    {
        let (shared, created) = self.coalesced(key.clone(), fetch);
        if !created {
            return;
        }
        counter!("folio_catalog_revalidate_total").increment(1);
        tokio::spawn(async move {
            if let Err(error) = shared.await {
                warn!(key = %key, error = %error, "revalidation failed, stale entry retained");
            }
        });
    }
}

async fn attempt_fetch<F>(fetch: F, retry_attempts: u32) -> Result<CachedValue, CatalogError>
where
    F: Fn() -> BoxFuture<'static, Result<CachedValue, CatalogError>> + Send,
{
    let mut attempt = 0;
    loop {
        match fetch().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                if attempt >= retry_attempts {
                    return Err(error);
                }
                attempt += 1;
                warn!(attempt, error = %error, "content source request failed, retrying");
            }
        }
    }
}

fn value_kind_mismatch(key: &QueryKey) -> CatalogError {
    CatalogError::invariant(format!("cache entry for `{key}` holds unexpected value kind"))
}
