use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use folio::{
    CatalogService, CatalogSettings, Category, Clock, ContentItem, ContentSource, ItemPage,
    Language, ListParams, ManualClock, QueryKey, QueryState, ResourceType, SourceError,
    additional_resources, ordered_steps,
};
use metrics_util::debugging::{DebugValue, DebuggingRecorder};
use serial_test::serial;
use time::Duration;
use time::macros::datetime;

struct RecordingSource {
    items: Vec<ContentItem>,
    list_calls: AtomicUsize,
    detail_calls: AtomicUsize,
    fail: AtomicBool,
    delay_ms: u64,
}

impl RecordingSource {
    fn new(items: Vec<ContentItem>) -> Self {
        Self {
            items,
            list_calls: AtomicUsize::new(0),
            detail_calls: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
            delay_ms: 0,
        }
    }

    fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    async fn simulate(&self) -> Result<(), SourceError> {
        if self.delay_ms > 0 {
            tokio::time::sleep(StdDuration::from_millis(self.delay_ms)).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(SourceError::transport("source unreachable"));
        }
        Ok(())
    }
}

#[async_trait]
impl ContentSource for RecordingSource {
    async fn fetch_list(
        &self,
        _resource: ResourceType,
        params: &ListParams,
    ) -> Result<ItemPage, SourceError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate().await?;
        let items: Vec<ContentItem> = match &params.language {
            Some(language) => self
                .items
                .iter()
                .filter(|item| item.language == *language)
                .cloned()
                .collect(),
            None => self.items.clone(),
        };
        Ok(ItemPage::whole(items))
    }

    async fn fetch_by_slug(
        &self,
        _resource: ResourceType,
        slug: &str,
        language: &Language,
    ) -> Result<Option<ContentItem>, SourceError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate().await?;
        Ok(self
            .items
            .iter()
            .find(|item| item.slug == slug && item.language == *language)
            .cloned())
    }

    async fn fetch_taxonomy(&self, _resource: ResourceType) -> Result<Vec<Category>, SourceError> {
        self.simulate().await?;
        Ok(vec![Category {
            slug: "fundamentals".to_string(),
            name: "Fundamentals".to_string(),
            description: Some("Core reading".to_string()),
        }])
    }
}

fn course(slug: &str, language: Language, order: Option<i64>) -> ContentItem {
    ContentItem {
        slug: slug.to_string(),
        title: slug.to_string(),
        excerpt: format!("{slug} excerpt"),
        body: String::new(),
        featured_image_url: None,
        language,
        taxonomy_refs: Default::default(),
        order,
    }
}

fn catalog(source: Arc<RecordingSource>) -> (CatalogService, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(datetime!(2026-02-01 09:00 UTC)));
    let service = CatalogService::with_clock(
        source,
        Arc::clone(&clock) as Arc<dyn Clock>,
        &CatalogSettings::default(),
    );
    (service, clock)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn full_course_flow_from_fetch_to_derivations() {
    let fr = Language::Code("fr".to_string());
    let source = Arc::new(RecordingSource::new(vec![
        course("intro", Language::Default, Some(1)),
        course("advanced", Language::Default, Some(5)),
        course("fr-intro", fr.clone(), Some(1)),
        course("glossary", Language::Default, None),
        course("cheatsheet", Language::Default, None),
    ]));
    let (service, _clock) = catalog(Arc::clone(&source));

    // Steps come from the service, derivations stay pure over the page.
    let steps = service
        .ordered_steps(&Language::Default, Some(&fr), true)
        .await
        .into_ready()
        .expect("curriculum");
    let slugs: Vec<&str> = steps.iter().map(|s| s.slug.as_str()).collect();
    assert_eq!(slugs, vec!["intro", "advanced"]);

    let all = service
        .list(ResourceType::Courses, &ListParams::default(), true)
        .await
        .into_ready()
        .expect("course collection");

    let extras = additional_resources(
        &all.items,
        &steps,
        Some("glossary"),
        &Language::Default,
        5,
    );
    let slugs: Vec<&str> = extras.iter().map(|s| s.slug.as_str()).collect();
    assert_eq!(slugs, vec!["cheatsheet"]);

    // The derivation agrees with what the service cached.
    let derived = ordered_steps(&all.items, &Language::Default, Some(&fr));
    assert_eq!(derived, steps);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn coalescing_holds_across_operations_and_keys() {
    let source = Arc::new(
        RecordingSource::new(vec![course("intro", Language::Default, Some(1))]).with_delay(25),
    );
    let (service, _clock) = catalog(Arc::clone(&source));

    let same_key_params = ListParams {
        page: Some(1),
        ..Default::default()
    };
    let other_key_params = ListParams {
        page: Some(2),
        ..Default::default()
    };

    let mut handles = Vec::new();
    for _ in 0..4 {
        let service = service.clone();
        let params = same_key_params.clone();
        handles.push(tokio::spawn(async move {
            service.list(ResourceType::Articles, &params, true).await
        }));
    }
    // A different key must not coalesce with the burst above.
    {
        let service = service.clone();
        let params = other_key_params.clone();
        handles.push(tokio::spawn(async move {
            service.list(ResourceType::Articles, &params, true).await
        }));
    }
    for handle in handles {
        assert!(handle.await.expect("task completed").is_ready());
    }

    assert_eq!(source.list_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn stale_entry_survives_failed_revalidation() {
    let source = Arc::new(RecordingSource::new(vec![course(
        "intro",
        Language::Default,
        Some(1),
    )]));
    let (service, clock) = catalog(Arc::clone(&source));
    let params = ListParams::default();

    let first = service
        .list(ResourceType::Articles, &params, true)
        .await
        .into_ready()
        .expect("initial page");
    assert_eq!(first.items.len(), 1);

    clock.advance(Duration::minutes(10));
    source.fail.store(true, Ordering::SeqCst);

    let stale = service
        .list(ResourceType::Articles, &params, true)
        .await
        .into_ready()
        .expect("stale page served synchronously");
    assert_eq!(stale.items, first.items);

    service.await_idle().await;

    let key = QueryKey::list(ResourceType::Articles, &params);
    assert_eq!(service.state(&key), QueryState::Stale, "refresh failed");
    let retained = service
        .list(ResourceType::Articles, &params, true)
        .await
        .into_ready()
        .expect("entry retained after failure");
    assert_eq!(retained.items, first.items);
}

#[tokio::test]
async fn disabled_and_absent_slug_paths_never_touch_the_source() {
    let source = Arc::new(RecordingSource::new(Vec::new()));
    let (service, _clock) = catalog(Arc::clone(&source));

    let disabled = service
        .list(ResourceType::Articles, &ListParams::default(), false)
        .await;
    assert!(disabled.is_disabled());

    let no_slug = service
        .detail(ResourceType::Articles, None, &Language::Default, true)
        .await;
    assert_eq!(no_slug.into_ready(), Some(None));

    assert_eq!(source.list_calls.load(Ordering::SeqCst), 0);
    assert_eq!(source.detail_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
#[serial]
async fn catalog_paths_emit_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");

    let source = Arc::new(RecordingSource::new(vec![course(
        "intro",
        Language::Default,
        Some(1),
    )]));
    let (service, clock) = catalog(Arc::clone(&source));
    let params = ListParams::default();

    // miss, hit, then two stale hits sharing one revalidation
    let _ = service.list(ResourceType::Articles, &params, true).await;
    let _ = service.list(ResourceType::Articles, &params, true).await;
    clock.advance(Duration::minutes(10));
    let _ = service.list(ResourceType::Articles, &params, true).await;
    let _ = service.list(ResourceType::Articles, &params, true).await;
    service.await_idle().await;

    let counters: HashMap<String, u64> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(key, _, _, value)| {
            let count = match value {
                DebugValue::Counter(count) => count,
                _ => 0,
            };
            (key.key().name().to_string(), count)
        })
        .collect();

    assert_eq!(counters.get("folio_catalog_miss_total"), Some(&1));
    assert_eq!(counters.get("folio_catalog_hit_total"), Some(&1));
    assert_eq!(counters.get("folio_catalog_stale_hit_total"), Some(&2));
    assert_eq!(
        counters.get("folio_catalog_revalidate_total"),
        Some(&1),
        "a stale burst schedules exactly one revalidation"
    );
}
