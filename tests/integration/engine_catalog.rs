use async_trait::async_trait;
use portal_archive::cache::CacheLayer;
use portal_archive::catalog::{FilterConfig, NothingSaved, Selection};
use portal_archive::config::EngineConfig;
use portal_archive::fetch::FetchOrigin;
use portal_archive::model::{Document, Resource, ResourceStatus};
use portal_archive::sync::{
    ListenerGuard, LiveSource, MemoryCollection, QueryDescriptor, SnapshotFetcher, SnapshotSink,
};
use portal_archive::types::{DOCUMENTS_COLLECTION, RESOURCES_COLLECTION};
use portal_archive::{ApiError, ArchiveEngine, PrimeOutcome};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::integration::support::{catalog_resources, fixture, fixture_with};

fn live_fixture() -> crate::integration::support::Fixture {
    let f = fixture();
    f.engine.open_catalog();
    f.engine.pump();
    f
}

#[test]
fn one_course_with_two_type_buckets() {
    let f = fixture_with(
        Vec::new(),
        vec![
            Resource::new("a", "CMPE150", "Ders Notu", "2023 Güz"),
            Resource::new("b", "CMPE150", "Final Soruları", "2023 Güz"),
        ],
    );
    f.engine.open_catalog();
    f.engine.pump();

    let groups = f.engine.grouped_courses(&FilterConfig::default(), &NothingSaved);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].code, "CMPE150");
    assert_eq!(groups[0].total_count, 2);
    assert_eq!(groups[0].by_type.len(), 2);
    assert_eq!(groups[0].type_count("Ders Notu"), 1);
    assert_eq!(groups[0].type_count("Final Soruları"), 1);
}

#[test]
fn search_is_case_insensitive() {
    let f = live_fixture();
    let groups = f
        .engine
        .grouped_courses(&FilterConfig::default().search("cmpe"), &NothingSaved);
    let codes: Vec<&str> = groups.iter().map(|g| g.code.as_str()).collect();
    assert_eq!(codes, vec!["CMPE150"]);

    let by_name = f
        .engine
        .grouped_courses(&FilterConfig::default().search("calculus"), &NothingSaved);
    assert_eq!(by_name[0].code, "MATH101");
}

#[test]
fn term_filter_excludes_other_terms() {
    let f = live_fixture();
    let groups = f.engine.grouped_courses(
        &FilterConfig::default().term(Selection::only("2023 Güz")),
        &NothingSaved,
    );
    assert!(groups.iter().all(|g| g.code == "CMPE150"));
    assert_eq!(groups.iter().map(|g| g.total_count).sum::<usize>(), 2);
}

#[test]
fn saved_only_uses_the_callers_set() {
    let f = live_fixture();
    let saved: HashSet<String> = ["c".to_string(), "d".to_string()].into_iter().collect();
    let groups = f
        .engine
        .grouped_courses(&FilterConfig::default().saved_only(true), &saved);
    let codes: Vec<&str> = groups.iter().map(|g| g.code.as_str()).collect();
    assert_eq!(codes, vec!["ÇEV201", "MATH101"]);

    assert!(f
        .engine
        .grouped_courses(&FilterConfig::default().saved_only(true), &NothingSaved)
        .is_empty());
}

#[test]
fn terms_ignore_active_filters() {
    let f = live_fixture();
    let expected = vec!["ALL", "2024 Bahar", "2023 Güz"];
    assert_eq!(f.engine.available_terms(), expected);

    f.engine.grouped_courses(
        &FilterConfig::default().term(Selection::only("2023 Güz")),
        &NothingSaved,
    );
    assert_eq!(f.engine.available_terms(), expected);
}

#[test]
fn pending_resources_never_reach_the_catalog() {
    let mut resources = catalog_resources();
    resources.push(
        Resource::new("p", "PHYS101", "Ders Notu", "2022 Yaz").with_status(ResourceStatus::Pending),
    );
    let f = fixture_with(Vec::new(), resources);
    f.engine.open_catalog();
    f.engine.pump();

    let groups = f.engine.grouped_courses(&FilterConfig::default(), &NothingSaved);
    assert!(groups.iter().all(|g| g.code != "PHYS101"));
    assert!(!f.engine.available_terms().contains(&"2022 Yaz".to_string()));
}

#[test]
fn empty_results_differ_from_not_loaded() {
    let f = fixture();
    assert!(!f.engine.catalog_is_loaded());
    f.engine.open_catalog();
    f.engine.pump();
    assert!(f.engine.catalog_is_loaded());
    assert!(f
        .engine
        .grouped_courses(&FilterConfig::default().search("zzz"), &NothingSaved)
        .is_empty());
}

#[test]
fn live_update_regroups() {
    let f = live_fixture();
    f.resources.upsert(Resource::new("e", "CMPE150", "Proje", "2023 Güz"));
    f.engine.pump();
    let groups = f.engine.grouped_courses(&FilterConfig::default(), &NothingSaved);
    let cmpe = groups.iter().find(|g| g.code == "CMPE150").unwrap();
    assert_eq!(cmpe.total_count, 3);
}

#[tokio::test]
async fn primed_catalog_yields_to_live_snapshot() {
    let f = fixture();
    assert_eq!(
        f.engine.prime_catalog().await.unwrap(),
        PrimeOutcome::Applied(FetchOrigin::Remote)
    );
    assert!(f.engine.catalog_is_loaded());

    f.engine.open_catalog();
    f.engine.pump();
    assert_eq!(f.engine.prime_catalog().await.unwrap(), PrimeOutcome::Discarded);
}

#[tokio::test]
async fn cache_is_shared_and_invalidated() {
    let cache = CacheLayer::in_memory();
    let engine = |cache: CacheLayer| {
        ArchiveEngine::new(
            EngineConfig::default(),
            cache,
            MemoryCollection::<Document>::new(DOCUMENTS_COLLECTION),
            MemoryCollection::with_records(RESOURCES_COLLECTION, catalog_resources()),
        )
    };
    let first = engine(cache.clone());
    let second = engine(cache.clone());

    assert_eq!(
        first.prime_catalog().await.unwrap(),
        PrimeOutcome::Applied(FetchOrigin::Remote)
    );
    assert_eq!(
        second.prime_catalog().await.unwrap(),
        PrimeOutcome::Applied(FetchOrigin::Cache)
    );

    second.invalidate_catalog().unwrap();
    let third = engine(cache);
    assert_eq!(
        third.prime_catalog().await.unwrap(),
        PrimeOutcome::Applied(FetchOrigin::Remote)
    );
}

/// Resource source whose first one-shot fetch is slow
struct SlowFirst {
    inner: MemoryCollection<Resource>,
    calls: AtomicUsize,
    delay: Duration,
}

impl LiveSource<Resource> for SlowFirst {
    fn listen(
        &self,
        query: &QueryDescriptor,
        sink: SnapshotSink<Resource>,
    ) -> Result<ListenerGuard, ApiError> {
        self.inner.listen(query, sink)
    }
}

#[async_trait]
impl SnapshotFetcher<Resource> for SlowFirst {
    async fn fetch(&self, query: &QueryDescriptor) -> Result<Vec<Resource>, ApiError> {
        let snapshot = self.inner.fetch(query).await?;
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            tokio::time::sleep(self.delay).await;
        }
        Ok(snapshot)
    }
}

#[tokio::test(start_paused = true)]
async fn stale_priming_response_is_discarded() {
    let store = MemoryCollection::with_records(
        RESOURCES_COLLECTION,
        vec![Resource::new("old", "OLD100", "Ders Notu", "2022 Güz")],
    );
    let engine = ArchiveEngine::new(
        EngineConfig::default(),
        CacheLayer::in_memory(),
        MemoryCollection::<Document>::new(DOCUMENTS_COLLECTION),
        SlowFirst {
            inner: store.clone(),
            calls: AtomicUsize::new(0),
            delay: Duration::from_millis(500),
        },
    );

    let slow = engine.prime_catalog();
    let fast = async {
        store.replace_all(vec![Resource::new("new", "NEW200", "Ders Notu", "2024 Güz")]);
        engine.prime_catalog().await
    };
    let (slow, fast) = futures::join!(slow, fast);

    assert_eq!(slow.unwrap(), PrimeOutcome::Discarded);
    assert_eq!(fast.unwrap(), PrimeOutcome::Applied(FetchOrigin::Remote));

    let codes: Vec<String> = engine
        .grouped_courses(&FilterConfig::default(), &NothingSaved)
        .into_iter()
        .map(|g| g.code)
        .collect();
    assert_eq!(codes, vec!["NEW200"]);

    // The stale copy never reached the cache either
    assert_eq!(
        engine.prime_catalog().await.unwrap(),
        PrimeOutcome::Applied(FetchOrigin::Cache)
    );
    assert_eq!(engine.available_terms(), vec!["ALL", "2024 Güz"]);
}
