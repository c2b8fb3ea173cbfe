//! End-to-end tests for the page walker.
//!
//! A scripted in-memory catalog, the mock embedding backend and an in-memory
//! record store stand in for the network and the database, so the walker's
//! ordering and failure rules can be checked deterministically.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use catalog_core::{
    empty_vector, CatalogPage, CatalogSource, Company, EmbeddingBackend, Error, RecordStore,
    Result, Vector,
};
use catalog_inference::mock::MockEmbeddingBackend;
use catalog_inference::EmbeddingClient;
use catalog_pipeline::{Enricher, PageWalker, PipelineConfig, StorageFailurePolicy};

const DIM: usize = 8;

// =============================================================================
// FIXTURES
// =============================================================================

/// Counts enrichment work between the embedding call and the store write.
#[derive(Default)]
struct Probe {
    active: AtomicUsize,
    peak: AtomicUsize,
}

/// Catalog served from memory; records every fetch and what was stored by then.
struct ScriptedSource {
    pages: HashMap<String, CatalogPage>,
    failing: HashSet<String>,
    store: Arc<MemoryStore>,
    probe: Arc<Probe>,
    fetches: Mutex<Vec<Fetch>>,
}

#[derive(Debug, Clone)]
struct Fetch {
    locator: String,
    stored_before: usize,
    active_before: usize,
}

impl ScriptedSource {
    fn new(store: Arc<MemoryStore>, probe: Arc<Probe>) -> Self {
        Self {
            pages: HashMap::new(),
            failing: HashSet::new(),
            store,
            probe,
            fetches: Mutex::new(Vec::new()),
        }
    }

    fn page(mut self, locator: &str, companies: Vec<Company>, next: Option<&str>) -> Self {
        self.pages.insert(
            locator.to_string(),
            CatalogPage {
                companies,
                page: Some(self.pages.len() as u32 + 1),
                total_pages: None,
                next_page: next.map(String::from),
            },
        );
        self
    }

    fn failing(mut self, locator: &str) -> Self {
        self.failing.insert(locator.to_string());
        self
    }

    fn fetches(&self) -> Vec<Fetch> {
        self.fetches.lock().unwrap().clone()
    }

    fn locators(&self) -> Vec<String> {
        self.fetches().into_iter().map(|f| f.locator).collect()
    }
}

#[async_trait]
impl CatalogSource for ScriptedSource {
    async fn fetch_page(&self, locator: &str) -> Result<CatalogPage> {
        self.fetches.lock().unwrap().push(Fetch {
            locator: locator.to_string(),
            stored_before: self.store.len(),
            active_before: self.probe.active.load(Ordering::SeqCst),
        });
        if self.failing.contains(locator) {
            return Err(Error::PageFetch(format!("GET {} returned 500", locator)));
        }
        self.pages
            .get(locator)
            .cloned()
            .ok_or_else(|| Error::PageFetch(format!("GET {} returned 404", locator)))
    }
}

/// Store kept in memory; can reject chosen companies, slow down chosen
/// companies and add jitter.
#[derive(Default)]
struct MemoryStore {
    rows: Mutex<Vec<(Company, Vector)>>,
    rejected: HashSet<String>,
    slow: HashMap<String, u64>,
    jitter_ms: u64,
    probe: Option<Arc<Probe>>,
}

impl MemoryStore {
    fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .map(|(c, _)| c.name.clone())
            .collect();
        names.sort();
        names
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn store(&self, company: &Company, embedding: &Vector) -> Result<()> {
        if self.jitter_ms > 0 {
            let delay = rand::thread_rng().gen_range(0..=self.jitter_ms);
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if let Some(delay) = self.slow.get(&company.name) {
            tokio::time::sleep(Duration::from_millis(*delay)).await;
        }
        if let Some(probe) = &self.probe {
            probe.active.fetch_sub(1, Ordering::SeqCst);
        }
        if self.rejected.contains(&company.name) {
            return Err(Error::Internal("duplicate key value".into()));
        }
        assert_eq!(embedding.as_slice().len(), DIM);
        self.rows
            .lock()
            .unwrap()
            .push((company.clone(), embedding.clone()));
        Ok(())
    }
}

/// Wraps the mock backend so the probe sees every task from its first call.
struct ProbedBackend {
    inner: MockEmbeddingBackend,
    probe: Arc<Probe>,
}

#[async_trait]
impl EmbeddingBackend for ProbedBackend {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vector>> {
        let now = self.probe.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.probe.peak.fetch_max(now, Ordering::SeqCst);
        self.inner.embed_texts(texts).await
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}

/// Answers every request with the "no embedding" sentinel.
struct SilentBackend;

#[async_trait]
impl EmbeddingBackend for SilentBackend {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vector>> {
        Ok(texts.iter().map(|_| empty_vector()).collect())
    }

    fn dimension(&self) -> usize {
        DIM
    }

    fn model_name(&self) -> &str {
        "silent"
    }
}

fn company(name: &str, description: &str) -> Company {
    Company {
        name: name.to_string(),
        slug: Some(name.to_lowercase()),
        long_description: if description.is_empty() {
            None
        } else {
            Some(description.to_string())
        },
        ..Default::default()
    }
}

fn companies(prefix: &str, n: usize) -> Vec<Company> {
    (0..n)
        .map(|i| company(&format!("{} {}", prefix, i), &format!("{} {} makes widgets", prefix, i)))
        .collect()
}

fn mock_backend() -> MockEmbeddingBackend {
    MockEmbeddingBackend::new().with_dimension(DIM)
}

fn walker(
    source: Arc<ScriptedSource>,
    backend: Arc<dyn EmbeddingBackend>,
    store: Arc<MemoryStore>,
    config: PipelineConfig,
) -> PageWalker {
    let enricher = Enricher::new(EmbeddingClient::new(backend), store)
        .with_storage_failure_policy(config.storage_failure_policy);
    PageWalker::new(source, Arc::new(enricher), config.with_start_url("p1"))
        .expect("Failed to create walker")
}

// =============================================================================
// SCENARIOS
// =============================================================================

#[tokio::test]
async fn test_two_pages_store_everything_with_a_description() {
    let store = Arc::new(MemoryStore::default());
    let probe = Arc::new(Probe::default());
    let source = Arc::new(
        ScriptedSource::new(store.clone(), probe)
            .page(
                "p1",
                vec![
                    company("Acme", "Rockets for everyone"),
                    company("Hollow", ""),
                    company("Globex", "Global exports"),
                ],
                Some("p2"),
            )
            .page("p2", vec![company("Initech", "Enterprise software")], None),
    );
    let backend = mock_backend();

    let summary = walker(
        source.clone(),
        Arc::new(backend.clone()),
        store.clone(),
        PipelineConfig::default().with_concurrency(2),
    )
    .run()
    .await
    .expect("run should succeed");

    assert_eq!(store.names(), vec!["Acme", "Globex", "Initech"]);
    assert_eq!(summary.pages, 2);
    assert_eq!(summary.companies, 4);
    assert_eq!(summary.enrich.stored, 3);
    assert_eq!(summary.enrich.empty_text, 1);
    assert_eq!(summary.scheduler.failed, 0);
    assert_eq!(backend.call_count(), 3);
    assert!(!backend.calls().iter().any(|t| t.is_empty()));
    assert_eq!(source.locators(), vec!["p1", "p2"]);
}

#[tokio::test]
async fn test_first_fetch_failure_stores_nothing_and_skips_embedding() {
    let store = Arc::new(MemoryStore::default());
    let source = Arc::new(
        ScriptedSource::new(store.clone(), Arc::new(Probe::default()))
            .failing("p1")
            .page("p2", companies("Late", 2), None),
    );
    let backend = mock_backend();

    let err = walker(
        source.clone(),
        Arc::new(backend.clone()),
        store.clone(),
        PipelineConfig::default(),
    )
    .run()
    .await
    .unwrap_err();

    assert!(matches!(err, Error::PageFetch(_)));
    assert_eq!(store.len(), 0);
    assert_eq!(backend.call_count(), 0);
    assert_eq!(source.locators(), vec!["p1"]);
}

#[tokio::test]
async fn test_later_fetch_failure_keeps_earlier_pages() {
    let store = Arc::new(MemoryStore::default());
    let source = Arc::new(
        ScriptedSource::new(store.clone(), Arc::new(Probe::default()))
            .page("p1", companies("Early", 3), Some("p2"))
            .failing("p2"),
    );

    let err = walker(
        source.clone(),
        Arc::new(mock_backend()),
        store.clone(),
        PipelineConfig::default(),
    )
    .run()
    .await
    .unwrap_err();

    assert!(matches!(err, Error::PageFetch(_)));
    assert_eq!(store.len(), 3);
    assert_eq!(source.fetches()[1].stored_before, 3);
}

#[tokio::test]
async fn test_storage_failure_stops_the_walk() {
    let store = Arc::new(MemoryStore {
        rejected: HashSet::from(["Bad".to_string()]),
        ..Default::default()
    });
    let mut first = companies("Good", 2);
    first.insert(1, company("Bad", "Rejected by the store"));
    let source = Arc::new(
        ScriptedSource::new(store.clone(), Arc::new(Probe::default()))
            .page("p1", first, Some("p2"))
            .page("p2", companies("Never", 3), None),
    );

    let err = walker(
        source.clone(),
        Arc::new(mock_backend()),
        store.clone(),
        PipelineConfig::default().with_concurrency(1),
    )
    .run()
    .await
    .unwrap_err();

    assert!(matches!(err, Error::Storage(ref msg) if msg.contains("Bad")));
    assert_eq!(source.locators(), vec!["p1"]);
    // With one slot, the company after the failure is never started.
    assert_eq!(store.names(), vec!["Good 0"]);
}

#[tokio::test]
async fn test_storage_failure_stops_running_siblings_before_they_write() {
    let store = Arc::new(MemoryStore {
        rejected: HashSet::from(["Bad".to_string()]),
        slow: HashMap::from([("Slow 1".to_string(), 100), ("Slow 2".to_string(), 100)]),
        ..Default::default()
    });
    let source = Arc::new(
        ScriptedSource::new(store.clone(), Arc::new(Probe::default())).page(
            "p1",
            vec![
                company("Bad", "Rejected by the store"),
                company("Slow 1", "Writes slowly"),
                company("Slow 2", "Writes slowly"),
            ],
            Some("p2"),
        ),
    );

    let err = walker(
        source.clone(),
        Arc::new(mock_backend()),
        store.clone(),
        PipelineConfig::default().with_concurrency(3),
    )
    .run()
    .await
    .unwrap_err();

    assert!(matches!(err, Error::Storage(ref msg) if msg.contains("Bad")));
    assert_eq!(source.locators(), vec!["p1"]);

    // Give the slow writes time to land if they were still running.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(store.names().is_empty(), "written after failure: {:?}", store.names());
}

#[tokio::test]
async fn test_skip_policy_tolerates_storage_failures() {
    let store = Arc::new(MemoryStore {
        rejected: HashSet::from(["Bad".to_string()]),
        ..Default::default()
    });
    let mut first = companies("Good", 2);
    first.push(company("Bad", "Rejected by the store"));
    let source = Arc::new(
        ScriptedSource::new(store.clone(), Arc::new(Probe::default()))
            .page("p1", first, Some("p2"))
            .page("p2", companies("Next", 2), None),
    );

    let summary = walker(
        source.clone(),
        Arc::new(mock_backend()),
        store.clone(),
        PipelineConfig::default().with_storage_failure_policy(StorageFailurePolicy::Skip),
    )
    .run()
    .await
    .expect("skip policy should finish the walk");

    assert_eq!(summary.pages, 2);
    assert_eq!(summary.enrich.stored, 4);
    assert_eq!(summary.enrich.storage_failed, 1);
    assert_eq!(store.len(), 4);
}

#[tokio::test]
async fn test_embedding_failure_does_not_block_later_companies() {
    let store = Arc::new(MemoryStore::default());
    let page = companies("Co", 5);
    let broken = page[1].long_description.clone().unwrap();
    let source = Arc::new(
        ScriptedSource::new(store.clone(), Arc::new(Probe::default())).page("p1", page, None),
    );
    let backend = mock_backend().failing_on(broken);

    let summary = walker(
        source,
        Arc::new(backend.clone()),
        store.clone(),
        PipelineConfig::default().with_concurrency(1),
    )
    .run()
    .await
    .expect("embedding failures are not fatal");

    assert_eq!(store.names(), vec!["Co 0", "Co 2", "Co 3", "Co 4"]);
    assert_eq!(summary.enrich.embedding_failed, 1);
    assert_eq!(backend.call_count(), 5);
}

#[tokio::test]
async fn test_missing_embedding_skips_company() {
    let store = Arc::new(MemoryStore::default());
    let source = Arc::new(
        ScriptedSource::new(store.clone(), Arc::new(Probe::default()))
            .page("p1", companies("Co", 2), None),
    );

    let summary = walker(source, Arc::new(SilentBackend), store.clone(), PipelineConfig::default())
        .run()
        .await
        .unwrap();

    assert_eq!(store.len(), 0);
    assert_eq!(summary.enrich.empty_embedding, 2);
}

#[tokio::test]
async fn test_pages_never_overlap_and_concurrency_is_bounded() {
    let probe = Arc::new(Probe::default());
    let store = Arc::new(MemoryStore {
        jitter_ms: 15,
        probe: Some(probe.clone()),
        ..Default::default()
    });
    let source = Arc::new(
        ScriptedSource::new(store.clone(), probe.clone())
            .page("p1", companies("A", 7), Some("p2"))
            .page("p2", companies("B", 5), Some("p3"))
            .page("p3", companies("C", 6), None),
    );
    let backend = ProbedBackend {
        inner: mock_backend().with_latency_ms(3),
        probe: probe.clone(),
    };
    let limit = 3;

    let summary = walker(
        source.clone(),
        Arc::new(backend),
        store.clone(),
        PipelineConfig::default().with_concurrency(limit),
    )
    .run()
    .await
    .unwrap();

    let fetches = source.fetches();
    let stored: Vec<usize> = fetches.iter().map(|f| f.stored_before).collect();
    assert_eq!(stored, vec![0, 7, 12]);
    assert!(fetches.iter().all(|f| f.active_before == 0));

    let peak = probe.peak.load(Ordering::SeqCst);
    assert!(peak <= limit, "peak {} exceeded limit {}", peak, limit);
    assert!(summary.scheduler.peak_running <= limit);
    assert_eq!(store.len(), 18);
}

#[tokio::test]
async fn test_max_pages_ends_walk_early() {
    let store = Arc::new(MemoryStore::default());
    let source = Arc::new(
        ScriptedSource::new(store.clone(), Arc::new(Probe::default()))
            .page("p1", companies("A", 1), Some("p2"))
            .page("p2", companies("B", 1), Some("p3"))
            .page("p3", companies("C", 1), None),
    );

    let summary = walker(
        source.clone(),
        Arc::new(mock_backend()),
        store.clone(),
        PipelineConfig::default().with_max_pages(Some(2)),
    )
    .run()
    .await
    .unwrap();

    assert_eq!(summary.pages, 2);
    assert_eq!(source.locators(), vec!["p1", "p2"]);
    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn test_empty_next_page_is_terminal() {
    let store = Arc::new(MemoryStore::default());
    let source = Arc::new(
        ScriptedSource::new(store.clone(), Arc::new(Probe::default()))
            .page("p1", companies("A", 2), Some("")),
    );

    let summary = walker(source.clone(), Arc::new(mock_backend()), store, PipelineConfig::default())
        .run()
        .await
        .unwrap();

    assert_eq!(summary.pages, 1);
    assert_eq!(source.locators(), vec!["p1"]);
}

#[tokio::test]
async fn test_zero_concurrency_rejected() {
    let store = Arc::new(MemoryStore::default());
    let source = Arc::new(ScriptedSource::new(store.clone(), Arc::new(Probe::default())));
    let enricher = Enricher::new(EmbeddingClient::new(Arc::new(mock_backend())), store);

    let result = PageWalker::new(
        source,
        Arc::new(enricher),
        PipelineConfig::default().with_concurrency(0),
    );

    assert!(matches!(result, Err(Error::Config(_))));
}
