use ingest::failpoints::{INGEST_WORKER__BEFORE_WRITE, MEMORY_STORE_BATCH__BEFORE_APPLY};
use ingest::schema::{ITEMS_TABLE, REVIEWS_BY_ITEM_TABLE, REVIEWS_BY_REVIEWER_TABLE};
use ingest::store::memory::MemoryStore;
use ingest::test_utils::failpoints::FailpointScenario;
use ingest::test_utils::fixtures::{ItemLine, ReviewLine, ingest_config, ndjson, ready_catalog};
use telemetry::tracing::init_test_tracing;

#[tokio::test(flavor = "multi_thread")]
async fn failed_review_batch_writes_neither_copy() {
    init_test_tracing();
    let store = MemoryStore::new();
    let catalog = ready_catalog(store.clone(), ingest_config(4)).await;
    let _scenario = FailpointScenario::setup(&[(MEMORY_STORE_BATCH__BEFORE_APPLY, "return")]);

    let reviews = ndjson((0..20).map(|i| ReviewLine::new("A1", &format!("B{i}"), i).build()));
    let items = ndjson((0..20).map(|i| ItemLine::new(&format!("B{i}")).build()));

    assert_eq!(catalog.load_reviews_from(reviews.as_bytes()).await.unwrap(), 0);
    assert_eq!(store.row_count(REVIEWS_BY_REVIEWER_TABLE).await.unwrap(), 0);
    assert_eq!(store.row_count(REVIEWS_BY_ITEM_TABLE).await.unwrap(), 0);

    // Single-row writes do not go through a batch.
    assert_eq!(catalog.load_items_from(items.as_bytes()).await.unwrap(), 20);
}

#[tokio::test(flavor = "multi_thread")]
async fn failing_workers_are_not_counted() {
    init_test_tracing();
    let store = MemoryStore::new();
    let catalog = ready_catalog(store.clone(), ingest_config(8)).await;
    let _scenario = FailpointScenario::setup(&[(INGEST_WORKER__BEFORE_WRITE, "return")]);

    let items = ndjson((0..100).map(|i| ItemLine::new(&format!("B{i}")).build()));

    assert_eq!(catalog.load_items_from(items.as_bytes()).await.unwrap(), 0);
    assert_eq!(store.row_count(ITEMS_TABLE).await.unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn a_single_failure_only_loses_one_record() {
    init_test_tracing();
    let store = MemoryStore::new();
    let catalog = ready_catalog(store.clone(), ingest_config(8)).await;
    let _scenario = FailpointScenario::setup(&[(INGEST_WORKER__BEFORE_WRITE, "1*return")]);

    let reviews = ndjson((0..50).map(|i| ReviewLine::new(&format!("A{i}"), "B1", i).build()));

    assert_eq!(catalog.load_reviews_from(reviews.as_bytes()).await.unwrap(), 49);
    assert_eq!(store.row_count(REVIEWS_BY_REVIEWER_TABLE).await.unwrap(), 49);
    assert_eq!(store.row_count(REVIEWS_BY_ITEM_TABLE).await.unwrap(), 49);
}

#[tokio::test(flavor = "multi_thread")]
async fn panicking_workers_do_not_stop_the_load() {
    init_test_tracing();
    let store = MemoryStore::new();
    let catalog = ready_catalog(store.clone(), ingest_config(4)).await;
    let _scenario = FailpointScenario::setup(&[(INGEST_WORKER__BEFORE_WRITE, "2*panic")]);

    let items = ndjson((0..30).map(|i| ItemLine::new(&format!("B{i}")).build()));

    assert_eq!(catalog.load_items_from(items.as_bytes()).await.unwrap(), 28);
    assert_eq!(store.row_count(ITEMS_TABLE).await.unwrap(), 28);
}
