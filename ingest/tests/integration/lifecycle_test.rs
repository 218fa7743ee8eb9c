use ingest::catalog::{ReviewCatalog, SessionState};
use ingest::error::ErrorKind;
use ingest::query::NOT_EXISTS;
use ingest::store::memory::MemoryStore;
use ingest::test_utils::fixtures::{ItemLine, ingest_config, ndjson};
use telemetry::tracing::init_test_tracing;

#[tokio::test(flavor = "multi_thread")]
async fn repeated_connect_and_close_are_ignored() {
    init_test_tracing();
    let store = MemoryStore::new();
    let mut catalog = ReviewCatalog::new(store.clone(), ingest_config(4));

    catalog.connect().await.unwrap();
    catalog.create_tables().await.unwrap();
    catalog.connect().await.unwrap();
    catalog.initialize().await.unwrap();

    // The second connect must not have replaced the initialized session.
    let input = ndjson([ItemLine::new("B1").build()]);
    assert_eq!(catalog.load_items_from(input.as_bytes()).await.unwrap(), 1);

    catalog.close().await.unwrap();
    catalog.close().await.unwrap();
    assert_eq!(catalog.state(), SessionState::Closed);

    catalog.connect().await.unwrap();
    assert_eq!(catalog.state(), SessionState::Closed);
    let err = catalog.item("B1").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
}

#[tokio::test(flavor = "multi_thread")]
async fn loads_and_lookups_require_initialization() {
    init_test_tracing();
    let mut catalog = ReviewCatalog::new(MemoryStore::new(), ingest_config(4));

    let err = catalog.load_items_from(&b""[..]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    catalog.connect().await.unwrap();
    catalog.create_tables().await.unwrap();

    let err = catalog.load_reviews_from(&b""[..]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
    let err = catalog.item_reviews("B1").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    catalog.initialize().await.unwrap();
    assert_eq!(catalog.item("B1").await.unwrap(), NOT_EXISTS);
    assert!(catalog.item_reviews("B1").await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn tables_survive_a_new_catalog_on_the_same_store() {
    init_test_tracing();
    let store = MemoryStore::new();

    let mut first = ReviewCatalog::new(store.clone(), ingest_config(2));
    first.connect().await.unwrap();
    first.create_tables().await.unwrap();
    first.initialize().await.unwrap();
    let input = ndjson([ItemLine::new("B1").title("Kept").build()]);
    first.load_items_from(input.as_bytes()).await.unwrap();
    first.close().await.unwrap();

    let mut second = ReviewCatalog::new(store, ingest_config(2));
    second.connect().await.unwrap();
    second.create_tables().await.unwrap();
    second.initialize().await.unwrap();

    assert!(second.item("B1").await.unwrap().contains("title: Kept\n"));
}
