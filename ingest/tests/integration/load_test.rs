use ingest::error::ErrorKind;
use ingest::schema::{ITEMS_TABLE, REVIEWS_BY_ITEM_TABLE, REVIEWS_BY_REVIEWER_TABLE};
use ingest::store::memory::MemoryStore;
use ingest::test_utils::faulty_store::FaultyStore;
use ingest::test_utils::fixtures::{ItemLine, ReviewLine, ingest_config, ndjson, ready_catalog};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::json;
use std::io::Write;
use telemetry::tracing::init_test_tracing;

#[tokio::test(flavor = "multi_thread")]
async fn loading_the_same_items_twice_keeps_one_row_per_asin() {
    init_test_tracing();
    let store = MemoryStore::new();
    let catalog = ready_catalog(store.clone(), ingest_config(8)).await;

    let input = ndjson((0..50).map(|i| ItemLine::new(&format!("B{i:03}")).title("t").build()));

    assert_eq!(catalog.load_items_from(input.as_bytes()).await.unwrap(), 50);
    assert_eq!(catalog.load_items_from(input.as_bytes()).await.unwrap(), 50);
    assert_eq!(store.row_count(ITEMS_TABLE).await.unwrap(), 50);
}

fn review_lines(reviewers: i64, items: i64) -> Vec<String> {
    (0..10_000_i64)
        .map(|i| {
            // Unique per (reviewer, asin) so every line is its own row in both tables.
            let time = 1_000_000 + i;
            ReviewLine::new(&format!("A{}", i % reviewers), &format!("B{}", i % items), time)
                .rating(i % 5 + 1)
                .build()
        })
        .collect()
}

#[tokio::test(flavor = "multi_thread")]
async fn shuffled_reviews_land_in_both_tables_newest_first() {
    init_test_tracing();

    let reviewers = 100;
    let items = 40;
    let mut lines = review_lines(reviewers, items);

    let mut pool_sizes = StdRng::seed_from_u64(0x5eed);
    let runs = [
        (1, 1),
        (2, pool_sizes.gen_range(2..=16)),
        (3, 250),
        (4, pool_sizes.gen_range(1..=64)),
    ];

    for (seed, worker_count) in runs {
        lines.shuffle(&mut StdRng::seed_from_u64(seed));

        let store = MemoryStore::new();
        let catalog = ready_catalog(store.clone(), ingest_config(worker_count)).await;

        let written = catalog
            .load_reviews_from(ndjson(&lines).as_bytes())
            .await
            .unwrap();

        assert_eq!(written, 10_000, "seed {seed}, {worker_count} workers");
        assert_eq!(
            store.row_count(REVIEWS_BY_REVIEWER_TABLE).await.unwrap(),
            10_000,
            "seed {seed}, {worker_count} workers"
        );
        assert_eq!(
            store.row_count(REVIEWS_BY_ITEM_TABLE).await.unwrap(),
            10_000,
            "seed {seed}, {worker_count} workers"
        );
        assert_eq!(
            store.partition_count(REVIEWS_BY_REVIEWER_TABLE).await.unwrap(),
            reviewers as usize
        );
        assert_eq!(
            store.partition_count(REVIEWS_BY_ITEM_TABLE).await.unwrap(),
            items as usize
        );

        let listing = catalog.user_reviews("A7").await.unwrap();
        assert_eq!(listing.len(), 100);
        assert!(
            listing
                .reviews()
                .windows(2)
                .all(|pair| pair[0].time >= pair[1].time)
        );
        assert!(listing.reviews().iter().all(|review| review.reviewer_id == "A7"));

        let listing = catalog.item_reviews("B3").await.unwrap();
        assert_eq!(listing.len(), 250);
        assert!(
            listing
                .reviews()
                .windows(2)
                .all(|pair| pair[0].time >= pair[1].time)
        );
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn malformed_lines_are_skipped_without_stopping_the_load() {
    init_test_tracing();
    let store = MemoryStore::new();
    let catalog = ready_catalog(store.clone(), ingest_config(16)).await;

    let lines = (0..1_000).map(|i| {
        if i % 10 == 0 {
            format!("{{\"asin\": \"B{i}\", ")
        } else {
            ItemLine::new(&format!("B{i}")).build()
        }
    });

    let written = catalog
        .load_items_from(ndjson(lines).as_bytes())
        .await
        .unwrap();

    assert_eq!(written, 900);
    assert_eq!(store.row_count(ITEMS_TABLE).await.unwrap(), 900);
    assert_eq!(catalog.item("B10").await.unwrap(), "not exists");
    assert!(catalog.item("B11").await.unwrap().starts_with("asin: B11\n"));
}

#[tokio::test(flavor = "multi_thread")]
async fn rejected_writes_only_lose_their_own_records() {
    init_test_tracing();
    let store = FaultyStore::new(MemoryStore::new(), ["B13", "B42"]);
    let catalog = ready_catalog(store.clone(), ingest_config(8)).await;

    let items = ndjson((0..100).map(|i| ItemLine::new(&format!("B{i}")).build()));
    let reviews = ndjson((0..100).map(|i| ReviewLine::new("A1", &format!("B{i}"), i).build()));

    assert_eq!(catalog.load_items_from(items.as_bytes()).await.unwrap(), 98);
    assert_eq!(catalog.load_reviews_from(reviews.as_bytes()).await.unwrap(), 98);
    assert_eq!(store.rejected(), 4);

    let inner = store.inner();
    assert_eq!(inner.row_count(ITEMS_TABLE).await.unwrap(), 98);
    assert_eq!(inner.row_count(REVIEWS_BY_REVIEWER_TABLE).await.unwrap(), 98);
    assert_eq!(inner.row_count(REVIEWS_BY_ITEM_TABLE).await.unwrap(), 98);
    assert_eq!(catalog.user_reviews("A1").await.unwrap().len(), 98);
}

#[tokio::test(flavor = "multi_thread")]
async fn loads_from_files_on_disk() {
    init_test_tracing();
    let catalog = ready_catalog(MemoryStore::new(), ingest_config(4)).await;

    let mut items = tempfile::NamedTempFile::new().unwrap();
    write!(
        items,
        "{}",
        ndjson([
            ItemLine::new("B1").title("Kettle").build(),
            "{'asin': 'B2', 'title': 'Toaster'}".to_owned(),
        ])
    )
    .unwrap();

    let mut reviews = tempfile::NamedTempFile::new().unwrap();
    // No trailing newline on the last record.
    write!(
        reviews,
        "{}\n\n{}",
        ReviewLine::new("A1", "B1", 10).build(),
        ReviewLine::new("A2", "B1", 20).build()
    )
    .unwrap();

    assert_eq!(catalog.load_items(items.path()).await.unwrap(), 2);
    assert_eq!(catalog.load_reviews(reviews.path()).await.unwrap(), 2);

    assert!(catalog.item("B2").await.unwrap().contains("title: Toaster\n"));
    assert_eq!(catalog.item_reviews("B1").await.unwrap().len(), 2);

    let err = catalog
        .load_reviews(reviews.path().with_extension("missing"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IoError);
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_fields_and_odd_values_are_tolerated() {
    init_test_tracing();
    let catalog = ready_catalog(MemoryStore::new(), ingest_config(2)).await;

    let input = ndjson([
        ItemLine::new("B1")
            .field("salesRank", json!({"Toys": 3}))
            .field("price", json!(9.99))
            .field("title", json!(42))
            .build(),
        ReviewLine::new("A1", "B1", 30)
            .field("helpful", json!([2, 3]))
            .field("rating", json!(4.0))
            .build(),
    ]);
    let (items, reviews) = input.split_once('\n').unwrap();

    assert_eq!(catalog.load_items_from(items.as_bytes()).await.unwrap(), 1);
    assert_eq!(catalog.load_reviews_from(reviews.as_bytes()).await.unwrap(), 1);

    assert!(catalog.item("B1").await.unwrap().contains("title: 42\n"));
    assert_eq!(catalog.user_reviews("A1").await.unwrap().reviews()[0].rating, 4);
}
