use ingest::query::NOT_EXISTS;
use ingest::store::memory::MemoryStore;
use ingest::test_utils::fixtures::{ItemLine, ReviewLine, ingest_config, ndjson, ready_catalog};
use serde_json::json;
use telemetry::tracing::init_test_tracing;

#[tokio::test(flavor = "multi_thread")]
async fn item_lookup_renders_every_field() {
    init_test_tracing();
    let catalog = ready_catalog(MemoryStore::new(), ingest_config(2)).await;

    let input = ndjson([ItemLine::new("0000031887")
        .title("Ballet Tutu")
        .image_url("http://example.com/tutu.jpg")
        .description("Pink tutu")
        .categories(&[&["Clothing", "Girls"], &["Sports", "Dance"]])
        .build()]);
    catalog.load_items_from(input.as_bytes()).await.unwrap();

    insta::assert_snapshot!(catalog.item("0000031887").await.unwrap().trim_end(), @r"
    asin: 0000031887
    title: Ballet Tutu
    image: http://example.com/tutu.jpg
    categories: [Clothing, Dance, Girls, Sports]
    description: Pink tutu
    ");

    assert_eq!(catalog.item("missing").await.unwrap(), NOT_EXISTS);
}

#[tokio::test(flavor = "multi_thread")]
async fn absent_item_fields_read_back_as_sentinels() {
    init_test_tracing();
    let catalog = ready_catalog(MemoryStore::new(), ingest_config(2)).await;

    let input = ndjson([
        ItemLine::new("B1").build(),
        ItemLine::new("B2")
            .field("imUrl", json!("http://example.com/legacy.jpg"))
            .build(),
        ItemLine::new("B3")
            .image_url("http://example.com/new.jpg")
            .field("imUrl", json!("http://example.com/legacy.jpg"))
            .build(),
    ]);
    assert_eq!(catalog.load_items_from(input.as_bytes()).await.unwrap(), 3);

    insta::assert_snapshot!(catalog.item("B1").await.unwrap().trim_end(), @r"
    asin: B1
    title: na
    image: na
    categories: []
    description: na
    ");
    assert!(
        catalog
            .item("B2")
            .await
            .unwrap()
            .contains("image: http://example.com/legacy.jpg\n")
    );
    assert!(
        catalog
            .item("B3")
            .await
            .unwrap()
            .contains("image: http://example.com/new.jpg\n")
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn review_lookups_see_both_copies_of_a_review() {
    init_test_tracing();
    let catalog = ready_catalog(MemoryStore::new(), ingest_config(4)).await;

    let input = ndjson([ReviewLine::new("A1", "B1", 1_392_854_400)
        .reviewer_name("Jo")
        .rating(5)
        .summary("Great")
        .review_text("Loved it")
        .build()]);
    catalog.load_reviews_from(input.as_bytes()).await.unwrap();

    let by_reviewer = catalog.user_reviews("A1").await.unwrap().to_string();
    let by_item = catalog.item_reviews("B1").await.unwrap().to_string();

    assert_eq!(by_reviewer, by_item);
    insta::assert_snapshot!(
        by_reviewer.trim_end(),
        @"time: 2014-02-20T00:00:00Z, asin: B1, reviewerID: A1, reviewerName: Jo, rating: 5, summary: Great, reviewText: Loved it"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn review_defaults_are_rendered() {
    init_test_tracing();
    let catalog = ready_catalog(MemoryStore::new(), ingest_config(1)).await;

    let input = ndjson([ReviewLine::new("A1", "B1", 0)
        .without("unixReviewTime")
        .field("rating", json!("five"))
        .build()]);
    catalog.load_reviews_from(input.as_bytes()).await.unwrap();

    insta::assert_snapshot!(
        catalog.user_reviews("A1").await.unwrap().to_string().trim_end(),
        @"time: 1970-01-01T00:00:00Z, asin: B1, reviewerID: A1, reviewerName: na, rating: -1, summary: na, reviewText: na"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn equal_times_are_ordered_by_the_other_key() {
    init_test_tracing();
    let catalog = ready_catalog(MemoryStore::new(), ingest_config(4)).await;

    let input = ndjson([
        ReviewLine::new("A1", "B2", 100).build(),
        ReviewLine::new("A1", "B1", 100).build(),
        ReviewLine::new("A1", "B3", 200).build(),
        ReviewLine::new("A2", "B1", 100).build(),
    ]);
    catalog.load_reviews_from(input.as_bytes()).await.unwrap();

    let asins = catalog
        .user_reviews("A1")
        .await
        .unwrap()
        .reviews()
        .iter()
        .map(|review| review.asin.clone())
        .collect::<Vec<_>>();
    assert_eq!(asins, ["B3", "B1", "B2"]);

    let reviewers = catalog
        .item_reviews("B1")
        .await
        .unwrap()
        .reviews()
        .iter()
        .map(|review| review.reviewer_id.clone())
        .collect::<Vec<_>>();
    assert_eq!(reviewers, ["A1", "A2"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn reloading_a_review_overwrites_both_copies() {
    init_test_tracing();
    let catalog = ready_catalog(MemoryStore::new(), ingest_config(1)).await;

    let first = ndjson([ReviewLine::new("A1", "B1", 100).summary("old").build()]);
    let second = ndjson([ReviewLine::new("A1", "B1", 100).summary("new").build()]);
    catalog.load_reviews_from(first.as_bytes()).await.unwrap();
    catalog.load_reviews_from(second.as_bytes()).await.unwrap();

    let by_item = catalog.item_reviews("B1").await.unwrap();
    assert_eq!(by_item.len(), 1);
    assert_eq!(by_item.reviews()[0].summary, "new");

    let by_reviewer = catalog.user_reviews("A1").await.unwrap();
    assert_eq!(by_reviewer, by_item);
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_keys_return_empty_listings() {
    init_test_tracing();
    let catalog = ready_catalog(MemoryStore::new(), ingest_config(1)).await;

    assert!(catalog.user_reviews("nobody").await.unwrap().is_empty());
    assert_eq!(catalog.item_reviews("nothing").await.unwrap().to_string(), "");
}
