//! End-to-end tests for the catalog sync protocol over the in-memory
//! backend: pagination lifecycle, session isolation, and mutation
//! reconciliation under failure.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use spot_catalog::backend::{CatalogBackend, InMemoryCatalog};
use spot_catalog::config::{CatalogConfig, SessionContext};
use spot_catalog::errors::CatalogError;
use spot_catalog::models::{
    to_raw, AssetRef, CatalogRecord, Coordinate, ReportCounters, ReportReason,
};
use spot_catalog::query::{QueryBuilder, SortMode};
use spot_catalog::session::CatalogSession;
use spot_catalog::subscription::SubscriptionBuilder;

const CENTER: Coordinate = Coordinate {
    latitude: 33.71,
    longitude: -112.29,
};

/// Fixture record `index` steps north of the center, so ascending index
/// means ascending distance.
fn fixture_record(index: usize) -> CatalogRecord {
    CatalogRecord {
        id: format!("spot-{index:02}"),
        name: format!("Spot {index:02}"),
        founder: "Avery".to_string(),
        description: "Fixture spot".to_string(),
        date: "March 2024".to_string(),
        coordinate: Coordinate {
            latitude: CENTER.latitude + index as f64 * 0.01,
            longitude: CENTER.longitude,
        },
        category: "Hiking".to_string(),
        images: vec![AssetRef {
            id: format!("asset-{index:02}"),
            url: None,
        }],
        likes: 0,
        reports: ReportCounters::default(),
        has_more_images: false,
        place_name: "Sonoran Preserve".to_string(),
        owner_id: "user-1".to_string(),
        created_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
            + Duration::minutes(index as i64),
    }
}

async fn seeded_catalog(count: usize) -> Arc<InMemoryCatalog> {
    let catalog = Arc::new(InMemoryCatalog::new());
    catalog
        .seed((0..count).map(|i| to_raw(&fixture_record(i))).collect())
        .await;
    catalog
}

fn session_for(catalog: &Arc<InMemoryCatalog>) -> CatalogSession {
    CatalogSession::new(
        catalog.clone(),
        CatalogConfig::default(),
        SessionContext::new("user-1", "Avery"),
    )
}

// Scenario A: 25-record fixture, page size 20, sorted by distance:
// the first page holds the 20 closest, the second the remaining 5.
#[tokio::test]
async fn first_and_second_page_walk_a_25_record_catalog() {
    let catalog = seeded_catalog(25).await;
    let session = session_for(&catalog);

    let query = QueryBuilder::new(CENTER).sort(SortMode::Closest).build();
    session.search(query).await.unwrap();

    let first_page = session.records().await;
    assert_eq!(first_page.len(), 20);
    assert!(session.has_more().await);
    for pair in first_page.windows(2) {
        let da = pair[0].coordinate.distance_meters(&CENTER);
        let db = pair[1].coordinate.distance_meters(&CENTER);
        assert!(da <= db, "page is sorted by ascending distance");
    }

    let has_more = session.load_more().await.unwrap();
    assert!(!has_more);
    assert_eq!(session.records().await.len(), 25);
    assert!(!session.has_more().await);

    // A further load is a clean no-op
    assert!(!session.load_more().await.unwrap());
    assert_eq!(session.records().await.len(), 25);
}

// P5: pagination terminates and never over-returns for any finite set.
#[tokio::test]
async fn pagination_terminates_on_finite_datasets() {
    for count in [0usize, 1, 7, 20, 53] {
        let catalog = seeded_catalog(count).await;
        let session = session_for(&catalog);
        session
            .search(QueryBuilder::new(CENTER).build())
            .await
            .unwrap();

        let mut rounds = 0;
        while session.has_more().await {
            session.load_more().await.unwrap();
            rounds += 1;
            assert!(rounds <= count / 20 + 2, "cursor walk must terminate");
        }
        assert_eq!(session.records().await.len(), count);
    }
}

// The policy cap bounds a pathological cursor walk.
#[tokio::test]
async fn record_cap_bounds_total_fetched() {
    let catalog = seeded_catalog(60).await;
    let session = CatalogSession::new(
        catalog.clone(),
        CatalogConfig {
            default_page_size: 20,
            max_total_records: 50,
        },
        SessionContext::new("user-1", "Avery"),
    );
    session
        .search(QueryBuilder::new(CENTER).build())
        .await
        .unwrap();
    while session.has_more().await {
        session.load_more().await.unwrap();
    }
    assert_eq!(session.records().await.len(), 50);
}

// Scenario B: sessions are isolated; mutating one cache never alters
// another session's contents.
#[tokio::test]
async fn sessions_do_not_share_cache_state() {
    let catalog = seeded_catalog(10).await;
    let session_a = session_for(&catalog);
    let session_b = session_for(&catalog);

    session_a
        .search(QueryBuilder::new(CENTER).build())
        .await
        .unwrap();
    session_b
        .search(QueryBuilder::new(CENTER).radius_meters(3_000.0).build())
        .await
        .unwrap();

    let b_before = session_b.records().await;
    assert!(b_before.len() < 10, "radius bound trimmed session B");

    session_a.toggle_like("spot-00", true).await.unwrap();
    session_a.delete_spot("spot-09").await.unwrap();

    let b_after = session_b.records().await;
    assert_eq!(b_before, b_after, "session B never observed A's mutations");
    assert_eq!(
        session_a
            .records()
            .await
            .iter()
            .find(|r| r.id == "spot-00")
            .unwrap()
            .likes,
        1
    );
}

// Scenario C: a failed like leaves the cached count untouched.
#[tokio::test]
async fn failed_like_does_not_commit_optimistic_state() {
    let catalog = seeded_catalog(5).await;
    let mut liked = fixture_record(2);
    liked.likes = 3;
    catalog.seed(vec![to_raw(&liked)]).await;

    let session = session_for(&catalog);
    session
        .search(QueryBuilder::new(CENTER).build())
        .await
        .unwrap();

    catalog.set_offline(true);
    let err = session.toggle_like("spot-02", true).await.unwrap_err();
    assert!(matches!(err, CatalogError::RemoteUnavailable { .. }));

    let records = session.records().await;
    let cached = records.iter().find(|r| r.id == "spot-02").unwrap();
    assert_eq!(cached.likes, 3, "no optimistic commit without confirmation");
}

// P4: unlike at zero is rejected before any remote write.
#[tokio::test]
async fn unlike_at_zero_is_a_silent_no_op() {
    let catalog = seeded_catalog(3).await;
    let session = session_for(&catalog);
    session
        .search(QueryBuilder::new(CENTER).build())
        .await
        .unwrap();

    let applied = session.toggle_like("spot-01", false).await.unwrap();
    assert!(!applied);
    assert_eq!(catalog.save_calls(), 0);
}

// Scenario D: a record deleted this session stays gone even while a
// page fetch was in flight when the delete landed.
#[tokio::test]
async fn deleted_record_is_not_reinserted_by_remaining_pages() {
    let catalog = seeded_catalog(30).await;
    let session = session_for(&catalog);
    session
        .search(QueryBuilder::new(CENTER).build())
        .await
        .unwrap();

    // spot-25 sits on the second page, not yet cached
    session.delete_spot("spot-25").await.unwrap();
    session.load_more().await.unwrap();

    let records = session.records().await;
    assert_eq!(records.len(), 29);
    assert!(records.iter().all(|r| r.id != "spot-25"));
}

#[tokio::test]
async fn report_confirms_before_mirroring_into_cache() {
    let catalog = seeded_catalog(3).await;
    let session = session_for(&catalog);
    session
        .search(QueryBuilder::new(CENTER).build())
        .await
        .unwrap();

    let applied = session
        .report("spot-01", ReportReason::Inappropriate)
        .await
        .unwrap();
    assert!(applied);
    let records = session.records().await;
    assert_eq!(
        records
            .iter()
            .find(|r| r.id == "spot-01")
            .unwrap()
            .reports
            .inappropriate,
        1
    );
}

#[tokio::test]
async fn text_filter_narrows_the_feed() {
    let catalog = seeded_catalog(5).await;
    let mut odd_one = fixture_record(6);
    odd_one.description = "Secret swimming hole".to_string();
    catalog.seed(vec![to_raw(&odd_one)]).await;

    let session = session_for(&catalog);
    session
        .search(QueryBuilder::new(CENTER).text_filter("swimming").build())
        .await
        .unwrap();

    let records = session.records().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, "spot-06");
}

#[tokio::test]
async fn deep_link_resolution_round_trips() {
    let catalog = seeded_catalog(3).await;
    let session = session_for(&catalog);

    let record = session.resolve_spot("spot-02").await.unwrap();
    assert_eq!(record.name, "Spot 02");

    assert!(matches!(
        session.resolve_spot("not-a-spot").await,
        Err(CatalogError::RecordNotFound { .. })
    ));
}

#[tokio::test]
async fn publish_then_search_finds_the_new_spot() {
    let catalog = seeded_catalog(0).await;
    let session = session_for(&catalog);

    let request = spot_catalog::models::PublishRequest {
        name: "Hidden Falls".to_string(),
        founder: "Avery".to_string(),
        description: "Seasonal waterfall".to_string(),
        date: "April 2024".to_string(),
        coordinate: CENTER,
        category: "Hiking".to_string(),
        place_name: "New River".to_string(),
        images: vec![vec![1, 2, 3]],
    };
    let id = session.publish(&request).await.unwrap();

    session
        .search(QueryBuilder::new(CENTER).build())
        .await
        .unwrap();
    let records = session.records().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, id);
    assert_eq!(records[0].owner_id, "user-1");
}

#[tokio::test]
async fn subscription_registration_reaches_the_backend() {
    let catalog = seeded_catalog(0).await;
    let subscription = SubscriptionBuilder::new(CENTER)
        .radius_meters(10_000.0)
        .text_filter("waterfall")
        .build();

    let id = catalog.register_subscription(&subscription).await.unwrap();
    assert!(!id.is_empty());
    assert_eq!(catalog.subscription_count().await, 1);
}
