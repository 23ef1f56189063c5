//! Integration tests for the section order store fallback chain

mod common;
use serial_test::serial;

use common::database::*;
use readroom::content::SECTION_KEYS;
use readroom::sections;

#[actix_rt::test]
#[serial]
async fn test_default_order_when_nothing_persisted() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let order = sections::effective_order(&db).await.expect("order failed");
    assert_eq!(order, SECTION_KEYS.to_vec());

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_persisted_order_wins_and_completes_with_defaults() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let supplied = sections::parse_order_param("event=1,video=2");
    sections::persist_order(&db, &supplied)
        .await
        .expect("persist failed");

    let order = sections::effective_order(&db).await.expect("order failed");
    assert_eq!(order[0], "event");
    assert_eq!(order[1], "video");
    // Unsupplied keys follow in default relative order.
    assert_eq!(&order[2..], ["post", "moment", "team", "history"]);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_non_staff_param_shapes_response_only() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    // A non-staff caller's explicit ordering is applied to the response
    // (keys_in_order) without touching the store.
    let supplied = sections::parse_order_param("history=1,team=2");
    let response_order = sections::keys_in_order(&supplied);
    assert_eq!(response_order[0], "history");
    assert_eq!(response_order[1], "team");

    // Nothing was persisted, so a later unordered read sees the default.
    let order = sections::effective_order(&db).await.expect("order failed");
    assert_eq!(order, SECTION_KEYS.to_vec());

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_repeated_persist_upserts_positions() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    sections::persist_order(&db, &sections::parse_order_param("video=1,post=2"))
        .await
        .expect("persist failed");
    sections::persist_order(&db, &sections::parse_order_param("post=1,video=2"))
        .await
        .expect("persist failed");

    let order = sections::effective_order(&db).await.expect("order failed");
    assert_eq!(order[0], "post");
    assert_eq!(order[1], "video");

    use readroom::orm::section_positions;
    use sea_orm::{EntityTrait, PaginatorTrait};
    let rows = section_positions::Entity::find()
        .count(&db)
        .await
        .expect("count failed");
    assert_eq!(rows as usize, SECTION_KEYS.len(), "Upserts never duplicate keys");

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_unknown_keys_are_ignored() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let supplied = sections::parse_order_param("carousel=1,video=2");
    sections::persist_order(&db, &supplied)
        .await
        .expect("persist failed");

    let order = sections::effective_order(&db).await.expect("order failed");
    assert!(!order.contains(&"carousel".to_string()));
    assert_eq!(order[0], "video");

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}
