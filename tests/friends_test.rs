//! Integration tests for friendship rows

mod common;
use serial_test::serial;

use chrono::Utc;
use common::{database::*, fixtures::*};
use readroom::orm::friendships::{self, FriendshipStatus};
use sea_orm::{entity::*, ActiveValue::Set, EntityTrait, PaginatorTrait};

async fn send_request(
    db: &sea_orm::DatabaseConnection,
    requester_id: i32,
    addressee_id: i32,
) -> friendships::Model {
    friendships::ActiveModel {
        requester_id: Set(requester_id),
        addressee_id: Set(addressee_id),
        status: Set(FriendshipStatus::Pending),
        created_at: Set(Utc::now().naive_utc()),
        responded_at: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("request insert failed")
}

#[actix_rt::test]
#[serial]
async fn test_find_between_matches_either_direction() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let anna = create_test_user(&db, "anna", "password123").await.expect("user");
    let brit = create_test_user(&db, "brit", "password123").await.expect("user");

    send_request(&db, anna.id, brit.id).await;

    let forward = friendships::Entity::find_between(anna.id, brit.id)
        .one(&db)
        .await
        .expect("query failed");
    let backward = friendships::Entity::find_between(brit.id, anna.id)
        .one(&db)
        .await
        .expect("query failed");

    assert!(forward.is_some());
    assert!(backward.is_some());
    assert_eq!(forward.unwrap().id, backward.unwrap().id);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_accept_flips_status_once() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let carl = create_test_user(&db, "carl", "password123").await.expect("user");
    let dana = create_test_user(&db, "dana", "password123").await.expect("user");

    let request = send_request(&db, carl.id, dana.id).await;

    let mut active: friendships::ActiveModel = request.into();
    active.status = Set(FriendshipStatus::Accepted);
    active.responded_at = Set(Some(Utc::now().naive_utc()));
    let accepted = active.update(&db).await.expect("update failed");

    assert_eq!(accepted.status, FriendshipStatus::Accepted);
    assert!(accepted.responded_at.is_some());

    let total = friendships::Entity::find().count(&db).await.expect("count");
    assert_eq!(total, 1, "Accepting does not create a mirror row");

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}
