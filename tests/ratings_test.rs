//! Integration tests for rating upsert/delete semantics

mod common;
use serial_test::serial;

use common::{database::*, fixtures::*};
use readroom::engagement::ratings;
use readroom::orm::post_ratings;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

#[actix_rt::test]
#[serial]
async fn test_rating_upsert_overwrites() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let user = create_test_user(&db, "rater1", "password123")
        .await
        .expect("Failed to create user");
    let post = create_test_post(&db, "Reading Notes")
        .await
        .expect("Failed to create post");

    ratings::rate_post(&db, user.id, post.id, 3)
        .await
        .expect("First rating failed");
    ratings::rate_post(&db, user.id, post.id, 5)
        .await
        .expect("Re-rating failed");

    let rows = post_ratings::Entity::find()
        .filter(post_ratings::Column::PostId.eq(post.id))
        .all(&db)
        .await
        .expect("Failed to fetch ratings");
    assert_eq!(rows.len(), 1, "Re-rating must not create a second row");
    assert_eq!(rows[0].value, 5, "Re-rating overwrites the value");

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_rating_summary_aggregates_all_raters() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let post = create_test_post(&db, "Club Review")
        .await
        .expect("Failed to create post");

    let values = [4, 5, 3];
    let mut raters = Vec::new();
    for (i, value) in values.iter().enumerate() {
        let user = create_test_user(&db, &format!("panel{}", i), "password123")
            .await
            .expect("Failed to create user");
        ratings::rate_post(&db, user.id, post.id, *value)
            .await
            .expect("Rating failed");
        raters.push(user);
    }

    let summary = ratings::post_summary(&db, post.id, Some(raters[0].id))
        .await
        .expect("Summary failed");
    assert_eq!(summary.average_rating, Some(4.0));
    assert_eq!(summary.rating_count, 3);
    assert_eq!(summary.user_rating, Some(4));

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_rating_delete_is_idempotent() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let user = create_test_user(&db, "rater2", "password123")
        .await
        .expect("Failed to create user");
    let post = create_test_post(&db, "Short Review")
        .await
        .expect("Failed to create post");

    ratings::rate_post(&db, user.id, post.id, 2)
        .await
        .expect("Rating failed");
    ratings::unrate_post(&db, user.id, post.id)
        .await
        .expect("Delete failed");
    // Absent rating deletes silently.
    ratings::unrate_post(&db, user.id, post.id)
        .await
        .expect("Repeated delete should be a no-op");

    let count = post_ratings::Entity::find()
        .filter(post_ratings::Column::PostId.eq(post.id))
        .count(&db)
        .await
        .expect("Failed to count ratings");
    assert_eq!(count, 0, "Delete removes the row entirely");

    let summary = ratings::post_summary(&db, post.id, Some(user.id))
        .await
        .expect("Summary failed");
    assert_eq!(summary.average_rating, None);
    assert_eq!(summary.rating_count, 0);
    assert_eq!(summary.user_rating, None);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_out_of_range_rating_never_reaches_the_store() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let post = create_test_post(&db, "Bounded Review")
        .await
        .expect("Failed to create post");

    let values = [4, 5, 3];
    for (i, value) in values.iter().enumerate() {
        let user = create_test_user(&db, &format!("bound{}", i), "password123")
            .await
            .expect("Failed to create user");
        ratings::rate_post(&db, user.id, post.id, *value)
            .await
            .expect("Rating failed");
    }

    // The handler boundary rejects 6 before any write; the store keeps 3 rows.
    assert!(!ratings::rating_in_bounds(6));
    assert!(!ratings::rating_in_bounds(0));

    let summary = ratings::post_summary(&db, post.id, None)
        .await
        .expect("Summary failed");
    assert_eq!(summary.rating_count, 3);
    assert_eq!(summary.average_rating, Some(4.0));

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}
