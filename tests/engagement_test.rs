//! Integration tests for bulk engagement annotation

mod common;
use serial_test::serial;

use chrono::Utc;
use common::{database::*, fixtures::*};
use readroom::content::ContentKind;
use readroom::engagement;

#[actix_rt::test]
#[serial]
async fn test_bulk_annotation_covers_every_requested_id() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let user = create_test_user(&db, "bulk1", "password123")
        .await
        .expect("user");
    let liked = create_test_video(&db, "Liked", Utc::now().naive_utc())
        .await
        .expect("video");
    let ignored = create_test_video(&db, "Ignored", Utc::now().naive_utc())
        .await
        .expect("video");

    engagement::ensure_liked(&db, user.id, ContentKind::Video, liked.id)
        .await
        .expect("like");
    create_test_comment(&db, user.id, ContentKind::Video, liked.id, "note")
        .await
        .expect("comment");

    let map = engagement::annotate(&db, ContentKind::Video, &[liked.id, ignored.id], Some(user.id))
        .await
        .expect("annotation failed");

    let hot = map.get(&liked.id).expect("annotated");
    assert_eq!(hot.like_count, 1);
    assert_eq!(hot.comment_count, 1);
    assert!(hot.has_liked);

    // Rows with no engagement still get a zeroed entry.
    let cold = map.get(&ignored.id).expect("annotated");
    assert_eq!(cold.like_count, 0);
    assert_eq!(cold.comment_count, 0);
    assert!(!cold.has_liked);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_anonymous_viewer_never_has_liked() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let user = create_test_user(&db, "bulk2", "password123")
        .await
        .expect("user");
    let video = create_test_video(&db, "Anonymous View", Utc::now().naive_utc())
        .await
        .expect("video");
    engagement::ensure_liked(&db, user.id, ContentKind::Video, video.id)
        .await
        .expect("like");

    let summary = engagement::annotate_one(&db, ContentKind::Video, video.id, None)
        .await
        .expect("annotation failed");
    assert_eq!(summary.like_count, 1);
    assert!(!summary.has_liked, "Guests never see has_liked=true");

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_empty_collection_short_circuits() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");

    let map = engagement::annotate(&db, ContentKind::Video, &[], Some(1))
        .await
        .expect("annotation failed");
    assert!(map.is_empty());
}

#[actix_rt::test]
#[serial]
async fn test_replies_roll_up_into_comment_count() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let user = create_test_user(&db, "bulk3", "password123")
        .await
        .expect("user");
    let post = create_test_post(&db, "Threaded").await.expect("post");
    let comment = create_test_comment(&db, user.id, ContentKind::Post, post.id, "root")
        .await
        .expect("comment");
    create_test_reply(&db, user.id, comment.id, "one")
        .await
        .expect("reply");
    create_test_reply(&db, user.id, comment.id, "two")
        .await
        .expect("reply");

    let summary = engagement::annotate_one(&db, ContentKind::Post, post.id, None)
        .await
        .expect("annotation failed");
    assert_eq!(summary.comment_count, 3, "one comment plus two replies");

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_likes_and_ratings_read_together() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    use readroom::engagement::ratings;

    let post = create_test_post(&db, "Flagship Post").await.expect("post");

    // 3 likes and ratings [4, 5, 3] from three users.
    let values = [4, 5, 3];
    for (i, value) in values.iter().enumerate() {
        let user = create_test_user(&db, &format!("e2e{}", i), "password123")
            .await
            .expect("user");
        engagement::ensure_liked(&db, user.id, ContentKind::Post, post.id)
            .await
            .expect("like");
        ratings::rate_post(&db, user.id, post.id, *value)
            .await
            .expect("rating");
    }

    let summary = engagement::annotate_one(&db, ContentKind::Post, post.id, None)
        .await
        .expect("annotation failed");
    assert_eq!(summary.like_count, 3);

    let rating = ratings::post_summary(&db, post.id, None)
        .await
        .expect("summary failed");
    assert_eq!(rating.average_rating, Some(4.0));
    assert_eq!(rating.rating_count, 3);

    // A fourth user submitting 6 is rejected at validation; the store is
    // unchanged.
    assert!(!ratings::rating_in_bounds(6));
    let rating = ratings::post_summary(&db, post.id, None)
        .await
        .expect("summary failed");
    assert_eq!(rating.rating_count, 3);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}
