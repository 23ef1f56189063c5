//! Integration tests for like/unlike idempotence and uniqueness

mod common;
use serial_test::serial;

use chrono::Utc;
use common::{database::*, fixtures::*};
use readroom::content::ContentKind;
use readroom::engagement;
use readroom::orm::likes;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

#[actix_rt::test]
#[serial]
async fn test_like_is_idempotent() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let user = create_test_user(&db, "liker1", "password123")
        .await
        .expect("Failed to create user");
    let video = create_test_video(&db, "First Meeting", Utc::now().naive_utc())
        .await
        .expect("Failed to create video");

    engagement::ensure_liked(&db, user.id, ContentKind::Video, video.id)
        .await
        .expect("First like failed");
    engagement::ensure_liked(&db, user.id, ContentKind::Video, video.id)
        .await
        .expect("Repeated like should be a no-op");

    let count = likes::Entity::find()
        .filter(likes::Column::TargetKind.eq(ContentKind::Video))
        .filter(likes::Column::TargetId.eq(video.id))
        .count(&db)
        .await
        .expect("Failed to count likes");
    assert_eq!(count, 1, "Exactly one like row per (user, target)");

    let summary = engagement::annotate_one(&db, ContentKind::Video, video.id, Some(user.id))
        .await
        .expect("Annotation failed");
    assert_eq!(summary.like_count, 1);
    assert!(summary.has_liked);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_unlike_is_idempotent() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let user = create_test_user(&db, "liker2", "password123")
        .await
        .expect("Failed to create user");
    let video = create_test_video(&db, "Second Meeting", Utc::now().naive_utc())
        .await
        .expect("Failed to create video");

    // Unliking something never liked is a silent no-op.
    engagement::ensure_unliked(&db, user.id, ContentKind::Video, video.id)
        .await
        .expect("Unlike of unliked target should not error");

    engagement::ensure_liked(&db, user.id, ContentKind::Video, video.id)
        .await
        .expect("Like failed");
    engagement::ensure_unliked(&db, user.id, ContentKind::Video, video.id)
        .await
        .expect("Unlike failed");
    engagement::ensure_unliked(&db, user.id, ContentKind::Video, video.id)
        .await
        .expect("Repeated unlike should be a no-op");

    let count = likes::Entity::find()
        .filter(likes::Column::TargetId.eq(video.id))
        .count(&db)
        .await
        .expect("Failed to count likes");
    assert_eq!(count, 0);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_likes_are_per_user_per_target() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let alice = create_test_user(&db, "alice", "password123")
        .await
        .expect("Failed to create user");
    let bob = create_test_user(&db, "bob", "password123")
        .await
        .expect("Failed to create user");
    let video = create_test_video(&db, "Shared Meeting", Utc::now().naive_utc())
        .await
        .expect("Failed to create video");

    engagement::ensure_liked(&db, alice.id, ContentKind::Video, video.id)
        .await
        .expect("Alice's like failed");
    engagement::ensure_liked(&db, bob.id, ContentKind::Video, video.id)
        .await
        .expect("Bob's like failed");

    let summary = engagement::annotate_one(&db, ContentKind::Video, video.id, Some(alice.id))
        .await
        .expect("Annotation failed");
    assert_eq!(summary.like_count, 2);
    assert!(summary.has_liked);

    // Bob unliking leaves Alice's like untouched.
    engagement::ensure_unliked(&db, bob.id, ContentKind::Video, video.id)
        .await
        .expect("Unlike failed");

    let summary = engagement::annotate_one(&db, ContentKind::Video, video.id, Some(bob.id))
        .await
        .expect("Annotation failed");
    assert_eq!(summary.like_count, 1);
    assert!(!summary.has_liked);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_comments_are_likable() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let user = create_test_user(&db, "commenter", "password123")
        .await
        .expect("Failed to create user");
    let video = create_test_video(&db, "Discussed Meeting", Utc::now().naive_utc())
        .await
        .expect("Failed to create video");
    let comment = create_test_comment(&db, user.id, ContentKind::Video, video.id, "Great session")
        .await
        .expect("Failed to create comment");

    engagement::ensure_liked(&db, user.id, ContentKind::Comment, comment.id)
        .await
        .expect("Comment like failed");

    let summary = engagement::annotate_one(&db, ContentKind::Comment, comment.id, Some(user.id))
        .await
        .expect("Annotation failed");
    assert_eq!(summary.like_count, 1);
    assert!(summary.has_liked);
    // Comments carry likes only; their discussion lives in replies.
    assert_eq!(summary.comment_count, 0);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}
