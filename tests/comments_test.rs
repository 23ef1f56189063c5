//! Integration tests for comment/reply ownership and cascade

mod common;
use serial_test::serial;

use chrono::Utc;
use common::{database::*, fixtures::*};
use readroom::content::{self, ContentKind};
use readroom::engagement;
use readroom::orm::{comments, replies};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

#[actix_rt::test]
#[serial]
async fn test_target_registry_resolves_existing_rows() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let video = create_test_video(&db, "Registered", Utc::now().naive_utc())
        .await
        .expect("video");

    assert!(content::target_exists(&db, ContentKind::Video, video.id)
        .await
        .expect("lookup failed"));
    assert!(!content::target_exists(&db, ContentKind::Video, video.id + 999)
        .await
        .expect("lookup failed"));
    assert!(!content::target_exists(&db, ContentKind::Post, video.id)
        .await
        .expect("lookup failed"),
        "A video id does not resolve as a post");

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_deleting_comment_removes_its_replies() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let user = create_test_user(&db, "author1", "password123")
        .await
        .expect("user");
    let post = create_test_post(&db, "Discussed Post")
        .await
        .expect("post");

    let keep = create_test_comment(&db, user.id, ContentKind::Post, post.id, "keep me")
        .await
        .expect("comment");
    let doomed = create_test_comment(&db, user.id, ContentKind::Post, post.id, "delete me")
        .await
        .expect("comment");

    create_test_reply(&db, user.id, keep.id, "survives")
        .await
        .expect("reply");
    create_test_reply(&db, user.id, doomed.id, "goes away")
        .await
        .expect("reply");
    create_test_reply(&db, user.id, doomed.id, "also goes away")
        .await
        .expect("reply");

    // The handler deletes replies then the comment; the schema cascade
    // backs this up.
    replies::Entity::delete_many()
        .filter(replies::Column::CommentId.eq(doomed.id))
        .exec(&db)
        .await
        .expect("reply delete failed");
    comments::Entity::delete_by_id(doomed.id)
        .exec(&db)
        .await
        .expect("comment delete failed");

    let remaining_replies = replies::Entity::find()
        .all(&db)
        .await
        .expect("fetch failed");
    assert_eq!(remaining_replies.len(), 1);
    assert_eq!(remaining_replies[0].comment_id, keep.id);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_deleting_reply_keeps_parent_comment() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let user = create_test_user(&db, "author2", "password123")
        .await
        .expect("user");
    let post = create_test_post(&db, "Another Post").await.expect("post");
    let comment = create_test_comment(&db, user.id, ContentKind::Post, post.id, "parent")
        .await
        .expect("comment");
    let reply = create_test_reply(&db, user.id, comment.id, "child")
        .await
        .expect("reply");

    replies::Entity::delete_by_id(reply.id)
        .exec(&db)
        .await
        .expect("reply delete failed");

    let parent = comments::Entity::find_by_id(comment.id)
        .one(&db)
        .await
        .expect("fetch failed");
    assert!(parent.is_some(), "Parent comment is untouched");

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_purge_target_sweeps_all_engagement() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let user = create_test_user(&db, "sweeper", "password123")
        .await
        .expect("user");
    let video = create_test_video(&db, "Doomed Video", Utc::now().naive_utc())
        .await
        .expect("video");

    let comment = create_test_comment(&db, user.id, ContentKind::Video, video.id, "a comment")
        .await
        .expect("comment");
    let reply = create_test_reply(&db, user.id, comment.id, "a reply")
        .await
        .expect("reply");

    engagement::ensure_liked(&db, user.id, ContentKind::Video, video.id)
        .await
        .expect("like");
    engagement::ensure_liked(&db, user.id, ContentKind::Comment, comment.id)
        .await
        .expect("like");
    engagement::ensure_liked(&db, user.id, ContentKind::Reply, reply.id)
        .await
        .expect("like");

    engagement::purge_target(&db, ContentKind::Video, video.id)
        .await
        .expect("purge failed");

    use readroom::orm::likes;
    let like_count = likes::Entity::find().count(&db).await.expect("count");
    let comment_count = comments::Entity::find().count(&db).await.expect("count");
    let reply_count = replies::Entity::find().count(&db).await.expect("count");
    assert_eq!(like_count, 0);
    assert_eq!(comment_count, 0);
    assert_eq!(reply_count, 0);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}
