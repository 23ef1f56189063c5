//! Integration tests for ranked listing determinism

mod common;
use serial_test::serial;

use chrono::{Duration, Utc};
use common::{database::*, fixtures::*};
use readroom::content::ContentKind;
use readroom::engagement::{self, ranking::{self, RankMetric}};

#[actix_rt::test]
#[serial]
async fn test_top_liked_orders_by_count_descending() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let base = Utc::now().naive_utc();
    let low = create_test_video(&db, "One Like", base - Duration::hours(3))
        .await
        .expect("video");
    let high = create_test_video(&db, "Three Likes", base - Duration::hours(2))
        .await
        .expect("video");
    let mid = create_test_video(&db, "Two Likes", base - Duration::hours(1))
        .await
        .expect("video");

    let mut users = Vec::new();
    for i in 0..3 {
        users.push(
            create_test_user(&db, &format!("ranker{}", i), "password123")
                .await
                .expect("user"),
        );
    }

    engagement::ensure_liked(&db, users[0].id, ContentKind::Video, low.id)
        .await
        .expect("like");
    for user in &users[..2] {
        engagement::ensure_liked(&db, user.id, ContentKind::Video, mid.id)
            .await
            .expect("like");
    }
    for user in &users {
        engagement::ensure_liked(&db, user.id, ContentKind::Video, high.id)
            .await
            .expect("like");
    }

    let items = ranking::top_for_kind(&db, ContentKind::Video, RankMetric::Likes, 5)
        .await
        .expect("ranking failed");

    let ids: Vec<i32> = items.iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![high.id, mid.id, low.id]);
    let metrics: Vec<i64> = items.iter().map(|i| i.metric).collect();
    assert_eq!(metrics, vec![3, 2, 1]);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_tie_break_prefers_newer_entity() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let base = Utc::now().naive_utc();
    let older = create_test_video(&db, "Older", base - Duration::days(2))
        .await
        .expect("video");
    let newer = create_test_video(&db, "Newer", base - Duration::days(1))
        .await
        .expect("video");

    let user = create_test_user(&db, "tiebreaker", "password123")
        .await
        .expect("user");
    engagement::ensure_liked(&db, user.id, ContentKind::Video, older.id)
        .await
        .expect("like");
    engagement::ensure_liked(&db, user.id, ContentKind::Video, newer.id)
        .await
        .expect("like");

    // Equal like counts: the later creation time wins.
    let items = ranking::top_for_kind(&db, ContentKind::Video, RankMetric::Likes, 5)
        .await
        .expect("ranking failed");
    let ids: Vec<i32> = items.iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![newer.id, older.id]);

    // Reproducible across runs.
    let again = ranking::top_for_kind(&db, ContentKind::Video, RankMetric::Likes, 5)
        .await
        .expect("ranking failed");
    let again_ids: Vec<i32> = again.iter().map(|i| i.id).collect();
    assert_eq!(ids, again_ids);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_limit_bounds_result_count() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let base = Utc::now().naive_utc();
    for i in 0..8 {
        create_test_video(&db, &format!("Video {}", i), base - Duration::minutes(i))
            .await
            .expect("video");
    }

    // The default limit (what an unparsable ?limit=abc resolves to) is 5.
    let limit = ranking::parse_limit(Some("abc"), ranking::DEFAULT_TOP_LIMIT);
    let items = ranking::top_for_kind(&db, ContentKind::Video, RankMetric::Views, limit)
        .await
        .expect("ranking failed");
    assert_eq!(items.len(), 5);

    let items = ranking::top_for_kind(&db, ContentKind::Video, RankMetric::Views, 3)
        .await
        .expect("ranking failed");
    assert_eq!(items.len(), 3);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_top_commented_counts_replies() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let base = Utc::now().naive_utc();
    let quiet = create_test_video(&db, "Quiet", base - Duration::hours(2))
        .await
        .expect("video");
    let busy = create_test_video(&db, "Busy", base - Duration::hours(1))
        .await
        .expect("video");

    let user = create_test_user(&db, "discusser", "password123")
        .await
        .expect("user");

    create_test_comment(&db, user.id, ContentKind::Video, quiet.id, "only comment")
        .await
        .expect("comment");

    let comment = create_test_comment(&db, user.id, ContentKind::Video, busy.id, "first")
        .await
        .expect("comment");
    create_test_reply(&db, user.id, comment.id, "reply one")
        .await
        .expect("reply");
    create_test_reply(&db, user.id, comment.id, "reply two")
        .await
        .expect("reply");

    let items = ranking::top_for_kind(&db, ContentKind::Video, RankMetric::Comments, 5)
        .await
        .expect("ranking failed");
    let ids: Vec<i32> = items.iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![busy.id, quiet.id]);
    assert_eq!(items[0].metric, 3, "comment plus two replies");
    assert_eq!(items[1].metric, 1);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}
