//! Integration tests for password reset tokens

mod common;
use serial_test::serial;

use chrono::{Duration, Utc};
use common::{database::*, fixtures::*};
use readroom::orm::password_reset_tokens;
use sea_orm::{entity::*, ActiveValue::Set, EntityTrait};

#[actix_rt::test]
#[serial]
async fn test_token_round_trip_and_single_use() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let user = create_test_user(&db, "resetter", "password123")
        .await
        .expect("user");

    let now = Utc::now().naive_utc();
    let token = password_reset_tokens::ActiveModel {
        token: Set("testtoken1234".to_string()),
        user_id: Set(user.id),
        created_at: Set(now),
        expires_at: Set(now + Duration::hours(1)),
        used: Set(false),
    }
    .insert(&db)
    .await
    .expect("token insert failed");

    assert!(!token.used);
    assert!(token.expires_at > now);

    // Redeeming marks the token used; a second redemption sees it.
    let mut active: password_reset_tokens::ActiveModel = token.into();
    active.used = Set(true);
    let spent = active.update(&db).await.expect("update failed");
    assert!(spent.used);

    let reloaded = password_reset_tokens::Entity::find_by_id("testtoken1234".to_string())
        .one(&db)
        .await
        .expect("fetch failed")
        .expect("token row");
    assert!(reloaded.used);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_expired_token_is_detectable() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let user = create_test_user(&db, "expired", "password123")
        .await
        .expect("user");

    let now = Utc::now().naive_utc();
    let token = password_reset_tokens::ActiveModel {
        token: Set("expiredtoken".to_string()),
        user_id: Set(user.id),
        created_at: Set(now - Duration::hours(2)),
        expires_at: Set(now - Duration::hours(1)),
        used: Set(false),
    }
    .insert(&db)
    .await
    .expect("token insert failed");

    assert!(token.expires_at < now, "Confirm handler rejects this token");

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}
