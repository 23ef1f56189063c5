//! Test fixtures for creating test data
#![allow(dead_code)]
#![allow(clippy::needless_update)]

use chrono::Utc;
use sea_orm::{entity::*, ActiveValue::Set, DatabaseConnection, DbErr};

/// Create a regular user with known credentials
pub async fn create_test_user(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
) -> Result<readroom::orm::users::Model, DbErr> {
    create_user_inner(db, username, password, false).await
}

/// Create a staff user with known credentials
pub async fn create_staff_user(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
) -> Result<readroom::orm::users::Model, DbErr> {
    create_user_inner(db, username, password, true).await
}

async fn create_user_inner(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
    is_staff: bool,
) -> Result<readroom::orm::users::Model, DbErr> {
    use readroom::orm::users;

    let password_hash = readroom::session::hash_password(password)
        .map_err(|e| DbErr::Custom(format!("Password hashing failed: {}", e)))?;

    let user = users::ActiveModel {
        username: Set(username.to_string()),
        email: Set(Some(format!("{}@test.com", username))),
        password: Set(password_hash),
        bio: Set(None),
        is_staff: Set(is_staff),
        failed_login_attempts: Set(0),
        locked_until: Set(None),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    };
    user.insert(db).await
}

/// Create a video with the given title and creation time
pub async fn create_test_video(
    db: &DatabaseConnection,
    title: &str,
    created_at: chrono::NaiveDateTime,
) -> Result<readroom::orm::videos::Model, DbErr> {
    use readroom::orm::videos;

    let video = videos::ActiveModel {
        title: Set(title.to_string()),
        description: Set(String::new()),
        youtube_id: Set(None),
        category_id: Set(None),
        view_count: Set(0),
        created_at: Set(created_at),
        updated_at: Set(None),
        ..Default::default()
    };
    video.insert(db).await
}

/// Create a post with the given title
pub async fn create_test_post(
    db: &DatabaseConnection,
    title: &str,
) -> Result<readroom::orm::posts::Model, DbErr> {
    use readroom::orm::posts;

    let post = posts::ActiveModel {
        author_id: Set(None),
        title: Set(title.to_string()),
        body: Set("body".to_string()),
        view_count: Set(0),
        created_at: Set(Utc::now().naive_utc()),
        updated_at: Set(None),
        ..Default::default()
    };
    post.insert(db).await
}

/// Create a comment against a target
pub async fn create_test_comment(
    db: &DatabaseConnection,
    author_id: i32,
    kind: readroom::content::ContentKind,
    target_id: i32,
    body: &str,
) -> Result<readroom::orm::comments::Model, DbErr> {
    use readroom::orm::comments;

    let comment = comments::ActiveModel {
        author_id: Set(Some(author_id)),
        target_kind: Set(kind),
        target_id: Set(target_id),
        body: Set(body.to_string()),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    };
    comment.insert(db).await
}

/// Create a reply under a comment
pub async fn create_test_reply(
    db: &DatabaseConnection,
    author_id: i32,
    comment_id: i32,
    body: &str,
) -> Result<readroom::orm::replies::Model, DbErr> {
    use readroom::orm::replies;

    let reply = replies::ActiveModel {
        author_id: Set(Some(author_id)),
        comment_id: Set(comment_id),
        body: Set(body.to_string()),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    };
    reply.insert(db).await
}
