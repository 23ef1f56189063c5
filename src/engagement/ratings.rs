//! Star ratings for rating-capable content.
//!
//! Each rated kind has its own table (post_ratings, video_ratings) with one
//! row per (user, entity). Re-rating overwrites; deleting removes the row.

use crate::orm::{post_ratings, video_ratings};
use chrono::Utc;
use sea_orm::{entity::*, query::*, ColumnTrait, DatabaseConnection, DbErr, EntityTrait};
use serde::Serialize;

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

/// Aggregated rating state for one entity, as seen by one viewer.
#[derive(Clone, Debug, Default, Serialize)]
pub struct RatingSummary {
    /// Mean of all values rounded to 2 decimals, or null with no ratings.
    pub average_rating: Option<f64>,
    pub rating_count: i64,
    /// The viewer's own value, or null.
    pub user_rating: Option<i32>,
}

/// Range check. Out-of-range input is a validation failure for the caller,
/// never a clamp.
pub fn rating_in_bounds(value: i32) -> bool {
    (MIN_RATING..=MAX_RATING).contains(&value)
}

fn summarize(values: &[(i32, i32)], viewer: Option<i32>) -> RatingSummary {
    if values.is_empty() {
        return RatingSummary::default();
    }
    let sum: i64 = values.iter().map(|(_, v)| *v as i64).sum();
    let count = values.len() as i64;
    let average = (sum as f64 / count as f64 * 100.0).round() / 100.0;
    let user_rating = viewer.and_then(|uid| {
        values
            .iter()
            .find(|(user_id, _)| *user_id == uid)
            .map(|(_, v)| *v)
    });

    RatingSummary {
        average_rating: Some(average),
        rating_count: count,
        user_rating,
    }
}

/// All ratings for a post, folded into a summary.
pub async fn post_summary(
    db: &DatabaseConnection,
    post_id: i32,
    viewer: Option<i32>,
) -> Result<RatingSummary, DbErr> {
    let rows = post_ratings::Entity::find()
        .filter(post_ratings::Column::PostId.eq(post_id))
        .all(db)
        .await?;
    let values: Vec<(i32, i32)> = rows.iter().map(|r| (r.user_id, r.value)).collect();
    Ok(summarize(&values, viewer))
}

/// All ratings for a video, folded into a summary.
pub async fn video_summary(
    db: &DatabaseConnection,
    video_id: i32,
    viewer: Option<i32>,
) -> Result<RatingSummary, DbErr> {
    let rows = video_ratings::Entity::find()
        .filter(video_ratings::Column::VideoId.eq(video_id))
        .all(db)
        .await?;
    let values: Vec<(i32, i32)> = rows.iter().map(|r| (r.user_id, r.value)).collect();
    Ok(summarize(&values, viewer))
}

/// Upsert the caller's rating on a post. Value must already be validated.
pub async fn rate_post(
    db: &DatabaseConnection,
    user_id: i32,
    post_id: i32,
    value: i32,
) -> Result<(), DbErr> {
    let now = Utc::now().naive_utc();
    let existing = post_ratings::Entity::find()
        .filter(post_ratings::Column::UserId.eq(user_id))
        .filter(post_ratings::Column::PostId.eq(post_id))
        .one(db)
        .await?;

    match existing {
        Some(row) => {
            let mut active: post_ratings::ActiveModel = row.into();
            active.value = Set(value);
            active.updated_at = Set(now);
            active.update(db).await?;
        }
        None => {
            let rating = post_ratings::ActiveModel {
                user_id: Set(user_id),
                post_id: Set(post_id),
                value: Set(value),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            };
            rating.insert(db).await?;
        }
    }
    Ok(())
}

/// Upsert the caller's rating on a video.
pub async fn rate_video(
    db: &DatabaseConnection,
    user_id: i32,
    video_id: i32,
    value: i32,
) -> Result<(), DbErr> {
    let now = Utc::now().naive_utc();
    let existing = video_ratings::Entity::find()
        .filter(video_ratings::Column::UserId.eq(user_id))
        .filter(video_ratings::Column::VideoId.eq(video_id))
        .one(db)
        .await?;

    match existing {
        Some(row) => {
            let mut active: video_ratings::ActiveModel = row.into();
            active.value = Set(value);
            active.updated_at = Set(now);
            active.update(db).await?;
        }
        None => {
            let rating = video_ratings::ActiveModel {
                user_id: Set(user_id),
                video_id: Set(video_id),
                value: Set(value),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            };
            rating.insert(db).await?;
        }
    }
    Ok(())
}

/// Remove the caller's rating on a post. Absent rows are a silent success.
pub async fn unrate_post(db: &DatabaseConnection, user_id: i32, post_id: i32) -> Result<(), DbErr> {
    post_ratings::Entity::delete_many()
        .filter(post_ratings::Column::UserId.eq(user_id))
        .filter(post_ratings::Column::PostId.eq(post_id))
        .exec(db)
        .await?;
    Ok(())
}

/// Remove the caller's rating on a video.
pub async fn unrate_video(
    db: &DatabaseConnection,
    user_id: i32,
    video_id: i32,
) -> Result<(), DbErr> {
    video_ratings::Entity::delete_many()
        .filter(video_ratings::Column::UserId.eq(user_id))
        .filter(video_ratings::Column::VideoId.eq(video_id))
        .exec(db)
        .await?;
    Ok(())
}
