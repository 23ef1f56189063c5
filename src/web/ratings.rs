//! Star rating endpoints for posts and videos
//!
//! One rating row per (user, entity); POST upserts, DELETE removes. Values
//! outside 1..=5 are a validation failure, never a clamp.

use crate::db::get_db_pool;
use crate::engagement::ratings;
use crate::middleware::ClientCtx;
use crate::orm::{posts, videos};
use actix_web::{delete, error, post, web, Error, HttpResponse};
use sea_orm::EntityTrait;
use serde::Deserialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(rate_post)
        .service(unrate_post)
        .service(rate_video)
        .service(unrate_video);
}

#[derive(Deserialize)]
struct RatingForm {
    rating: i32,
}

fn rating_error() -> Error {
    error::ErrorBadRequest(
        serde_json::json!({ "rating": "Rating must be an integer between 1 and 5." }).to_string(),
    )
}

/// POST /posts/{id}/rating - upsert the caller's rating
#[post("/posts/{id}/rating")]
async fn rate_post(
    client: ClientCtx,
    path: web::Path<i32>,
    form: web::Json<RatingForm>,
) -> Result<HttpResponse, Error> {
    let user_id = client.require_login()?;
    let post_id = path.into_inner();

    if !ratings::rating_in_bounds(form.rating) {
        return Err(rating_error());
    }

    let db = get_db_pool();
    posts::Entity::find_by_id(post_id)
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("Post not found"))?;

    ratings::rate_post(db, user_id, post_id, form.rating)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let summary = ratings::post_summary(db, post_id, Some(user_id))
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(summary))
}

/// DELETE /posts/{id}/rating - remove the caller's rating, idempotent
#[delete("/posts/{id}/rating")]
async fn unrate_post(client: ClientCtx, path: web::Path<i32>) -> Result<HttpResponse, Error> {
    let user_id = client.require_login()?;
    let post_id = path.into_inner();

    let db = get_db_pool();
    posts::Entity::find_by_id(post_id)
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("Post not found"))?;

    ratings::unrate_post(db, user_id, post_id)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let summary = ratings::post_summary(db, post_id, Some(user_id))
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(summary))
}

/// POST /videos/{id}/rating - upsert the caller's rating
#[post("/videos/{id}/rating")]
async fn rate_video(
    client: ClientCtx,
    path: web::Path<i32>,
    form: web::Json<RatingForm>,
) -> Result<HttpResponse, Error> {
    let user_id = client.require_login()?;
    let video_id = path.into_inner();

    if !ratings::rating_in_bounds(form.rating) {
        return Err(rating_error());
    }

    let db = get_db_pool();
    videos::Entity::find_by_id(video_id)
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("Video not found"))?;

    ratings::rate_video(db, user_id, video_id, form.rating)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let summary = ratings::video_summary(db, video_id, Some(user_id))
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(summary))
}

/// DELETE /videos/{id}/rating - remove the caller's rating, idempotent
#[delete("/videos/{id}/rating")]
async fn unrate_video(client: ClientCtx, path: web::Path<i32>) -> Result<HttpResponse, Error> {
    let user_id = client.require_login()?;
    let video_id = path.into_inner();

    let db = get_db_pool();
    videos::Entity::find_by_id(video_id)
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("Video not found"))?;

    ratings::unrate_video(db, user_id, video_id)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let summary = ratings::video_summary(db, video_id, Some(user_id))
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(summary))
}
