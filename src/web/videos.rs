//! Video endpoints
//!
//! Listing, detail (which bumps the view counter), staff CRUD, ranked
//! listings, and the `has_liked` PATCH affordance.

use crate::config::Config;
use crate::content::ContentKind;
use crate::db::get_db_pool;
use crate::engagement::ranking::{self, RankMetric};
use crate::engagement::{self, ratings};
use crate::middleware::ClientCtx;
use crate::orm::{categories, videos};
use actix_web::{delete, error, get, patch, post, web, Error, HttpResponse};
use chrono::Utc;
use sea_orm::{entity::*, query::*, sea_query::Expr, ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    // Fixed segments before /{id} routes.
    conf.service(top_liked)
        .service(top_viewed)
        .service(top_commented)
        .service(list_videos)
        .service(create_video)
        .service(view_video)
        .service(update_video)
        .service(delete_video);
}

#[derive(Serialize)]
struct VideoView {
    id: i32,
    title: String,
    description: String,
    youtube_id: Option<String>,
    category_id: Option<i32>,
    view_count: i32,
    created_at: chrono::NaiveDateTime,
    like_count: i64,
    comment_count: i64,
    has_liked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    rating: Option<ratings::RatingSummary>,
}

impl VideoView {
    fn from_model(model: videos::Model, summary: engagement::Engagement) -> Self {
        Self {
            id: model.id,
            title: model.title,
            description: model.description,
            youtube_id: model.youtube_id,
            category_id: model.category_id,
            view_count: model.view_count,
            created_at: model.created_at,
            like_count: summary.like_count,
            comment_count: summary.comment_count,
            has_liked: summary.has_liked,
            rating: None,
        }
    }
}

#[derive(Deserialize)]
struct ListQuery {
    page: Option<u64>,
    per_page: Option<u64>,
    category: Option<i32>,
}

#[derive(Deserialize)]
struct TopQuery {
    limit: Option<String>,
}

#[derive(Deserialize)]
struct VideoForm {
    title: String,
    description: Option<String>,
    youtube_id: Option<String>,
    category_id: Option<i32>,
}

#[derive(Deserialize)]
struct VideoPatch {
    /// Compatibility toggle path for like state.
    has_liked: Option<bool>,
    title: Option<String>,
    description: Option<String>,
    youtube_id: Option<String>,
    category_id: Option<i32>,
}

async fn check_category(category_id: Option<i32>) -> Result<(), Error> {
    if let Some(id) = category_id {
        categories::Entity::find_by_id(id)
            .one(get_db_pool())
            .await
            .map_err(error::ErrorInternalServerError)?
            .ok_or_else(|| {
                error::ErrorBadRequest(
                    serde_json::json!({ "category_id": "Category does not exist." }).to_string(),
                )
            })?;
    }
    Ok(())
}

/// GET /videos - paginated listing with engagement annotations
#[get("/videos")]
async fn list_videos(
    client: ClientCtx,
    config: web::Data<Arc<Config>>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, Error> {
    let db = get_db_pool();
    let per_page = query.per_page.unwrap_or(config.per_page() as u64).clamp(1, 100);
    let page = query.page.unwrap_or(1).max(1);

    let mut select = videos::Entity::find().order_by_desc(videos::Column::CreatedAt);
    if let Some(category_id) = query.category {
        select = select.filter(videos::Column::CategoryId.eq(category_id));
    }

    let rows = select
        .offset((page - 1) * per_page)
        .limit(per_page)
        .all(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let ids: Vec<i32> = rows.iter().map(|v| v.id).collect();
    let mut summaries =
        engagement::annotate_or_default(db, ContentKind::Video, &ids, client.get_id()).await;

    let views: Vec<VideoView> = rows
        .into_iter()
        .map(|v| {
            let summary = summaries.remove(&v.id).unwrap_or_default();
            VideoView::from_model(v, summary)
        })
        .collect();

    Ok(HttpResponse::Ok().json(views))
}

/// GET /videos/{id} - detail read; bumps the view counter by exactly one
#[get("/videos/{id}")]
async fn view_video(client: ClientCtx, path: web::Path<i32>) -> Result<HttpResponse, Error> {
    let video_id = path.into_inner();
    let db = get_db_pool();

    videos::Entity::update_many()
        .col_expr(
            videos::Column::ViewCount,
            Expr::col(videos::Column::ViewCount).add(1),
        )
        .filter(videos::Column::Id.eq(video_id))
        .exec(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let model = videos::Entity::find_by_id(video_id)
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("Video not found"))?;

    let summary = engagement::annotate_one(db, ContentKind::Video, video_id, client.get_id())
        .await
        .map_err(error::ErrorInternalServerError)?;
    let rating = ratings::video_summary(db, video_id, client.get_id())
        .await
        .map_err(error::ErrorInternalServerError)?;

    let mut view = VideoView::from_model(model, summary);
    view.rating = Some(rating);

    Ok(HttpResponse::Ok().json(view))
}

/// POST /videos - staff only
#[post("/videos")]
async fn create_video(client: ClientCtx, form: web::Json<VideoForm>) -> Result<HttpResponse, Error> {
    client.require_staff()?;
    check_category(form.category_id).await?;

    let video = videos::ActiveModel {
        title: Set(form.title.trim().to_string()),
        description: Set(form.description.clone().unwrap_or_default()),
        youtube_id: Set(form.youtube_id.clone()),
        category_id: Set(form.category_id),
        view_count: Set(0),
        created_at: Set(Utc::now().naive_utc()),
        updated_at: Set(None),
        ..Default::default()
    };
    let model = video
        .insert(get_db_pool())
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::Created().json(VideoView::from_model(model, Default::default())))
}

/// PATCH /videos/{id} - `{"has_liked": bool}` toggles like state for any
/// authenticated user; content fields require staff.
#[patch("/videos/{id}")]
async fn update_video(
    client: ClientCtx,
    path: web::Path<i32>,
    form: web::Json<VideoPatch>,
) -> Result<HttpResponse, Error> {
    let video_id = path.into_inner();
    let db = get_db_pool();

    let model = videos::Entity::find_by_id(video_id)
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("Video not found"))?;

    let summary = if let Some(has_liked) = form.has_liked {
        super::likes::apply_has_liked(&client, ContentKind::Video, video_id, has_liked).await?
    } else {
        engagement::annotate_one(db, ContentKind::Video, video_id, client.get_id())
            .await
            .map_err(error::ErrorInternalServerError)?
    };

    let touches_content = form.title.is_some()
        || form.description.is_some()
        || form.youtube_id.is_some()
        || form.category_id.is_some();

    let model = if touches_content {
        client.require_staff()?;
        check_category(form.category_id).await?;

        let mut active: videos::ActiveModel = model.into();
        if let Some(title) = &form.title {
            active.title = Set(title.trim().to_string());
        }
        if let Some(description) = &form.description {
            active.description = Set(description.clone());
        }
        if let Some(youtube_id) = &form.youtube_id {
            active.youtube_id = Set(Some(youtube_id.clone()));
        }
        if let Some(category_id) = form.category_id {
            active.category_id = Set(Some(category_id));
        }
        active.updated_at = Set(Some(Utc::now().naive_utc()));
        active
            .update(db)
            .await
            .map_err(error::ErrorInternalServerError)?
    } else {
        model
    };

    Ok(HttpResponse::Ok().json(VideoView::from_model(model, summary)))
}

/// DELETE /videos/{id} - staff only; sweeps attached engagement
#[delete("/videos/{id}")]
async fn delete_video(client: ClientCtx, path: web::Path<i32>) -> Result<HttpResponse, Error> {
    client.require_staff()?;
    let video_id = path.into_inner();
    let db = get_db_pool();

    videos::Entity::find_by_id(video_id)
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("Video not found"))?;

    engagement::purge_target(db, ContentKind::Video, video_id)
        .await
        .map_err(error::ErrorInternalServerError)?;
    videos::Entity::delete_by_id(video_id)
        .exec(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::NoContent().finish())
}

/// GET /videos/top-liked?limit=N
#[get("/videos/top-liked")]
async fn top_liked(
    config: web::Data<Arc<Config>>,
    query: web::Query<TopQuery>,
) -> Result<HttpResponse, Error> {
    let limit = ranking::parse_limit(query.limit.as_deref(), config.top_default_limit());
    let items = ranking::top_for_kind(get_db_pool(), ContentKind::Video, RankMetric::Likes, limit)
        .await
        .map_err(error::ErrorInternalServerError)?;
    Ok(HttpResponse::Ok().json(items))
}

/// GET /videos/top-viewed?limit=N
#[get("/videos/top-viewed")]
async fn top_viewed(
    config: web::Data<Arc<Config>>,
    query: web::Query<TopQuery>,
) -> Result<HttpResponse, Error> {
    let limit = ranking::parse_limit(query.limit.as_deref(), config.top_default_limit());
    let items = ranking::top_for_kind(get_db_pool(), ContentKind::Video, RankMetric::Views, limit)
        .await
        .map_err(error::ErrorInternalServerError)?;
    Ok(HttpResponse::Ok().json(items))
}

/// GET /videos/top-commented?limit=N
#[get("/videos/top-commented")]
async fn top_commented(
    config: web::Data<Arc<Config>>,
    query: web::Query<TopQuery>,
) -> Result<HttpResponse, Error> {
    let limit = ranking::parse_limit(query.limit.as_deref(), config.top_default_limit());
    let items = ranking::top_for_kind(
        get_db_pool(),
        ContentKind::Video,
        RankMetric::Comments,
        limit,
    )
    .await
    .map_err(error::ErrorInternalServerError)?;
    Ok(HttpResponse::Ok().json(items))
}
