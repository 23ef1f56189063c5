//! Blog post endpoints

use crate::config::Config;
use crate::content::ContentKind;
use crate::db::get_db_pool;
use crate::engagement::ranking::{self, RankMetric};
use crate::engagement::{self, ratings};
use crate::middleware::ClientCtx;
use crate::orm::posts;
use actix_web::{delete, error, get, patch, post, web, Error, HttpResponse};
use chrono::Utc;
use sea_orm::{entity::*, query::*, sea_query::Expr, ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    // Fixed segments before /{id} routes.
    conf.service(top_liked)
        .service(top_viewed)
        .service(top_commented)
        .service(list_posts)
        .service(create_post)
        .service(view_post)
        .service(update_post)
        .service(delete_post);
}

#[derive(Serialize)]
struct PostView {
    id: i32,
    author_id: Option<i32>,
    title: String,
    body: String,
    view_count: i32,
    created_at: chrono::NaiveDateTime,
    like_count: i64,
    comment_count: i64,
    has_liked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    rating: Option<ratings::RatingSummary>,
}

impl PostView {
    fn from_model(model: posts::Model, summary: engagement::Engagement) -> Self {
        Self {
            id: model.id,
            author_id: model.author_id,
            title: model.title,
            body: model.body,
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
}

#[derive(Deserialize)]
struct TopQuery {
    limit: Option<String>,
}

#[derive(Deserialize, Validate)]
struct PostForm {
    #[validate(length(min = 1, max = 255))]
    title: String,
    #[validate(length(min = 1))]
    body: String,
}

#[derive(Deserialize)]
struct PostPatch {
    /// Compatibility toggle path for like state.
    has_liked: Option<bool>,
    title: Option<String>,
    body: Option<String>,
}

/// GET /posts - paginated listing with engagement annotations
#[get("/posts")]
async fn list_posts(
    client: ClientCtx,
    config: web::Data<Arc<Config>>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, Error> {
    let db = get_db_pool();
    let per_page = query.per_page.unwrap_or(config.per_page() as u64).clamp(1, 100);
    let page = query.page.unwrap_or(1).max(1);

    let rows = posts::Entity::find()
        .order_by_desc(posts::Column::CreatedAt)
        .offset((page - 1) * per_page)
        .limit(per_page)
        .all(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let ids: Vec<i32> = rows.iter().map(|p| p.id).collect();
    let mut summaries =
        engagement::annotate_or_default(db, ContentKind::Post, &ids, client.get_id()).await;

    let views: Vec<PostView> = rows
        .into_iter()
        .map(|p| {
            let summary = summaries.remove(&p.id).unwrap_or_default();
            PostView::from_model(p, summary)
        })
        .collect();

    Ok(HttpResponse::Ok().json(views))
}

/// GET /posts/{id} - detail read; bumps the view counter by exactly one
#[get("/posts/{id}")]
async fn view_post(client: ClientCtx, path: web::Path<i32>) -> Result<HttpResponse, Error> {
    let post_id = path.into_inner();
    let db = get_db_pool();

    posts::Entity::update_many()
        .col_expr(
            posts::Column::ViewCount,
            Expr::col(posts::Column::ViewCount).add(1),
        )
        .filter(posts::Column::Id.eq(post_id))
        .exec(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let model = posts::Entity::find_by_id(post_id)
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("Post not found"))?;

    let summary = engagement::annotate_one(db, ContentKind::Post, post_id, client.get_id())
        .await
        .map_err(error::ErrorInternalServerError)?;
    let rating = ratings::post_summary(db, post_id, client.get_id())
        .await
        .map_err(error::ErrorInternalServerError)?;

    let mut view = PostView::from_model(model, summary);
    view.rating = Some(rating);

    Ok(HttpResponse::Ok().json(view))
}

/// POST /posts - staff only
#[post("/posts")]
async fn create_post(client: ClientCtx, form: web::Json<PostForm>) -> Result<HttpResponse, Error> {
    let user_id = client.require_staff()?;
    form.validate().map_err(error::ErrorBadRequest)?;

    let post = posts::ActiveModel {
        author_id: Set(Some(user_id)),
        title: Set(form.title.trim().to_string()),
        body: Set(form.body.clone()),
        view_count: Set(0),
        created_at: Set(Utc::now().naive_utc()),
        updated_at: Set(None),
        ..Default::default()
    };
    let model = post
        .insert(get_db_pool())
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::Created().json(PostView::from_model(model, Default::default())))
}

/// PATCH /posts/{id} - `{"has_liked": bool}` toggles like state for any
/// authenticated user; content fields require staff.
#[patch("/posts/{id}")]
async fn update_post(
    client: ClientCtx,
    path: web::Path<i32>,
    form: web::Json<PostPatch>,
) -> Result<HttpResponse, Error> {
    let post_id = path.into_inner();
    let db = get_db_pool();

    let model = posts::Entity::find_by_id(post_id)
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("Post not found"))?;

    let summary = if let Some(has_liked) = form.has_liked {
        super::likes::apply_has_liked(&client, ContentKind::Post, post_id, has_liked).await?
    } else {
        engagement::annotate_one(db, ContentKind::Post, post_id, client.get_id())
            .await
            .map_err(error::ErrorInternalServerError)?
    };

    let touches_content = form.title.is_some() || form.body.is_some();

    let model = if touches_content {
        client.require_staff()?;

        let mut active: posts::ActiveModel = model.into();
        if let Some(title) = &form.title {
            active.title = Set(title.trim().to_string());
        }
        if let Some(body) = &form.body {
            active.body = Set(body.clone());
        }
        active.updated_at = Set(Some(Utc::now().naive_utc()));
        active
            .update(db)
            .await
            .map_err(error::ErrorInternalServerError)?
    } else {
        model
    };

    Ok(HttpResponse::Ok().json(PostView::from_model(model, summary)))
}

/// DELETE /posts/{id} - staff only; sweeps attached engagement
#[delete("/posts/{id}")]
async fn delete_post(client: ClientCtx, path: web::Path<i32>) -> Result<HttpResponse, Error> {
    client.require_staff()?;
    let post_id = path.into_inner();
    let db = get_db_pool();

    posts::Entity::find_by_id(post_id)
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("Post not found"))?;

    engagement::purge_target(db, ContentKind::Post, post_id)
        .await
        .map_err(error::ErrorInternalServerError)?;
    posts::Entity::delete_by_id(post_id)
        .exec(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::NoContent().finish())
}

/// GET /posts/top-liked?limit=N
#[get("/posts/top-liked")]
async fn top_liked(
    config: web::Data<Arc<Config>>,
    query: web::Query<TopQuery>,
) -> Result<HttpResponse, Error> {
    let limit = ranking::parse_limit(query.limit.as_deref(), config.top_default_limit());
    let items = ranking::top_for_kind(get_db_pool(), ContentKind::Post, RankMetric::Likes, limit)
        .await
        .map_err(error::ErrorInternalServerError)?;
    Ok(HttpResponse::Ok().json(items))
}

/// GET /posts/top-viewed?limit=N
#[get("/posts/top-viewed")]
async fn top_viewed(
    config: web::Data<Arc<Config>>,
    query: web::Query<TopQuery>,
) -> Result<HttpResponse, Error> {
    let limit = ranking::parse_limit(query.limit.as_deref(), config.top_default_limit());
    let items = ranking::top_for_kind(get_db_pool(), ContentKind::Post, RankMetric::Views, limit)
        .await
        .map_err(error::ErrorInternalServerError)?;
    Ok(HttpResponse::Ok().json(items))
}

/// GET /posts/top-commented?limit=N
#[get("/posts/top-commented")]
async fn top_commented(
    config: web::Data<Arc<Config>>,
    query: web::Query<TopQuery>,
) -> Result<HttpResponse, Error> {
    let limit = ranking::parse_limit(query.limit.as_deref(), config.top_default_limit());
    let items = ranking::top_for_kind(get_db_pool(), ContentKind::Post, RankMetric::Comments, limit)
        .await
        .map_err(error::ErrorInternalServerError)?;
    Ok(HttpResponse::Ok().json(items))
}
