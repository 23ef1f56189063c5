//! Weekly moment endpoints

use crate::config::Config;
use crate::content::ContentKind;
use crate::db::get_db_pool;
use crate::engagement;
use crate::engagement::ranking::{self, RankMetric};
use crate::middleware::ClientCtx;
use crate::orm::moments;
use actix_web::{delete, error, get, patch, post, web, Error, HttpResponse};
use chrono::Utc;
use sea_orm::{entity::*, query::*, sea_query::Expr, ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(top_viewed)
        .service(list_moments)
        .service(create_moment)
        .service(view_moment)
        .service(update_moment)
        .service(delete_moment);
}

#[derive(Serialize)]
struct MomentView {
    id: i32,
    title: String,
    body: String,
    week_start: chrono::NaiveDateTime,
    view_count: i32,
    created_at: chrono::NaiveDateTime,
    like_count: i64,
    comment_count: i64,
    has_liked: bool,
}

impl MomentView {
    fn from_model(model: moments::Model, summary: engagement::Engagement) -> Self {
        Self {
            id: model.id,
            title: model.title,
            body: model.body,
            week_start: model.week_start,
            view_count: model.view_count,
            created_at: model.created_at,
            like_count: summary.like_count,
            comment_count: summary.comment_count,
            has_liked: summary.has_liked,
        }
    }
}

#[derive(Deserialize)]
struct TopQuery {
    limit: Option<String>,
}

#[derive(Deserialize)]
struct MomentForm {
    title: String,
    body: Option<String>,
    week_start: chrono::NaiveDateTime,
}

#[derive(Deserialize)]
struct MomentPatch {
    has_liked: Option<bool>,
    title: Option<String>,
    body: Option<String>,
    week_start: Option<chrono::NaiveDateTime>,
}

/// GET /moments - newest week first
#[get("/moments")]
async fn list_moments(client: ClientCtx) -> Result<HttpResponse, Error> {
    let db = get_db_pool();

    let rows = moments::Entity::find()
        .order_by_desc(moments::Column::WeekStart)
        .all(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let ids: Vec<i32> = rows.iter().map(|m| m.id).collect();
    let mut summaries =
        engagement::annotate_or_default(db, ContentKind::Moment, &ids, client.get_id()).await;

    let views: Vec<MomentView> = rows
        .into_iter()
        .map(|m| {
            let summary = summaries.remove(&m.id).unwrap_or_default();
            MomentView::from_model(m, summary)
        })
        .collect();

    Ok(HttpResponse::Ok().json(views))
}

/// GET /moments/{id} - detail read; bumps the view counter
#[get("/moments/{id}")]
async fn view_moment(client: ClientCtx, path: web::Path<i32>) -> Result<HttpResponse, Error> {
    let moment_id = path.into_inner();
    let db = get_db_pool();

    moments::Entity::update_many()
        .col_expr(
            moments::Column::ViewCount,
            Expr::col(moments::Column::ViewCount).add(1),
        )
        .filter(moments::Column::Id.eq(moment_id))
        .exec(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let model = moments::Entity::find_by_id(moment_id)
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("Moment not found"))?;

    let summary = engagement::annotate_one(db, ContentKind::Moment, moment_id, client.get_id())
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(MomentView::from_model(model, summary)))
}

/// POST /moments - staff only
#[post("/moments")]
async fn create_moment(
    client: ClientCtx,
    form: web::Json<MomentForm>,
) -> Result<HttpResponse, Error> {
    client.require_staff()?;

    let moment = moments::ActiveModel {
        title: Set(form.title.trim().to_string()),
        body: Set(form.body.clone().unwrap_or_default()),
        week_start: Set(form.week_start),
        view_count: Set(0),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    };
    let model = moment
        .insert(get_db_pool())
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::Created().json(MomentView::from_model(model, Default::default())))
}

/// PATCH /moments/{id} - like toggle or staff content update
#[patch("/moments/{id}")]
async fn update_moment(
    client: ClientCtx,
    path: web::Path<i32>,
    form: web::Json<MomentPatch>,
) -> Result<HttpResponse, Error> {
    let moment_id = path.into_inner();
    let db = get_db_pool();

    let model = moments::Entity::find_by_id(moment_id)
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("Moment not found"))?;

    let summary = if let Some(has_liked) = form.has_liked {
        super::likes::apply_has_liked(&client, ContentKind::Moment, moment_id, has_liked).await?
    } else {
        engagement::annotate_one(db, ContentKind::Moment, moment_id, client.get_id())
            .await
            .map_err(error::ErrorInternalServerError)?
    };

    let touches_content = form.title.is_some() || form.body.is_some() || form.week_start.is_some();

    let model = if touches_content {
        client.require_staff()?;

        let mut active: moments::ActiveModel = model.into();
        if let Some(title) = &form.title {
            active.title = Set(title.trim().to_string());
        }
        if let Some(body) = &form.body {
            active.body = Set(body.clone());
        }
        if let Some(week_start) = form.week_start {
            active.week_start = Set(week_start);
        }
        active
            .update(db)
            .await
            .map_err(error::ErrorInternalServerError)?
    } else {
        model
    };

    Ok(HttpResponse::Ok().json(MomentView::from_model(model, summary)))
}

/// DELETE /moments/{id} - staff only
#[delete("/moments/{id}")]
async fn delete_moment(client: ClientCtx, path: web::Path<i32>) -> Result<HttpResponse, Error> {
    client.require_staff()?;
    let moment_id = path.into_inner();
    let db = get_db_pool();

    moments::Entity::find_by_id(moment_id)
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("Moment not found"))?;

    engagement::purge_target(db, ContentKind::Moment, moment_id)
        .await
        .map_err(error::ErrorInternalServerError)?;
    moments::Entity::delete_by_id(moment_id)
        .exec(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::NoContent().finish())
}

/// GET /moments/top-viewed?limit=N
#[get("/moments/top-viewed")]
async fn top_viewed(
    config: web::Data<Arc<Config>>,
    query: web::Query<TopQuery>,
) -> Result<HttpResponse, Error> {
    let limit = ranking::parse_limit(query.limit.as_deref(), config.top_default_limit());
    let items = ranking::top_for_kind(get_db_pool(), ContentKind::Moment, RankMetric::Views, limit)
        .await
        .map_err(error::ErrorInternalServerError)?;
    Ok(HttpResponse::Ok().json(items))
}
