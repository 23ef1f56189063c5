//! Event endpoints

use crate::config::Config;
use crate::content::ContentKind;
use crate::db::get_db_pool;
use crate::engagement;
use crate::engagement::ranking::{self, RankMetric};
use crate::middleware::ClientCtx;
use crate::orm::{categories, events};
use actix_web::{delete, error, get, patch, post, web, Error, HttpResponse};
use chrono::Utc;
use sea_orm::{entity::*, query::*, sea_query::Expr, ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(top_viewed)
        .service(list_events)
        .service(create_event)
        .service(view_event)
        .service(update_event)
        .service(delete_event);
}

#[derive(Serialize)]
struct EventView {
    id: i32,
    title: String,
    description: String,
    location: Option<String>,
    category_id: Option<i32>,
    starts_at: chrono::NaiveDateTime,
    view_count: i32,
    created_at: chrono::NaiveDateTime,
    like_count: i64,
    comment_count: i64,
    has_liked: bool,
}

impl EventView {
    fn from_model(model: events::Model, summary: engagement::Engagement) -> Self {
        Self {
            id: model.id,
            title: model.title,
            description: model.description,
            location: model.location,
            category_id: model.category_id,
            starts_at: model.starts_at,
            view_count: model.view_count,
            created_at: model.created_at,
            like_count: summary.like_count,
            comment_count: summary.comment_count,
            has_liked: summary.has_liked,
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
struct EventForm {
    title: String,
    description: Option<String>,
    location: Option<String>,
    category_id: Option<i32>,
    starts_at: chrono::NaiveDateTime,
}

#[derive(Deserialize)]
struct EventPatch {
    has_liked: Option<bool>,
    title: Option<String>,
    description: Option<String>,
    location: Option<String>,
    category_id: Option<i32>,
    starts_at: Option<chrono::NaiveDateTime>,
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

/// GET /events - upcoming first
#[get("/events")]
async fn list_events(
    client: ClientCtx,
    config: web::Data<Arc<Config>>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, Error> {
    let db = get_db_pool();
    let per_page = query.per_page.unwrap_or(config.per_page() as u64).clamp(1, 100);
    let page = query.page.unwrap_or(1).max(1);

    let mut select = events::Entity::find().order_by_asc(events::Column::StartsAt);
    if let Some(category_id) = query.category {
        select = select.filter(events::Column::CategoryId.eq(category_id));
    }

    let rows = select
        .offset((page - 1) * per_page)
        .limit(per_page)
        .all(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let ids: Vec<i32> = rows.iter().map(|e| e.id).collect();
    let mut summaries =
        engagement::annotate_or_default(db, ContentKind::Event, &ids, client.get_id()).await;

    let views: Vec<EventView> = rows
        .into_iter()
        .map(|e| {
            let summary = summaries.remove(&e.id).unwrap_or_default();
            EventView::from_model(e, summary)
        })
        .collect();

    Ok(HttpResponse::Ok().json(views))
}

/// GET /events/{id} - detail read; bumps the view counter
#[get("/events/{id}")]
async fn view_event(client: ClientCtx, path: web::Path<i32>) -> Result<HttpResponse, Error> {
    let event_id = path.into_inner();
    let db = get_db_pool();

    events::Entity::update_many()
        .col_expr(
            events::Column::ViewCount,
            Expr::col(events::Column::ViewCount).add(1),
        )
        .filter(events::Column::Id.eq(event_id))
        .exec(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let model = events::Entity::find_by_id(event_id)
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("Event not found"))?;

    let summary = engagement::annotate_one(db, ContentKind::Event, event_id, client.get_id())
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(EventView::from_model(model, summary)))
}

/// POST /events - staff only
#[post("/events")]
async fn create_event(client: ClientCtx, form: web::Json<EventForm>) -> Result<HttpResponse, Error> {
    client.require_staff()?;
    check_category(form.category_id).await?;

    let event = events::ActiveModel {
        title: Set(form.title.trim().to_string()),
        description: Set(form.description.clone().unwrap_or_default()),
        location: Set(form.location.clone()),
        category_id: Set(form.category_id),
        starts_at: Set(form.starts_at),
        view_count: Set(0),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    };
    let model = event
        .insert(get_db_pool())
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::Created().json(EventView::from_model(model, Default::default())))
}

/// PATCH /events/{id} - like toggle or staff content update
#[patch("/events/{id}")]
async fn update_event(
    client: ClientCtx,
    path: web::Path<i32>,
    form: web::Json<EventPatch>,
) -> Result<HttpResponse, Error> {
    let event_id = path.into_inner();
    let db = get_db_pool();

    let model = events::Entity::find_by_id(event_id)
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("Event not found"))?;

    let summary = if let Some(has_liked) = form.has_liked {
        super::likes::apply_has_liked(&client, ContentKind::Event, event_id, has_liked).await?
    } else {
        engagement::annotate_one(db, ContentKind::Event, event_id, client.get_id())
            .await
            .map_err(error::ErrorInternalServerError)?
    };

    let touches_content = form.title.is_some()
        || form.description.is_some()
        || form.location.is_some()
        || form.category_id.is_some()
        || form.starts_at.is_some();

    let model = if touches_content {
        client.require_staff()?;
        check_category(form.category_id).await?;

        let mut active: events::ActiveModel = model.into();
        if let Some(title) = &form.title {
            active.title = Set(title.trim().to_string());
        }
        if let Some(description) = &form.description {
            active.description = Set(description.clone());
        }
        if let Some(location) = &form.location {
            active.location = Set(Some(location.clone()));
        }
        if let Some(category_id) = form.category_id {
            active.category_id = Set(Some(category_id));
        }
        if let Some(starts_at) = form.starts_at {
            active.starts_at = Set(starts_at);
        }
        active
            .update(db)
            .await
            .map_err(error::ErrorInternalServerError)?
    } else {
        model
    };

    Ok(HttpResponse::Ok().json(EventView::from_model(model, summary)))
}

/// DELETE /events/{id} - staff only
#[delete("/events/{id}")]
async fn delete_event(client: ClientCtx, path: web::Path<i32>) -> Result<HttpResponse, Error> {
    client.require_staff()?;
    let event_id = path.into_inner();
    let db = get_db_pool();

    events::Entity::find_by_id(event_id)
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("Event not found"))?;

    engagement::purge_target(db, ContentKind::Event, event_id)
        .await
        .map_err(error::ErrorInternalServerError)?;
    events::Entity::delete_by_id(event_id)
        .exec(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::NoContent().finish())
}

/// GET /events/top-viewed?limit=N
#[get("/events/top-viewed")]
async fn top_viewed(
    config: web::Data<Arc<Config>>,
    query: web::Query<TopQuery>,
) -> Result<HttpResponse, Error> {
    let limit = ranking::parse_limit(query.limit.as_deref(), config.top_default_limit());
    let items = ranking::top_for_kind(get_db_pool(), ContentKind::Event, RankMetric::Views, limit)
        .await
        .map_err(error::ErrorInternalServerError)?;
    Ok(HttpResponse::Ok().json(items))
}
