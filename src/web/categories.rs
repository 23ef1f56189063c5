//! Category endpoints and the grouped ranked listings
//!
//! Categories are the "section" rows behind the nested leaderboard views:
//! top-N is computed independently inside each requested group, never as a
//! single global top-N.

use crate::config::Config;
use crate::db::get_db_pool;
use crate::engagement::ranking::{self, RankMetric, RankedItem};
use crate::middleware::ClientCtx;
use crate::orm::{categories, events};
use actix_web::{delete, error, get, patch, post, web, Error, HttpResponse};
use chrono::Utc;
use sea_orm::{entity::*, query::*, ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(list_categories)
        .service(create_category)
        .service(top_with_events)
        .service(top_with_top_liked)
        .service(update_category)
        .service(delete_category);
}

#[derive(Serialize)]
struct CategoryView {
    id: i32,
    name: String,
    slug: String,
    created_at: chrono::NaiveDateTime,
}

impl From<categories::Model> for CategoryView {
    fn from(model: categories::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            slug: model.slug,
            created_at: model.created_at,
        }
    }
}

#[derive(Deserialize)]
struct CategoryForm {
    name: String,
    slug: Option<String>,
}

#[derive(Deserialize)]
struct CategoryPatch {
    name: Option<String>,
    slug: Option<String>,
}

#[derive(Deserialize)]
struct TopWithEventsQuery {
    limit: Option<String>,
    events_limit: Option<String>,
}

#[derive(Deserialize)]
struct TopQuery {
    limit: Option<String>,
}

#[derive(Serialize)]
struct EventBrief {
    id: i32,
    title: String,
    starts_at: chrono::NaiveDateTime,
    location: Option<String>,
}

#[derive(Serialize)]
struct TopWithEventsResponse {
    category: CategoryView,
    top_liked: Vec<RankedItem>,
    events: Vec<EventBrief>,
}

#[derive(Serialize)]
struct TopWithTopLikedResponse {
    category: CategoryView,
    top_viewed: Vec<RankedItem>,
    top_liked: Vec<RankedItem>,
}

fn slugify(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

async fn find_category(id: i32) -> Result<categories::Model, Error> {
    categories::Entity::find_by_id(id)
        .one(get_db_pool())
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("Category not found"))
}

/// GET /categories
#[get("/categories")]
async fn list_categories() -> Result<HttpResponse, Error> {
    let rows = categories::Entity::find()
        .order_by_asc(categories::Column::Name)
        .all(get_db_pool())
        .await
        .map_err(error::ErrorInternalServerError)?;

    let views: Vec<CategoryView> = rows.into_iter().map(CategoryView::from).collect();
    Ok(HttpResponse::Ok().json(views))
}

/// POST /categories - staff only
#[post("/categories")]
async fn create_category(
    client: ClientCtx,
    form: web::Json<CategoryForm>,
) -> Result<HttpResponse, Error> {
    client.require_staff()?;

    let name = form.name.trim().to_string();
    if name.is_empty() {
        return Err(error::ErrorBadRequest(
            serde_json::json!({ "name": "This field may not be blank." }).to_string(),
        ));
    }
    let slug = form
        .slug
        .clone()
        .map(|s| slugify(&s))
        .unwrap_or_else(|| slugify(&name));

    let category = categories::ActiveModel {
        name: Set(name),
        slug: Set(slug),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    };
    let model = category
        .insert(get_db_pool())
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::Created().json(CategoryView::from(model)))
}

/// PATCH /categories/{id} - staff only
#[patch("/categories/{id}")]
async fn update_category(
    client: ClientCtx,
    path: web::Path<i32>,
    form: web::Json<CategoryPatch>,
) -> Result<HttpResponse, Error> {
    client.require_staff()?;
    let model = find_category(path.into_inner()).await?;

    let mut active: categories::ActiveModel = model.into();
    if let Some(name) = &form.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(slug) = &form.slug {
        active.slug = Set(slugify(slug));
    }
    let model = active
        .update(get_db_pool())
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(CategoryView::from(model)))
}

/// DELETE /categories/{id} - staff only; videos/events keep running with a
/// null category
#[delete("/categories/{id}")]
async fn delete_category(client: ClientCtx, path: web::Path<i32>) -> Result<HttpResponse, Error> {
    client.require_staff()?;
    let model = find_category(path.into_inner()).await?;

    categories::Entity::delete_by_id(model.id)
        .exec(get_db_pool())
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::NoContent().finish())
}

/// GET /categories/{id}/top-with-events?limit=N&events_limit=M
///
/// The category's top-liked videos next to its upcoming events. Both limits
/// fall back independently.
#[get("/categories/{id}/top-with-events")]
async fn top_with_events(
    config: web::Data<Arc<Config>>,
    path: web::Path<i32>,
    query: web::Query<TopWithEventsQuery>,
) -> Result<HttpResponse, Error> {
    let category = find_category(path.into_inner()).await?;
    let db = get_db_pool();

    let limit = ranking::parse_limit(query.limit.as_deref(), config.top_default_limit());
    let events_limit =
        ranking::parse_limit(query.events_limit.as_deref(), config.top_default_limit());

    let top_liked =
        ranking::top_videos_in_category(db, category.id, RankMetric::Likes, limit)
            .await
            .map_err(error::ErrorInternalServerError)?;

    let event_rows = events::Entity::find()
        .filter(events::Column::CategoryId.eq(category.id))
        .order_by_asc(events::Column::StartsAt)
        .limit(events_limit as u64)
        .all(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let events: Vec<EventBrief> = event_rows
        .into_iter()
        .map(|e| EventBrief {
            id: e.id,
            title: e.title,
            starts_at: e.starts_at,
            location: e.location,
        })
        .collect();

    Ok(HttpResponse::Ok().json(TopWithEventsResponse {
        category: CategoryView::from(category),
        top_liked,
        events,
    }))
}

/// GET /categories/{id}/top-with-top-liked?limit=N
///
/// The category's top-viewed and top-liked video groups side by side.
#[get("/categories/{id}/top-with-top-liked")]
async fn top_with_top_liked(
    config: web::Data<Arc<Config>>,
    path: web::Path<i32>,
    query: web::Query<TopQuery>,
) -> Result<HttpResponse, Error> {
    let category = find_category(path.into_inner()).await?;
    let db = get_db_pool();

    let limit = ranking::parse_limit(query.limit.as_deref(), config.top_default_limit());

    let top_viewed = ranking::top_videos_in_category(db, category.id, RankMetric::Views, limit)
        .await
        .map_err(error::ErrorInternalServerError)?;
    let top_liked = ranking::top_videos_in_category(db, category.id, RankMetric::Likes, limit)
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(TopWithTopLikedResponse {
        category: CategoryView::from(category),
        top_viewed,
        top_liked,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Author Talks"), "author-talks");
        assert_eq!(slugify("  Bücher & Co  "), "bücher-co");
        assert_eq!(slugify("already-a-slug"), "already-a-slug");
    }
}
