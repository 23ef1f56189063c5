//! Organization history endpoints

use crate::content::ContentKind;
use crate::db::get_db_pool;
use crate::engagement;
use crate::middleware::ClientCtx;
use crate::orm::history_entries;
use actix_web::{delete, error, get, patch, post, web, Error, HttpResponse};
use chrono::Utc;
use sea_orm::{entity::*, query::*, EntityTrait};
use serde::{Deserialize, Serialize};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(list_history)
        .service(create_entry)
        .service(view_entry)
        .service(update_entry)
        .service(delete_entry);
}

#[derive(Serialize)]
struct HistoryView {
    id: i32,
    year: i32,
    title: String,
    body: String,
    created_at: chrono::NaiveDateTime,
    like_count: i64,
    comment_count: i64,
    has_liked: bool,
}

impl HistoryView {
    fn from_model(model: history_entries::Model, summary: engagement::Engagement) -> Self {
        Self {
            id: model.id,
            year: model.year,
            title: model.title,
            body: model.body,
            created_at: model.created_at,
            like_count: summary.like_count,
            comment_count: summary.comment_count,
            has_liked: summary.has_liked,
        }
    }
}

#[derive(Deserialize)]
struct EntryForm {
    year: i32,
    title: String,
    body: Option<String>,
}

#[derive(Deserialize)]
struct EntryPatch {
    has_liked: Option<bool>,
    year: Option<i32>,
    title: Option<String>,
    body: Option<String>,
}

/// GET /history - the timeline, oldest year first
#[get("/history")]
async fn list_history(client: ClientCtx) -> Result<HttpResponse, Error> {
    let db = get_db_pool();

    let rows = history_entries::Entity::find()
        .order_by_asc(history_entries::Column::Year)
        .all(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let ids: Vec<i32> = rows.iter().map(|h| h.id).collect();
    let mut summaries =
        engagement::annotate_or_default(db, ContentKind::History, &ids, client.get_id()).await;

    let views: Vec<HistoryView> = rows
        .into_iter()
        .map(|h| {
            let summary = summaries.remove(&h.id).unwrap_or_default();
            HistoryView::from_model(h, summary)
        })
        .collect();

    Ok(HttpResponse::Ok().json(views))
}

/// GET /history/{id}
#[get("/history/{id}")]
async fn view_entry(client: ClientCtx, path: web::Path<i32>) -> Result<HttpResponse, Error> {
    let entry_id = path.into_inner();
    let db = get_db_pool();

    let model = history_entries::Entity::find_by_id(entry_id)
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("History entry not found"))?;

    let summary = engagement::annotate_one(db, ContentKind::History, entry_id, client.get_id())
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(HistoryView::from_model(model, summary)))
}

/// POST /history - staff only
#[post("/history")]
async fn create_entry(client: ClientCtx, form: web::Json<EntryForm>) -> Result<HttpResponse, Error> {
    client.require_staff()?;

    let entry = history_entries::ActiveModel {
        year: Set(form.year),
        title: Set(form.title.trim().to_string()),
        body: Set(form.body.clone().unwrap_or_default()),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    };
    let model = entry
        .insert(get_db_pool())
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::Created().json(HistoryView::from_model(model, Default::default())))
}

/// PATCH /history/{id} - like toggle or staff content update
#[patch("/history/{id}")]
async fn update_entry(
    client: ClientCtx,
    path: web::Path<i32>,
    form: web::Json<EntryPatch>,
) -> Result<HttpResponse, Error> {
    let entry_id = path.into_inner();
    let db = get_db_pool();

    let model = history_entries::Entity::find_by_id(entry_id)
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("History entry not found"))?;

    let summary = if let Some(has_liked) = form.has_liked {
        super::likes::apply_has_liked(&client, ContentKind::History, entry_id, has_liked).await?
    } else {
        engagement::annotate_one(db, ContentKind::History, entry_id, client.get_id())
            .await
            .map_err(error::ErrorInternalServerError)?
    };

    let touches_content = form.year.is_some() || form.title.is_some() || form.body.is_some();

    let model = if touches_content {
        client.require_staff()?;

        let mut active: history_entries::ActiveModel = model.into();
        if let Some(year) = form.year {
            active.year = Set(year);
        }
        if let Some(title) = &form.title {
            active.title = Set(title.trim().to_string());
        }
        if let Some(body) = &form.body {
            active.body = Set(body.clone());
        }
        active
            .update(db)
            .await
            .map_err(error::ErrorInternalServerError)?
    } else {
        model
    };

    Ok(HttpResponse::Ok().json(HistoryView::from_model(model, summary)))
}

/// DELETE /history/{id} - staff only
#[delete("/history/{id}")]
async fn delete_entry(client: ClientCtx, path: web::Path<i32>) -> Result<HttpResponse, Error> {
    client.require_staff()?;
    let entry_id = path.into_inner();
    let db = get_db_pool();

    history_entries::Entity::find_by_id(entry_id)
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("History entry not found"))?;

    engagement::purge_target(db, ContentKind::History, entry_id)
        .await
        .map_err(error::ErrorInternalServerError)?;
    history_entries::Entity::delete_by_id(entry_id)
        .exec(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::NoContent().finish())
}
