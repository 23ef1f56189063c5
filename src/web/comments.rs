//! Comment and reply endpoints
//!
//! Comments attach to any content kind through a (content_type, object_id)
//! pair, validated against the registry before anything is written. Replies
//! belong to exactly one comment, fixed by the URL on create and never
//! changed on update.

use crate::config::Config;
use crate::content::{self, ContentKind};
use crate::db::get_db_pool;
use crate::engagement;
use crate::middleware::ClientCtx;
use crate::orm::{comments, replies};
use actix_web::{delete, error, get, patch, post, web, Error, HttpResponse};
use chrono::Utc;
use sea_orm::{entity::*, query::*, ColumnTrait, EntityTrait, QueryFilter, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(list_comments)
        .service(create_comment)
        .service(delete_comment)
        .service(list_replies)
        .service(create_reply)
        .service(update_reply)
        .service(delete_reply);
}

/// Field-keyed validation failure, mirrored to the caller as JSON.
fn field_error(field: &str, message: &str) -> Error {
    error::ErrorBadRequest(serde_json::json!({ field: message }).to_string())
}

#[derive(Deserialize)]
struct CommentForm {
    content_type: Option<String>,
    object_id: Option<i32>,
    text: Option<String>,
}

#[derive(Deserialize)]
struct ReplyForm {
    text: Option<String>,
}

#[derive(Deserialize)]
struct TargetQuery {
    content_type: Option<String>,
    object_id: Option<i32>,
}

#[derive(Serialize)]
struct CommentView {
    id: i32,
    author_id: Option<i32>,
    content_type: &'static str,
    object_id: i32,
    text: String,
    created_at: chrono::NaiveDateTime,
    like_count: i64,
    has_liked: bool,
    reply_count: i64,
}

#[derive(Serialize)]
struct ReplyView {
    id: i32,
    author_id: Option<i32>,
    comment_id: i32,
    text: String,
    created_at: chrono::NaiveDateTime,
    like_count: i64,
    has_liked: bool,
}

fn validate_text(text: Option<&str>, max_len: i64) -> Result<String, Error> {
    let text = text.map(str::trim).unwrap_or_default();
    if text.is_empty() {
        return Err(field_error("text", "This field may not be blank."));
    }
    if text.len() as i64 > max_len {
        return Err(field_error("text", "Comment is too long."));
    }
    Ok(text.to_string())
}

/// GET /comments?content_type=post&object_id=1 - list a target's comments
#[get("/comments")]
async fn list_comments(
    client: ClientCtx,
    query: web::Query<TargetQuery>,
) -> Result<HttpResponse, Error> {
    let label = query
        .content_type
        .as_deref()
        .ok_or_else(|| field_error("content_type", "This field is required."))?;
    let kind = ContentKind::from_label(label)
        .ok_or_else(|| field_error("content_type", "Unknown content type."))?;
    let object_id = query
        .object_id
        .ok_or_else(|| field_error("object_id", "This field is required."))?;

    let db = get_db_pool();
    let rows = comments::Entity::find_for_target(kind, object_id)
        .all(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let ids: Vec<i32> = rows.iter().map(|c| c.id).collect();
    let likes = engagement::annotate_or_default(db, ContentKind::Comment, &ids, client.get_id()).await;

    // Reply counts for the whole page in one query
    let mut reply_counts: HashMap<i32, i64> = HashMap::new();
    if !ids.is_empty() {
        let reply_rows = replies::Entity::find()
            .filter(replies::Column::CommentId.is_in(ids.clone()))
            .all(db)
            .await
            .map_err(error::ErrorInternalServerError)?;
        for reply in reply_rows {
            *reply_counts.entry(reply.comment_id).or_default() += 1;
        }
    }

    let views: Vec<CommentView> = rows
        .into_iter()
        .map(|c| {
            let summary = likes.get(&c.id).cloned().unwrap_or_default();
            CommentView {
                id: c.id,
                author_id: c.author_id,
                content_type: c.target_kind.label(),
                object_id: c.target_id,
                text: c.body,
                created_at: c.created_at,
                like_count: summary.like_count,
                has_liked: summary.has_liked,
                reply_count: reply_counts.get(&c.id).copied().unwrap_or(0),
            }
        })
        .collect();

    Ok(HttpResponse::Ok().json(views))
}

/// POST /comments - create a comment against an existing target
#[post("/comments")]
async fn create_comment(
    client: ClientCtx,
    config: web::Data<Arc<Config>>,
    form: web::Json<CommentForm>,
) -> Result<HttpResponse, Error> {
    let user_id = client.require_login()?;
    let db = get_db_pool();

    // Validation order: kind, then target existence, then text.
    let label = form
        .content_type
        .as_deref()
        .ok_or_else(|| field_error("content_type", "This field is required."))?;
    let kind = ContentKind::from_label(label)
        .ok_or_else(|| field_error("content_type", "Unknown content type."))?;
    if !kind.supports_comments() {
        return Err(field_error("content_type", "This content type does not accept comments."));
    }

    let object_id = form
        .object_id
        .ok_or_else(|| field_error("object_id", "This field is required."))?;
    let exists = content::target_exists(db, kind, object_id)
        .await
        .map_err(error::ErrorInternalServerError)?;
    if !exists {
        return Err(field_error("object_id", "Target does not exist."));
    }

    let text = validate_text(form.text.as_deref(), config.max_comment_length())?;

    let comment = comments::ActiveModel {
        author_id: Set(Some(user_id)),
        target_kind: Set(kind),
        target_id: Set(object_id),
        body: Set(text),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    };
    let model = comment
        .insert(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::Created().json(CommentView {
        id: model.id,
        author_id: model.author_id,
        content_type: model.target_kind.label(),
        object_id: model.target_id,
        text: model.body,
        created_at: model.created_at,
        like_count: 0,
        has_liked: false,
        reply_count: 0,
    }))
}

/// DELETE /comments/{id} - author or staff; replies go with the comment
#[delete("/comments/{id}")]
async fn delete_comment(client: ClientCtx, path: web::Path<i32>) -> Result<HttpResponse, Error> {
    client.require_login()?;
    let comment_id = path.into_inner();
    let db = get_db_pool();

    let comment = comments::Entity::find_by_id(comment_id)
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("Comment not found"))?;

    if !client.can_modify(comment.author_id) {
        return Err(error::ErrorForbidden("You cannot delete this comment"));
    }

    let txn = db.begin().await.map_err(error::ErrorInternalServerError)?;
    replies::Entity::delete_many()
        .filter(replies::Column::CommentId.eq(comment_id))
        .exec(&txn)
        .await
        .map_err(error::ErrorInternalServerError)?;
    comments::Entity::delete_by_id(comment_id)
        .exec(&txn)
        .await
        .map_err(error::ErrorInternalServerError)?;
    txn.commit().await.map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::NoContent().finish())
}

/// GET /comments/{id}/replies - all replies, oldest first, unpaginated
#[get("/comments/{id}/replies")]
async fn list_replies(client: ClientCtx, path: web::Path<i32>) -> Result<HttpResponse, Error> {
    let comment_id = path.into_inner();
    let db = get_db_pool();

    comments::Entity::find_by_id(comment_id)
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("Comment not found"))?;

    let rows = replies::Entity::find()
        .filter(replies::Column::CommentId.eq(comment_id))
        .order_by_asc(replies::Column::CreatedAt)
        .all(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
    let likes = engagement::annotate_or_default(db, ContentKind::Reply, &ids, client.get_id()).await;

    let views: Vec<ReplyView> = rows
        .into_iter()
        .map(|r| {
            let summary = likes.get(&r.id).cloned().unwrap_or_default();
            ReplyView {
                id: r.id,
                author_id: r.author_id,
                comment_id: r.comment_id,
                text: r.body,
                created_at: r.created_at,
                like_count: summary.like_count,
                has_liked: summary.has_liked,
            }
        })
        .collect();

    Ok(HttpResponse::Ok().json(views))
}

/// POST /comments/{id}/replies - create a reply under the comment
#[post("/comments/{id}/replies")]
async fn create_reply(
    client: ClientCtx,
    config: web::Data<Arc<Config>>,
    path: web::Path<i32>,
    form: web::Json<ReplyForm>,
) -> Result<HttpResponse, Error> {
    let user_id = client.require_login()?;
    let comment_id = path.into_inner();
    let db = get_db_pool();

    comments::Entity::find_by_id(comment_id)
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("Comment not found"))?;

    let text = validate_text(form.text.as_deref(), config.max_comment_length())?;

    let reply = replies::ActiveModel {
        author_id: Set(Some(user_id)),
        comment_id: Set(comment_id),
        body: Set(text),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    };
    let model = reply
        .insert(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::Created().json(ReplyView {
        id: model.id,
        author_id: model.author_id,
        comment_id: model.comment_id,
        text: model.body,
        created_at: model.created_at,
        like_count: 0,
        has_liked: false,
    }))
}

/// PATCH /replies/{id} - edit the body. The parent comment is fixed at
/// creation; nothing in the payload can move a reply.
#[patch("/replies/{id}")]
async fn update_reply(
    client: ClientCtx,
    config: web::Data<Arc<Config>>,
    path: web::Path<i32>,
    form: web::Json<ReplyForm>,
) -> Result<HttpResponse, Error> {
    client.require_login()?;
    let reply_id = path.into_inner();
    let db = get_db_pool();

    let reply = replies::Entity::find_by_id(reply_id)
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("Reply not found"))?;

    if !client.can_modify(reply.author_id) {
        return Err(error::ErrorForbidden("You cannot edit this reply"));
    }

    let text = validate_text(form.text.as_deref(), config.max_comment_length())?;

    let comment_id = reply.comment_id;
    let mut active: replies::ActiveModel = reply.into();
    active.body = Set(text);
    let model = active
        .update(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(ReplyView {
        id: model.id,
        author_id: model.author_id,
        comment_id,
        text: model.body,
        created_at: model.created_at,
        like_count: 0,
        has_liked: false,
    }))
}

/// DELETE /replies/{id} - author or staff; the parent comment is untouched
#[delete("/replies/{id}")]
async fn delete_reply(client: ClientCtx, path: web::Path<i32>) -> Result<HttpResponse, Error> {
    client.require_login()?;
    let reply_id = path.into_inner();
    let db = get_db_pool();

    let reply = replies::Entity::find_by_id(reply_id)
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("Reply not found"))?;

    if !client.can_modify(reply.author_id) {
        return Err(error::ErrorForbidden("You cannot delete this reply"));
    }

    replies::Entity::delete_by_id(reply_id)
        .exec(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::NoContent().finish())
}
