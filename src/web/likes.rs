//! Generic like/unlike endpoints
//!
//! Likes attach to any content kind through the (kind, id) registry, so a
//! single pair of routes covers every resource. Both operations are
//! idempotent: repeating one produces the same end state without error.

use crate::content::{self, ContentKind};
use crate::db::get_db_pool;
use crate::engagement;
use crate::middleware::ClientCtx;
use actix_web::{delete, error, post, web, Error, HttpResponse};
use serde::Serialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(like_target).service(unlike_target);
}

/// Map a URL resource segment to its content kind.
pub fn kind_from_resource(segment: &str) -> Option<ContentKind> {
    Some(match segment {
        "videos" => ContentKind::Video,
        "posts" => ContentKind::Post,
        "events" => ContentKind::Event,
        "team" => ContentKind::Team,
        "history" => ContentKind::History,
        "moments" => ContentKind::Moment,
        "comments" => ContentKind::Comment,
        "replies" => ContentKind::Reply,
        _ => return None,
    })
}

/// Response for like state changes
#[derive(Serialize)]
struct LikeResponse {
    id: i32,
    like_count: i64,
    has_liked: bool,
}

async fn resolve_target(resource: &str, id: i32) -> Result<ContentKind, Error> {
    let kind = kind_from_resource(resource)
        .ok_or_else(|| error::ErrorNotFound("Unknown resource"))?;

    let exists = content::target_exists(get_db_pool(), kind, id)
        .await
        .map_err(error::ErrorInternalServerError)?;
    if !exists {
        return Err(error::ErrorNotFound("Content not found"));
    }
    Ok(kind)
}

/// Ensure the caller's like exists on the target.
#[post("/{resource}/{id}/like")]
async fn like_target(
    client: ClientCtx,
    path: web::Path<(String, i32)>,
) -> Result<HttpResponse, Error> {
    let user_id = client.require_login()?;
    let (resource, id) = path.into_inner();
    let kind = resolve_target(&resource, id).await?;
    let db = get_db_pool();

    engagement::ensure_liked(db, user_id, kind, id)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let summary = engagement::annotate_one(db, kind, id, Some(user_id))
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(LikeResponse {
        id,
        like_count: summary.like_count,
        has_liked: summary.has_liked,
    }))
}

/// Ensure the caller's like is absent from the target.
#[delete("/{resource}/{id}/like")]
async fn unlike_target(
    client: ClientCtx,
    path: web::Path<(String, i32)>,
) -> Result<HttpResponse, Error> {
    let user_id = client.require_login()?;
    let (resource, id) = path.into_inner();
    let kind = resolve_target(&resource, id).await?;
    let db = get_db_pool();

    engagement::ensure_unliked(db, user_id, kind, id)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let summary = engagement::annotate_one(db, kind, id, Some(user_id))
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(LikeResponse {
        id,
        like_count: summary.like_count,
        has_liked: summary.has_liked,
    }))
}

/// Shared implementation for the `{"has_liked": bool}` PATCH affordance on
/// resource detail routes.
pub async fn apply_has_liked(
    client: &ClientCtx,
    kind: ContentKind,
    id: i32,
    has_liked: bool,
) -> Result<engagement::Engagement, Error> {
    let user_id = client.require_login()?;
    let db = get_db_pool();

    if has_liked {
        engagement::ensure_liked(db, user_id, kind, id)
            .await
            .map_err(error::ErrorInternalServerError)?;
    } else {
        engagement::ensure_unliked(db, user_id, kind, id)
            .await
            .map_err(error::ErrorInternalServerError)?;
    }

    engagement::annotate_one(db, kind, id, Some(user_id))
        .await
        .map_err(error::ErrorInternalServerError)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_resource() {
        assert_eq!(kind_from_resource("videos"), Some(ContentKind::Video));
        assert_eq!(kind_from_resource("team"), Some(ContentKind::Team));
        assert_eq!(kind_from_resource("replies"), Some(ContentKind::Reply));
        assert_eq!(kind_from_resource("users"), None);
        assert_eq!(kind_from_resource(""), None);
    }
}
