//! Friend request endpoints
//!
//! A request creates a pending friendship row; only the addressee can
//! accept or decline. Accepted friendships read the same in both
//! directions.

use crate::db::get_db_pool;
use crate::middleware::ClientCtx;
use crate::orm::friendships::{self, FriendshipStatus};
use crate::orm::users;
use actix_web::{delete, error, get, post, web, Error, HttpResponse};
use chrono::Utc;
use sea_orm::{entity::*, query::*, ColumnTrait, Condition, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(list_friends)
        .service(list_requests)
        .service(send_request)
        .service(accept_request)
        .service(decline_request)
        .service(unfriend);
}

#[derive(Deserialize)]
struct RequestForm {
    username: String,
}

#[derive(Serialize)]
struct FriendView {
    user_id: i32,
    username: String,
    since: chrono::NaiveDateTime,
}

#[derive(Serialize)]
struct RequestView {
    id: i32,
    requester_id: i32,
    requester_username: String,
    created_at: chrono::NaiveDateTime,
}

/// GET /friends - accepted friendships, either direction
#[get("/friends")]
async fn list_friends(client: ClientCtx) -> Result<HttpResponse, Error> {
    let user_id = client.require_login()?;
    let db = get_db_pool();

    let rows = friendships::Entity::find()
        .filter(friendships::Column::Status.eq(FriendshipStatus::Accepted))
        .filter(
            Condition::any()
                .add(friendships::Column::RequesterId.eq(user_id))
                .add(friendships::Column::AddresseeId.eq(user_id)),
        )
        .all(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let friend_ids: Vec<i32> = rows
        .iter()
        .map(|f| {
            if f.requester_id == user_id {
                f.addressee_id
            } else {
                f.requester_id
            }
        })
        .collect();

    let friend_users = users::Entity::find()
        .filter(users::Column::Id.is_in(friend_ids))
        .all(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let views: Vec<FriendView> = rows
        .iter()
        .filter_map(|f| {
            let friend_id = if f.requester_id == user_id {
                f.addressee_id
            } else {
                f.requester_id
            };
            let since = f.responded_at.unwrap_or(f.created_at);
            friend_users
                .iter()
                .find(|u| u.id == friend_id)
                .map(|u| FriendView {
                    user_id: u.id,
                    username: u.username.clone(),
                    since,
                })
        })
        .collect();

    Ok(HttpResponse::Ok().json(views))
}

/// GET /friends/requests - incoming pending requests
#[get("/friends/requests")]
async fn list_requests(client: ClientCtx) -> Result<HttpResponse, Error> {
    let user_id = client.require_login()?;
    let db = get_db_pool();

    let rows = friendships::Entity::find()
        .filter(friendships::Column::AddresseeId.eq(user_id))
        .filter(friendships::Column::Status.eq(FriendshipStatus::Pending))
        .order_by_desc(friendships::Column::CreatedAt)
        .all(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let requester_ids: Vec<i32> = rows.iter().map(|f| f.requester_id).collect();
    let requesters = users::Entity::find()
        .filter(users::Column::Id.is_in(requester_ids))
        .all(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let views: Vec<RequestView> = rows
        .iter()
        .filter_map(|f| {
            requesters
                .iter()
                .find(|u| u.id == f.requester_id)
                .map(|u| RequestView {
                    id: f.id,
                    requester_id: u.id,
                    requester_username: u.username.clone(),
                    created_at: f.created_at,
                })
        })
        .collect();

    Ok(HttpResponse::Ok().json(views))
}

/// POST /friends/requests - send a request by username
#[post("/friends/requests")]
async fn send_request(client: ClientCtx, form: web::Json<RequestForm>) -> Result<HttpResponse, Error> {
    let user_id = client.require_login()?;
    let db = get_db_pool();

    let target = users::Entity::find()
        .filter(users::Column::Username.eq(form.username.trim()))
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("User not found"))?;

    if target.id == user_id {
        return Err(error::ErrorBadRequest("You cannot befriend yourself"));
    }

    let existing = friendships::Entity::find_between(user_id, target.id)
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?;
    if existing.is_some() {
        return Err(error::ErrorBadRequest(
            "A friendship or pending request already exists",
        ));
    }

    let request = friendships::ActiveModel {
        requester_id: Set(user_id),
        addressee_id: Set(target.id),
        status: Set(FriendshipStatus::Pending),
        created_at: Set(Utc::now().naive_utc()),
        responded_at: Set(None),
        ..Default::default()
    };
    let model = request
        .insert(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "id": model.id,
        "addressee_id": target.id,
        "status": "pending",
    })))
}

async fn find_incoming_request(
    request_id: i32,
    addressee_id: i32,
) -> Result<friendships::Model, Error> {
    let request = friendships::Entity::find_by_id(request_id)
        .one(get_db_pool())
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("Request not found"))?;

    if request.addressee_id != addressee_id {
        return Err(error::ErrorForbidden("This request is not addressed to you"));
    }
    if request.status != FriendshipStatus::Pending {
        return Err(error::ErrorBadRequest("Request has already been answered"));
    }
    Ok(request)
}

/// POST /friends/requests/{id}/accept - addressee only
#[post("/friends/requests/{id}/accept")]
async fn accept_request(client: ClientCtx, path: web::Path<i32>) -> Result<HttpResponse, Error> {
    let user_id = client.require_login()?;
    let request = find_incoming_request(path.into_inner(), user_id).await?;

    let mut active: friendships::ActiveModel = request.into();
    active.status = Set(FriendshipStatus::Accepted);
    active.responded_at = Set(Some(Utc::now().naive_utc()));
    active
        .update(get_db_pool())
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "status": "accepted" })))
}

/// POST /friends/requests/{id}/decline - addressee only; the row is removed
#[post("/friends/requests/{id}/decline")]
async fn decline_request(client: ClientCtx, path: web::Path<i32>) -> Result<HttpResponse, Error> {
    let user_id = client.require_login()?;
    let request = find_incoming_request(path.into_inner(), user_id).await?;

    friendships::Entity::delete_by_id(request.id)
        .exec(get_db_pool())
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::NoContent().finish())
}

/// DELETE /friends/{user_id} - unfriend, either direction
#[delete("/friends/{user_id}")]
async fn unfriend(client: ClientCtx, path: web::Path<i32>) -> Result<HttpResponse, Error> {
    let user_id = client.require_login()?;
    let other_id = path.into_inner();
    let db = get_db_pool();

    let existing = friendships::Entity::find_between(user_id, other_id)
        .filter(friendships::Column::Status.eq(FriendshipStatus::Accepted))
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("Friendship not found"))?;

    friendships::Entity::delete_by_id(existing.id)
        .exec(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::NoContent().finish())
}
