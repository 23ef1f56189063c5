//! Team member endpoints

use crate::content::ContentKind;
use crate::db::get_db_pool;
use crate::engagement;
use crate::middleware::ClientCtx;
use crate::orm::team_members;
use actix_web::{delete, error, get, patch, post, web, Error, HttpResponse};
use chrono::Utc;
use sea_orm::{entity::*, query::*, EntityTrait};
use serde::{Deserialize, Serialize};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(list_team)
        .service(create_member)
        .service(view_member)
        .service(update_member)
        .service(delete_member);
}

#[derive(Serialize)]
struct TeamMemberView {
    id: i32,
    name: String,
    role: String,
    bio: Option<String>,
    joined_at: Option<chrono::NaiveDateTime>,
    created_at: chrono::NaiveDateTime,
    like_count: i64,
    comment_count: i64,
    has_liked: bool,
}

impl TeamMemberView {
    fn from_model(model: team_members::Model, summary: engagement::Engagement) -> Self {
        Self {
            id: model.id,
            name: model.name,
            role: model.role,
            bio: model.bio,
            joined_at: model.joined_at,
            created_at: model.created_at,
            like_count: summary.like_count,
            comment_count: summary.comment_count,
            has_liked: summary.has_liked,
        }
    }
}

#[derive(Deserialize)]
struct MemberForm {
    name: String,
    role: String,
    bio: Option<String>,
    joined_at: Option<chrono::NaiveDateTime>,
}

#[derive(Deserialize)]
struct MemberPatch {
    has_liked: Option<bool>,
    name: Option<String>,
    role: Option<String>,
    bio: Option<String>,
}

/// GET /team - the whole roster, unpaginated
#[get("/team")]
async fn list_team(client: ClientCtx) -> Result<HttpResponse, Error> {
    let db = get_db_pool();

    let rows = team_members::Entity::find()
        .order_by_asc(team_members::Column::Name)
        .all(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let ids: Vec<i32> = rows.iter().map(|m| m.id).collect();
    let mut summaries =
        engagement::annotate_or_default(db, ContentKind::Team, &ids, client.get_id()).await;

    let views: Vec<TeamMemberView> = rows
        .into_iter()
        .map(|m| {
            let summary = summaries.remove(&m.id).unwrap_or_default();
            TeamMemberView::from_model(m, summary)
        })
        .collect();

    Ok(HttpResponse::Ok().json(views))
}

/// GET /team/{id}
#[get("/team/{id}")]
async fn view_member(client: ClientCtx, path: web::Path<i32>) -> Result<HttpResponse, Error> {
    let member_id = path.into_inner();
    let db = get_db_pool();

    let model = team_members::Entity::find_by_id(member_id)
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("Team member not found"))?;

    let summary = engagement::annotate_one(db, ContentKind::Team, member_id, client.get_id())
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(TeamMemberView::from_model(model, summary)))
}

/// POST /team - staff only
#[post("/team")]
async fn create_member(
    client: ClientCtx,
    form: web::Json<MemberForm>,
) -> Result<HttpResponse, Error> {
    client.require_staff()?;

    let member = team_members::ActiveModel {
        name: Set(form.name.trim().to_string()),
        role: Set(form.role.trim().to_string()),
        bio: Set(form.bio.clone()),
        joined_at: Set(form.joined_at),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    };
    let model = member
        .insert(get_db_pool())
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::Created().json(TeamMemberView::from_model(model, Default::default())))
}

/// PATCH /team/{id} - like toggle or staff content update
#[patch("/team/{id}")]
async fn update_member(
    client: ClientCtx,
    path: web::Path<i32>,
    form: web::Json<MemberPatch>,
) -> Result<HttpResponse, Error> {
    let member_id = path.into_inner();
    let db = get_db_pool();

    let model = team_members::Entity::find_by_id(member_id)
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("Team member not found"))?;

    let summary = if let Some(has_liked) = form.has_liked {
        super::likes::apply_has_liked(&client, ContentKind::Team, member_id, has_liked).await?
    } else {
        engagement::annotate_one(db, ContentKind::Team, member_id, client.get_id())
            .await
            .map_err(error::ErrorInternalServerError)?
    };

    let touches_content = form.name.is_some() || form.role.is_some() || form.bio.is_some();

    let model = if touches_content {
        client.require_staff()?;

        let mut active: team_members::ActiveModel = model.into();
        if let Some(name) = &form.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(role) = &form.role {
            active.role = Set(role.trim().to_string());
        }
        if let Some(bio) = &form.bio {
            active.bio = Set(Some(bio.clone()));
        }
        active
            .update(db)
            .await
            .map_err(error::ErrorInternalServerError)?
    } else {
        model
    };

    Ok(HttpResponse::Ok().json(TeamMemberView::from_model(model, summary)))
}

/// DELETE /team/{id} - staff only
#[delete("/team/{id}")]
async fn delete_member(client: ClientCtx, path: web::Path<i32>) -> Result<HttpResponse, Error> {
    client.require_staff()?;
    let member_id = path.into_inner();
    let db = get_db_pool();

    team_members::Entity::find_by_id(member_id)
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("Team member not found"))?;

    engagement::purge_target(db, ContentKind::Team, member_id)
        .await
        .map_err(error::ErrorInternalServerError)?;
    team_members::Entity::delete_by_id(member_id)
        .exec(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::NoContent().finish())
}
