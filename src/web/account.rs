//! Registration and profile management

use crate::config::Config;
use crate::db::get_db_pool;
use crate::middleware::ClientCtx;
use crate::orm::users;
use crate::session;
use crate::user::Profile;
use actix_web::{error, get, patch, post, web, Error, HttpResponse};
use chrono::Utc;
use sea_orm::{entity::*, query::*, ColumnTrait, EntityTrait, QueryFilter};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(register)
        .service(view_profile)
        .service(update_profile);
}

#[derive(Deserialize, Validate)]
struct RegisterForm {
    #[validate(length(min = 1, max = 64))]
    username: String,
    #[validate(length(min = 8, max = 1000))]
    password: String,
    #[validate(email)]
    email: String,
}

#[derive(Deserialize)]
struct ProfileForm {
    email: Option<String>,
    bio: Option<String>,
    current_password: Option<String>,
    new_password: Option<String>,
}

fn field_error(field: &str, message: &str) -> Error {
    error::ErrorBadRequest(serde_json::json!({ field: message }).to_string())
}

/// POST /register - create an account and log it in
#[post("/register")]
async fn register(
    config: web::Data<Arc<Config>>,
    cookies: actix_session::Session,
    form: web::Json<RegisterForm>,
) -> Result<HttpResponse, Error> {
    if !config.registration_enabled() {
        return Err(error::ErrorForbidden("Registration is currently disabled"));
    }

    form.validate().map_err(error::ErrorBadRequest)?;

    let username = form.username.trim().to_string();
    let email = form.email.trim().to_lowercase();
    let db = get_db_pool();

    let name_taken = users::Entity::find()
        .filter(users::Column::Username.eq(username.clone()))
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?
        .is_some();
    if name_taken {
        return Err(field_error("username", "This username is taken."));
    }

    let email_taken = users::Entity::find()
        .filter(users::Column::Email.eq(email.clone()))
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?
        .is_some();
    if email_taken {
        return Err(field_error("email", "An account with this email already exists."));
    }

    let password = session::hash_password(&form.password).map_err(|e| {
        log::error!("Password hashing failed: {}", e);
        error::ErrorInternalServerError("Registration failed")
    })?;

    let user = users::ActiveModel {
        username: Set(username),
        email: Set(Some(email)),
        password: Set(password),
        bio: Set(None),
        is_staff: Set(false),
        failed_login_attempts: Set(0),
        locked_until: Set(None),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    };
    let model = user
        .insert(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    session::log_in(&cookies, model.id)?;

    Ok(HttpResponse::Created().json(Profile::from(model)))
}

/// GET /profile - the caller's own profile
#[get("/profile")]
async fn view_profile(client: ClientCtx) -> Result<HttpResponse, Error> {
    let user_id = client.require_login()?;
    let profile = Profile::get_by_id(get_db_pool(), user_id)
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("User not found"))?;
    Ok(HttpResponse::Ok().json(profile))
}

/// PATCH /profile - update email/bio; password change needs the current one
#[patch("/profile")]
async fn update_profile(
    client: ClientCtx,
    form: web::Json<ProfileForm>,
) -> Result<HttpResponse, Error> {
    let user_id = client.require_login()?;
    let db = get_db_pool();

    let model = users::Entity::find_by_id(user_id)
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("User not found"))?;

    let mut active: users::ActiveModel = model.clone().into();

    if let Some(email) = &form.email {
        let email = email.trim().to_lowercase();
        if !email.contains('@') {
            return Err(field_error("email", "Invalid email address."));
        }
        let taken = users::Entity::find()
            .filter(users::Column::Email.eq(email.clone()))
            .filter(users::Column::Id.ne(user_id))
            .one(db)
            .await
            .map_err(error::ErrorInternalServerError)?
            .is_some();
        if taken {
            return Err(field_error("email", "An account with this email already exists."));
        }
        active.email = Set(Some(email));
    }

    if let Some(bio) = &form.bio {
        active.bio = Set(Some(bio.trim().to_string()));
    }

    if let Some(new_password) = &form.new_password {
        let current = form
            .current_password
            .as_deref()
            .ok_or_else(|| field_error("current_password", "This field is required."))?;
        if !session::verify_password(current, &model.password) {
            return Err(field_error("current_password", "Incorrect password."));
        }
        if new_password.len() < 8 {
            return Err(field_error("new_password", "Password must be at least 8 characters."));
        }
        let hashed = session::hash_password(new_password).map_err(|e| {
            log::error!("Password hashing failed: {}", e);
            error::ErrorInternalServerError("Update failed")
        })?;
        active.password = Set(hashed);
    }

    let model = active
        .update(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(Profile::from(model)))
}
