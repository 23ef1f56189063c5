/// Password reset functionality
///
/// This module handles password reset requests and confirmations.
use crate::app_config;
use crate::db::get_db_pool;
use crate::orm::{password_reset_tokens, users};
use crate::session;
use actix_web::{error, post, web, Error, HttpRequest, HttpResponse};
use chrono::{Duration, Utc};
use rand::Rng;
use sea_orm::{entity::*, query::*, ColumnTrait, EntityTrait, QueryFilter};
use serde::Deserialize;
use validator::Validate;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(request_reset).service(confirm_reset);
}

#[derive(Deserialize, Validate)]
struct PasswordResetRequestForm {
    #[validate(email)]
    email: String,
}

#[derive(Deserialize, Validate)]
struct PasswordResetConfirmForm {
    token: String,
    #[validate(length(min = 8, max = 1000))]
    password: String,
}

/// Generate a secure random token
fn generate_reset_token() -> String {
    use rand::distributions::Alphanumeric;

    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect()
}

/// POST /password-reset - request a reset email
///
/// Always answers 200 so callers cannot probe which emails have accounts.
#[post("/password-reset")]
async fn request_reset(
    req: HttpRequest,
    form: web::Json<PasswordResetRequestForm>,
) -> Result<HttpResponse, Error> {
    let ip = crate::ip::extract_client_ip(&req).unwrap_or_else(|| "unknown".to_string());
    if let Err(e) = crate::rate_limit::check_password_reset_rate_limit(&ip) {
        return Err(error::ErrorTooManyRequests(format!(
            "Too many reset requests. Please try again in {} seconds.",
            e.retry_after_seconds
        )));
    }

    form.validate().map_err(|e| {
        log::debug!("Password reset form validation failed: {}", e);
        error::ErrorBadRequest("Invalid email address")
    })?;

    let email = form.email.trim().to_lowercase();
    let db = get_db_pool();

    let user = users::Entity::find()
        .filter(users::Column::Email.eq(email.clone()))
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    if let Some(user) = user {
        let token = generate_reset_token();
        let minutes = app_config::security().reset_token_minutes as i64;
        let now = Utc::now().naive_utc();

        let reset_token = password_reset_tokens::ActiveModel {
            token: Set(token.clone()),
            user_id: Set(user.id),
            created_at: Set(now),
            expires_at: Set(now + Duration::minutes(minutes)),
            used: Set(false),
        };
        reset_token.insert(db).await.map_err(|e| {
            log::error!("Failed to save password reset token: {}", e);
            error::ErrorInternalServerError("Failed to process request")
        })?;

        let base_url = app_config::get_config().site.base_url;
        if let Err(e) =
            crate::email::templates::send_password_reset_email(&email, &user.username, &token, &base_url)
                .await
        {
            log::error!("Failed to send password reset email: {}", e);
        }
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "detail": "If an account exists for that address, a reset email has been sent."
    })))
}

/// POST /password-reset/confirm - redeem a token and set a new password
#[post("/password-reset/confirm")]
async fn confirm_reset(form: web::Json<PasswordResetConfirmForm>) -> Result<HttpResponse, Error> {
    form.validate()
        .map_err(|_| error::ErrorBadRequest("Password must be at least 8 characters"))?;

    let db = get_db_pool();

    let token_row = password_reset_tokens::Entity::find_by_id(form.token.clone())
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorBadRequest("Invalid or expired token"))?;

    if token_row.used || token_row.expires_at < Utc::now().naive_utc() {
        return Err(error::ErrorBadRequest("Invalid or expired token"));
    }

    let user = users::Entity::find_by_id(token_row.user_id)
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorBadRequest("Invalid or expired token"))?;

    let hashed = session::hash_password(&form.password).map_err(|e| {
        log::error!("Password hashing failed: {}", e);
        error::ErrorInternalServerError("Reset failed")
    })?;

    let mut active_user: users::ActiveModel = user.into();
    active_user.password = Set(hashed);
    // A reset also clears any lockout.
    active_user.failed_login_attempts = Set(0);
    active_user.locked_until = Set(None);
    active_user
        .update(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let mut active_token: password_reset_tokens::ActiveModel = token_row.into();
    active_token.used = Set(true);
    active_token
        .update(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "detail": "Password has been reset." })))
}
