//! Login endpoint with lockout and rate limiting

use crate::app_config;
use crate::db::get_db_pool;
use crate::orm::users;
use crate::session;
use crate::user::Profile;
use actix_web::{error, post, web, Error, HttpRequest, HttpResponse};
use chrono::{Duration, Utc};
use sea_orm::{entity::*, query::*, ColumnTrait, EntityTrait, QueryFilter};
use serde::Deserialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(post_login);
}

#[derive(Deserialize)]
struct LoginForm {
    username: String,
    password: String,
}

/// POST /login
///
/// Failed attempts count toward a per-account lockout; successes reset it.
/// The response never distinguishes a bad name from a bad password.
#[post("/login")]
async fn post_login(
    req: HttpRequest,
    cookies: actix_session::Session,
    form: web::Json<LoginForm>,
) -> Result<HttpResponse, Error> {
    let ip = crate::ip::extract_client_ip(&req).unwrap_or_else(|| "unknown".to_string());

    if let Err(e) = crate::rate_limit::check_login_rate_limit(&ip, &form.username) {
        return Err(error::ErrorTooManyRequests(format!(
            "Too many login attempts. Please try again in {} seconds.",
            e.retry_after_seconds
        )));
    }

    let db = get_db_pool();
    let security = app_config::security();

    let user = users::Entity::find()
        .filter(users::Column::Username.eq(form.username.trim()))
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let user = match user {
        Some(user) => user,
        None => return Err(error::ErrorUnauthorized("Invalid username or password")),
    };

    if let Some(locked_until) = user.locked_until {
        if locked_until > Utc::now().naive_utc() {
            return Err(error::ErrorForbidden(
                "Account is temporarily locked. Try again later.",
            ));
        }
    }

    if !session::verify_password(&form.password, &user.password) {
        let attempts = user.failed_login_attempts + 1;
        let mut active: users::ActiveModel = user.into();
        active.failed_login_attempts = Set(attempts);
        if attempts >= security.max_failed_logins as i32 {
            active.locked_until = Set(Some(
                Utc::now().naive_utc()
                    + Duration::minutes(security.lockout_duration_minutes as i64),
            ));
        }
        active
            .update(db)
            .await
            .map_err(error::ErrorInternalServerError)?;

        return Err(error::ErrorUnauthorized("Invalid username or password"));
    }

    // Successful login clears the failure counter.
    let user = if user.failed_login_attempts > 0 || user.locked_until.is_some() {
        let mut active: users::ActiveModel = user.into();
        active.failed_login_attempts = Set(0);
        active.locked_until = Set(None);
        active
            .update(db)
            .await
            .map_err(error::ErrorInternalServerError)?
    } else {
        user
    };

    session::log_in(&cookies, user.id)?;

    Ok(HttpResponse::Ok().json(Profile::from(user)))
}
