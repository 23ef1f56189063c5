//! Cookie-session authentication and password hashing.
//!
//! The session cookie stores only the user id; the profile is re-read per
//! request by the client-context middleware.

use crate::db::get_db_pool;
use crate::orm::users;
use crate::user::Profile;
use actix_session::Session;
use argon2::password_hash::{rand_core::OsRng, PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use once_cell::sync::OnceCell;
use sea_orm::EntityTrait;

const SESSION_USER_KEY: &str = "uid";

static ARGON2: OnceCell<Argon2<'static>> = OnceCell::new();

/// Initialize module statics. Safe to call more than once.
pub fn init() {
    let _ = ARGON2.set(Argon2::default());
}

pub fn get_argon2() -> &'static Argon2<'static> {
    ARGON2.get().expect("Argon2 is not initialized")
}

/// Hash a plain-text password into a PHC string.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(get_argon2()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// Verify a plain-text password against a stored PHC string.
pub fn verify_password(password: &str, phc: &str) -> bool {
    match PasswordHash::new(phc) {
        Ok(parsed) => get_argon2()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            log::error!("Stored password hash failed to parse: {}", e);
            false
        }
    }
}

/// Mark the session as logged in.
pub fn log_in(session: &Session, user_id: i32) -> Result<(), actix_web::Error> {
    session
        .insert(SESSION_USER_KEY, user_id)
        .map_err(actix_web::error::ErrorInternalServerError)
}

/// Drop all session state.
pub fn log_out(session: &Session) {
    session.purge();
}

/// Resolve the session cookie to a profile, or None for guests and stale
/// sessions.
pub async fn authenticate_client_by_session(session: &Session) -> Option<Profile> {
    let user_id: i32 = match session.get(SESSION_USER_KEY) {
        Ok(Some(id)) => id,
        Ok(None) => return None,
        Err(e) => {
            log::debug!("Unreadable session cookie: {}", e);
            return None;
        }
    };

    match users::Entity::find_by_id(user_id).one(get_db_pool()).await {
        Ok(Some(user)) => Some(Profile::from(user)),
        Ok(None) => None,
        Err(e) => {
            log::error!("Session user lookup failed: {}", e);
            None
        }
    }
}
