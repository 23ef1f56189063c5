//! Logout endpoint

use actix_web::{post, HttpResponse};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(post_logout);
}

/// POST /logout - drop the session; always succeeds
#[post("/logout")]
async fn post_logout(cookies: actix_session::Session) -> HttpResponse {
    crate::session::log_out(&cookies);
    HttpResponse::NoContent().finish()
}
