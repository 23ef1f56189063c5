pub mod account;
pub mod categories;
pub mod comments;
pub mod events;
pub mod friends;
pub mod history;
pub mod likes;
pub mod login;
pub mod logout;
pub mod moments;
pub mod password_reset;
pub mod posts;
pub mod ratings;
pub mod search;
pub mod stats;
pub mod team;
pub mod videos;

/// Configures the web app by adding services from each web file.
///
/// @see https://docs.rs/actix-web/4.0.1/actix_web/struct.App.html#method.configure
pub fn configure(conf: &mut actix_web::web::ServiceConfig) {
    // Descending order. Order is important.
    // Route resolution will stop at the first match, so fixed segments
    // (e.g. /videos/top-liked) must register before /{id} routes.
    account::configure(conf);
    login::configure(conf);
    logout::configure(conf);
    password_reset::configure(conf);
    friends::configure(conf);
    stats::configure(conf);
    search::configure(conf);
    categories::configure(conf);
    videos::configure(conf);
    posts::configure(conf);
    events::configure(conf);
    team::configure(conf);
    history::configure(conf);
    moments::configure(conf);
    comments::configure(conf);
    ratings::configure(conf);
    likes::configure(conf);
}
