//! SeaORM entities, one module per table.

pub mod categories;
pub mod comments;
pub mod events;
pub mod friendships;
pub mod history_entries;
pub mod likes;
pub mod moments;
pub mod password_reset_tokens;
pub mod post_ratings;
pub mod posts;
pub mod replies;
pub mod section_positions;
pub mod settings;
pub mod team_members;
pub mod users;
pub mod video_ratings;
pub mod videos;
