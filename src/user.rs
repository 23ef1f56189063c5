//! User profile model shared by the client context and handlers.

use crate::orm::users;
use sea_orm::{DatabaseConnection, EntityTrait};
use serde::Serialize;

/// The request-facing view of a user row. Never carries the password hash.
#[derive(Clone, Debug, Serialize)]
pub struct Profile {
    pub id: i32,
    pub username: String,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub is_staff: bool,
    pub created_at: chrono::NaiveDateTime,
}

impl From<users::Model> for Profile {
    fn from(user: users::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            bio: user.bio,
            is_staff: user.is_staff,
            created_at: user.created_at,
        }
    }
}

impl Profile {
    pub async fn get_by_id(
        db: &DatabaseConnection,
        id: i32,
    ) -> Result<Option<Self>, sea_orm::DbErr> {
        Ok(users::Entity::find_by_id(id).one(db).await?.map(Self::from))
    }
}
