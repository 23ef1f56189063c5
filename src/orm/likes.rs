//! SeaORM Entity for likes table
//!
//! One row per (user, target_kind, target_id). The unique index on that
//! triple is the only concurrency guard for duplicate likes.

use crate::content::ContentKind;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "likes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub target_kind: ContentKind,
    pub target_id: i32,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Entity {
    /// Select the like row a user holds on a specific target, if any.
    pub fn find_by_user_and_target(user_id: i32, kind: ContentKind, target_id: i32) -> Select<Entity> {
        Entity::find()
            .filter(Column::UserId.eq(user_id))
            .filter(Column::TargetKind.eq(kind))
            .filter(Column::TargetId.eq(target_id))
    }
}
