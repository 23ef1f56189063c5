//! SeaORM Entity for friendships table
//!
//! A friendship row is created by the requester and flips to accepted when
//! the addressee confirms. At most one row exists per directed pair.

use sea_orm::entity::prelude::*;
use sea_orm::Condition;

#[derive(Clone, Debug, PartialEq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
pub enum FriendshipStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "accepted")]
    Accepted,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "friendships")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub requester_id: i32,
    pub addressee_id: i32,
    pub status: FriendshipStatus,
    pub created_at: DateTime,
    pub responded_at: Option<DateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::RequesterId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Requester,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::AddresseeId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Addressee,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Requester.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Entity {
    /// Select the row joining two users in either direction.
    pub fn find_between(a: i32, b: i32) -> Select<Entity> {
        Entity::find().filter(
            Condition::any()
                .add(
                    Condition::all()
                        .add(Column::RequesterId.eq(a))
                        .add(Column::AddresseeId.eq(b)),
                )
                .add(
                    Condition::all()
                        .add(Column::RequesterId.eq(b))
                        .add(Column::AddresseeId.eq(a)),
                ),
        )
    }
}
