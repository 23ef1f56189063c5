//! Content kinds and the (kind, id) target registry.
//!
//! Likes and comments point at arbitrary content through a (kind, id) pair
//! instead of a per-table foreign key. The kind is a closed enum; resolving
//! a pair against the registry is the only way to validate a target.

use crate::orm::{
    comments, events, history_entries, moments, posts, replies, team_members, videos,
};
use sea_orm::entity::prelude::*;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};

/// Section keys in their default display order. Also the set of keys the
/// order store will persist; anything else in an `order` parameter is
/// dropped.
pub static SECTION_KEYS: [&str; 6] = ["video", "post", "event", "moment", "team", "history"];

/// Every record kind a like or comment may target.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    #[sea_orm(string_value = "video")]
    Video,
    #[sea_orm(string_value = "post")]
    Post,
    #[sea_orm(string_value = "event")]
    Event,
    #[sea_orm(string_value = "team")]
    Team,
    #[sea_orm(string_value = "history")]
    History,
    #[sea_orm(string_value = "moment")]
    Moment,
    #[sea_orm(string_value = "comment")]
    Comment,
    #[sea_orm(string_value = "reply")]
    Reply,
}

impl ContentKind {
    /// Parse the wire label. Returns None for anything outside the closed set.
    pub fn from_label(label: &str) -> Option<Self> {
        Some(match label {
            "video" => Self::Video,
            "post" => Self::Post,
            "event" => Self::Event,
            "team" => Self::Team,
            "history" => Self::History,
            "moment" => Self::Moment,
            "comment" => Self::Comment,
            "reply" => Self::Reply,
            _ => return None,
        })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Post => "post",
            Self::Event => "event",
            Self::Team => "team",
            Self::History => "history",
            Self::Moment => "moment",
            Self::Comment => "comment",
            Self::Reply => "reply",
        }
    }

    /// Kinds that carry a comment thread. Comments and replies take likes
    /// only; their own discussion happens through replies.
    pub fn supports_comments(&self) -> bool {
        !matches!(self, Self::Comment | Self::Reply)
    }

    /// Kinds backed by a per-type rating table.
    pub fn supports_ratings(&self) -> bool {
        matches!(self, Self::Post | Self::Video)
    }

    /// Kinds whose detail read bumps a stored view counter.
    pub fn has_view_counter(&self) -> bool {
        matches!(self, Self::Video | Self::Post | Self::Event | Self::Moment)
    }
}

/// Check that (kind, id) resolves to a real row.
///
/// This is the registry behind comment/like target validation: each kind
/// dispatches to its concrete entity.
pub async fn target_exists(
    db: &DatabaseConnection,
    kind: ContentKind,
    id: i32,
) -> Result<bool, DbErr> {
    let found = match kind {
        ContentKind::Video => videos::Entity::find_by_id(id).one(db).await?.is_some(),
        ContentKind::Post => posts::Entity::find_by_id(id).one(db).await?.is_some(),
        ContentKind::Event => events::Entity::find_by_id(id).one(db).await?.is_some(),
        ContentKind::Team => team_members::Entity::find_by_id(id).one(db).await?.is_some(),
        ContentKind::History => history_entries::Entity::find_by_id(id)
            .one(db)
            .await?
            .is_some(),
        ContentKind::Moment => moments::Entity::find_by_id(id).one(db).await?.is_some(),
        ContentKind::Comment => comments::Entity::find_by_id(id).one(db).await?.is_some(),
        ContentKind::Reply => replies::Entity::find_by_id(id).one(db).await?.is_some(),
    };
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_round_trip() {
        for label in ["video", "post", "event", "team", "history", "moment", "comment", "reply"] {
            let kind = ContentKind::from_label(label).expect("known label");
            assert_eq!(kind.label(), label);
        }
    }

    #[test]
    fn test_unknown_label_rejected() {
        assert!(ContentKind::from_label("playlist").is_none());
        assert!(ContentKind::from_label("").is_none());
        assert!(ContentKind::from_label("Video").is_none(), "labels are case sensitive");
    }

    #[test]
    fn test_section_keys_are_valid_kinds() {
        for key in SECTION_KEYS {
            assert!(ContentKind::from_label(key).is_some());
        }
    }

    #[test]
    fn test_capability_sets() {
        assert!(ContentKind::Comment.supports_comments() == false);
        assert!(ContentKind::Reply.supports_comments() == false);
        assert!(ContentKind::Video.supports_comments());

        assert!(ContentKind::Post.supports_ratings());
        assert!(ContentKind::Video.supports_ratings());
        assert!(!ContentKind::Event.supports_ratings());

        assert!(ContentKind::Moment.has_view_counter());
        assert!(!ContentKind::Team.has_view_counter());
    }
}
