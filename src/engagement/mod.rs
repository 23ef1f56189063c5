//! Engagement aggregation over likable content.
//!
//! Attaches like/comment aggregates and the viewer's own state to a
//! collection of (kind, id) targets in a constant number of queries,
//! and implements the idempotent like/unlike operations.

pub mod ranking;
pub mod ratings;

use crate::content::ContentKind;
use crate::orm::{comments, likes, replies};
use chrono::Utc;
use sea_orm::{
    entity::*, query::*, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, TransactionTrait,
};
use serde::Serialize;
use std::collections::HashMap;

/// Aggregated engagement for one entity, as seen by one viewer.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Engagement {
    pub like_count: i64,
    pub comment_count: i64,
    pub has_liked: bool,
}

/// Compute engagement for every id in `ids`, in bulk.
///
/// Costs one likes query, plus one comments and one replies query for
/// comment-bearing kinds; never one query per row. Every requested id gets
/// an entry, zeroed when the row has no engagement.
pub async fn annotate(
    db: &DatabaseConnection,
    kind: ContentKind,
    ids: &[i32],
    viewer: Option<i32>,
) -> Result<HashMap<i32, Engagement>, DbErr> {
    let mut result: HashMap<i32, Engagement> = HashMap::new();
    if ids.is_empty() {
        return Ok(result);
    }

    for &id in ids {
        result.insert(id, Engagement::default());
    }

    let like_rows = likes::Entity::find()
        .filter(likes::Column::TargetKind.eq(kind))
        .filter(likes::Column::TargetId.is_in(ids.to_vec()))
        .all(db)
        .await?;

    for like in &like_rows {
        if let Some(entry) = result.get_mut(&like.target_id) {
            entry.like_count += 1;
            if viewer == Some(like.user_id) {
                entry.has_liked = true;
            }
        }
    }

    // Comments and replies only exist for kinds with a comment surface.
    // For the rest this is the structural no-relation case: counts stay zero.
    if kind.supports_comments() {
        let comment_rows = comments::Entity::find()
            .filter(comments::Column::TargetKind.eq(kind))
            .filter(comments::Column::TargetId.is_in(ids.to_vec()))
            .all(db)
            .await?;

        // Replies roll up into their target's comment count.
        let mut comment_targets: HashMap<i32, i32> = HashMap::new();
        for comment in &comment_rows {
            comment_targets.insert(comment.id, comment.target_id);
            if let Some(entry) = result.get_mut(&comment.target_id) {
                entry.comment_count += 1;
            }
        }

        if !comment_targets.is_empty() {
            let comment_ids: Vec<i32> = comment_targets.keys().copied().collect();
            let reply_rows = replies::Entity::find()
                .filter(replies::Column::CommentId.is_in(comment_ids))
                .all(db)
                .await?;

            for reply in &reply_rows {
                if let Some(target_id) = comment_targets.get(&reply.comment_id) {
                    if let Some(entry) = result.get_mut(target_id) {
                        entry.comment_count += 1;
                    }
                }
            }
        }
    }

    Ok(result)
}

/// Annotate a single target.
pub async fn annotate_one(
    db: &DatabaseConnection,
    kind: ContentKind,
    id: i32,
    viewer: Option<i32>,
) -> Result<Engagement, DbErr> {
    let mut map = annotate(db, kind, &[id], viewer).await?;
    Ok(map.remove(&id).unwrap_or_default())
}

/// Annotate, degrading to zeroed summaries if the aggregate queries fail.
///
/// List surfaces treat engagement as decoration, not as the payload, so a
/// failed aggregate is logged and masked with defaults instead of failing
/// the whole response.
pub async fn annotate_or_default(
    db: &DatabaseConnection,
    kind: ContentKind,
    ids: &[i32],
    viewer: Option<i32>,
) -> HashMap<i32, Engagement> {
    match annotate(db, kind, ids, viewer).await {
        Ok(map) => map,
        Err(e) => {
            log::error!("engagement annotation failed for {}: {}", kind.label(), e);
            ids.iter().map(|id| (*id, Engagement::default())).collect()
        }
    }
}

/// Ensure a like row exists for (user, target). No-op when already liked.
///
/// A concurrent duplicate insert loses to the unique index; the loser
/// re-checks and treats the surviving row as success.
pub async fn ensure_liked(
    db: &DatabaseConnection,
    user_id: i32,
    kind: ContentKind,
    target_id: i32,
) -> Result<(), DbErr> {
    let existing = likes::Entity::find_by_user_and_target(user_id, kind, target_id)
        .one(db)
        .await?;
    if existing.is_some() {
        return Ok(());
    }

    let like = likes::ActiveModel {
        user_id: Set(user_id),
        target_kind: Set(kind),
        target_id: Set(target_id),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    };

    match like.insert(db).await {
        Ok(_) => Ok(()),
        Err(e) => {
            let row = likes::Entity::find_by_user_and_target(user_id, kind, target_id)
                .one(db)
                .await?;
            if row.is_some() {
                Ok(())
            } else {
                Err(e)
            }
        }
    }
}

/// Remove every engagement row attached to a target.
///
/// Polymorphic (kind, id) references carry no foreign key, so deleting an
/// entity must sweep its likes, comments, replies, and the likes held by
/// those comments and replies. Ratings live in per-type tables and are
/// cascade-deleted by the store.
pub async fn purge_target(
    db: &DatabaseConnection,
    kind: ContentKind,
    target_id: i32,
) -> Result<(), DbErr> {
    let txn = db.begin().await?;

    if kind.supports_comments() {
        let comment_rows = comments::Entity::find()
            .filter(comments::Column::TargetKind.eq(kind))
            .filter(comments::Column::TargetId.eq(target_id))
            .all(&txn)
            .await?;
        let comment_ids: Vec<i32> = comment_rows.iter().map(|c| c.id).collect();

        if !comment_ids.is_empty() {
            let reply_rows = replies::Entity::find()
                .filter(replies::Column::CommentId.is_in(comment_ids.clone()))
                .all(&txn)
                .await?;
            let reply_ids: Vec<i32> = reply_rows.iter().map(|r| r.id).collect();

            if !reply_ids.is_empty() {
                likes::Entity::delete_many()
                    .filter(likes::Column::TargetKind.eq(ContentKind::Reply))
                    .filter(likes::Column::TargetId.is_in(reply_ids))
                    .exec(&txn)
                    .await?;
                replies::Entity::delete_many()
                    .filter(replies::Column::CommentId.is_in(comment_ids.clone()))
                    .exec(&txn)
                    .await?;
            }

            likes::Entity::delete_many()
                .filter(likes::Column::TargetKind.eq(ContentKind::Comment))
                .filter(likes::Column::TargetId.is_in(comment_ids.clone()))
                .exec(&txn)
                .await?;
            comments::Entity::delete_many()
                .filter(comments::Column::Id.is_in(comment_ids))
                .exec(&txn)
                .await?;
        }
    }

    likes::Entity::delete_many()
        .filter(likes::Column::TargetKind.eq(kind))
        .filter(likes::Column::TargetId.eq(target_id))
        .exec(&txn)
        .await?;

    txn.commit().await
}

/// Ensure no like row exists for (user, target). No-op when not liked.
pub async fn ensure_unliked(
    db: &DatabaseConnection,
    user_id: i32,
    kind: ContentKind,
    target_id: i32,
) -> Result<(), DbErr> {
    likes::Entity::delete_many()
        .filter(likes::Column::UserId.eq(user_id))
        .filter(likes::Column::TargetKind.eq(kind))
        .filter(likes::Column::TargetId.eq(target_id))
        .exec(db)
        .await?;
    Ok(())
}
