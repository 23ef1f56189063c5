//! Section order store.
//!
//! The landing surfaces show content grouped into named sections. Staff can
//! persist a display order for those sections; everyone can read it. Keys
//! come from the fixed set in [`crate::content::SECTION_KEYS`] and fall back
//! to that default order when nothing is persisted.

use crate::content::SECTION_KEYS;
use crate::orm::section_positions;
use chrono::Utc;
use sea_orm::{entity::*, query::*, DatabaseConnection, DbErr, EntityTrait};

/// Parse an `order=key=pos,key=pos` parameter.
///
/// Unknown keys and malformed pairs are dropped pair-wise; a later duplicate
/// of a key wins over an earlier one.
pub fn parse_order_param(raw: &str) -> Vec<(String, i32)> {
    let mut pairs: Vec<(String, i32)> = Vec::new();
    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let (key, pos) = match part.split_once('=') {
            Some(kv) => kv,
            None => continue,
        };
        let key = key.trim();
        if !SECTION_KEYS.contains(&key) {
            continue;
        }
        let pos: i32 = match pos.trim().parse() {
            Ok(n) => n,
            Err(_) => continue,
        };
        pairs.retain(|(k, _)| k != key);
        pairs.push((key.to_string(), pos));
    }
    pairs
}

/// Complete a partial ordering: supplied pairs keep their positions, keys
/// from the fixed set that were not supplied are appended after the maximum
/// supplied position, preserving the default relative order among
/// themselves.
pub fn merge_with_defaults(supplied: &[(String, i32)]) -> Vec<(String, i32)> {
    let mut full: Vec<(String, i32)> = supplied.to_vec();
    let mut next = supplied.iter().map(|(_, p)| *p).max().unwrap_or(0);

    for key in SECTION_KEYS {
        if !full.iter().any(|(k, _)| k == key) {
            next += 1;
            full.push((key.to_string(), next));
        }
    }

    full.sort_by_key(|(_, p)| *p);
    full
}

/// Keys in display order for a given pair list.
pub fn keys_in_order(pairs: &[(String, i32)]) -> Vec<String> {
    merge_with_defaults(pairs)
        .into_iter()
        .map(|(k, _)| k)
        .collect()
}

/// The persisted ordering, completed with defaults; the hardcoded default
/// order when nothing is persisted.
pub async fn effective_order(db: &DatabaseConnection) -> Result<Vec<String>, DbErr> {
    let rows = section_positions::Entity::find()
        .order_by_asc(section_positions::Column::Position)
        .all(db)
        .await?;

    let persisted: Vec<(String, i32)> = rows
        .into_iter()
        .filter(|row| SECTION_KEYS.contains(&row.key.as_str()))
        .map(|row| (row.key, row.position))
        .collect();

    Ok(keys_in_order(&persisted))
}

/// Upsert the supplied pairs plus the default-completion of missing keys.
/// Callers are responsible for the staff check.
pub async fn persist_order(
    db: &DatabaseConnection,
    supplied: &[(String, i32)],
) -> Result<(), DbErr> {
    let now = Utc::now().naive_utc();

    for (key, position) in merge_with_defaults(supplied) {
        let existing = section_positions::Entity::find_by_id(key.clone()).one(db).await?;
        match existing {
            Some(row) => {
                let mut active: section_positions::ActiveModel = row.into();
                active.position = Set(position);
                active.updated_at = Set(now);
                active.update(db).await?;
            }
            None => {
                let row = section_positions::ActiveModel {
                    key: Set(key),
                    position: Set(position),
                    updated_at: Set(now),
                };
                row.insert(db).await?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_order_param() {
        let pairs = parse_order_param("event=1,video=2");
        assert_eq!(pairs, vec![("event".to_string(), 1), ("video".to_string(), 2)]);
    }

    #[test]
    fn test_parse_order_param_ignores_unknown_and_malformed() {
        let pairs = parse_order_param("carousel=1,video=x,post=3,,=5,team");
        assert_eq!(pairs, vec![("post".to_string(), 3)]);
    }

    #[test]
    fn test_parse_order_param_last_duplicate_wins() {
        let pairs = parse_order_param("video=1,video=4");
        assert_eq!(pairs, vec![("video".to_string(), 4)]);
    }

    #[test]
    fn test_merge_appends_missing_after_max() {
        let supplied = vec![("event".to_string(), 10), ("video".to_string(), 2)];
        let full = merge_with_defaults(&supplied);

        assert_eq!(full.len(), SECTION_KEYS.len());
        assert_eq!(full[0], ("video".to_string(), 2));
        assert_eq!(full[1], ("event".to_string(), 10));
        // Remaining keys follow in default relative order, after position 10.
        let tail: Vec<&str> = full[2..].iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(tail, vec!["post", "moment", "team", "history"]);
        assert!(full[2].1 > 10);
    }

    #[test]
    fn test_empty_supplied_yields_default_order() {
        let keys = keys_in_order(&[]);
        assert_eq!(keys, SECTION_KEYS.to_vec());
    }
}
