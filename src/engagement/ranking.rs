//! Ranked "top N" listings over content collections.
//!
//! Ordering is always metric DESC with created_at DESC as the tie-break,
//! expressed in SQL so the result is total and reproducible across runs.

use crate::content::ContentKind;
use sea_orm::{DatabaseConnection, DbBackend, DbErr, FromQueryResult, Statement};
use serde::Serialize;

/// Fallback when the caller supplies no limit, or one that does not parse.
pub const DEFAULT_TOP_LIMIT: i64 = 5;

/// The metric a ranked listing orders by.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RankMetric {
    Likes,
    Views,
    Comments,
}

/// One row of a ranked listing.
#[derive(Debug, Serialize, FromQueryResult)]
pub struct RankedItem {
    pub id: i32,
    pub title: String,
    pub metric: i64,
    pub created_at: chrono::NaiveDateTime,
}

/// Parse a caller-supplied limit. Absent, unparsable, or non-positive input
/// falls back to `default` rather than erroring.
pub fn parse_limit(raw: Option<&str>, default: i64) -> i64 {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(default)
}

fn source_for(kind: ContentKind) -> Option<(&'static str, &'static str)> {
    // (table, title column)
    Some(match kind {
        ContentKind::Video => ("videos", "title"),
        ContentKind::Post => ("posts", "title"),
        ContentKind::Event => ("events", "title"),
        ContentKind::Team => ("team_members", "name"),
        ContentKind::History => ("history_entries", "title"),
        ContentKind::Moment => ("moments", "title"),
        ContentKind::Comment | ContentKind::Reply => return None,
    })
}

fn metric_expr(kind: ContentKind, metric: RankMetric) -> Option<String> {
    match metric {
        RankMetric::Likes => Some(format!(
            "(SELECT COUNT(*) FROM likes l \
             WHERE l.target_kind = '{kind}' AND l.target_id = t.id)::bigint",
            kind = kind.label()
        )),
        RankMetric::Views => {
            if !kind.has_view_counter() {
                return None;
            }
            Some("t.view_count::bigint".to_string())
        }
        RankMetric::Comments => {
            if !kind.supports_comments() {
                return None;
            }
            Some(format!(
                "((SELECT COUNT(*) FROM comments c \
                  WHERE c.target_kind = '{kind}' AND c.target_id = t.id) \
                + (SELECT COUNT(*) FROM replies r \
                   JOIN comments pc ON pc.id = r.comment_id \
                   WHERE pc.target_kind = '{kind}' AND pc.target_id = t.id))::bigint",
                kind = kind.label()
            ))
        }
    }
}

/// Top `limit` rows of one kind ordered by `metric`.
///
/// Kinds that do not carry the requested metric yield an empty listing
/// rather than an error.
pub async fn top_for_kind(
    db: &DatabaseConnection,
    kind: ContentKind,
    metric: RankMetric,
    limit: i64,
) -> Result<Vec<RankedItem>, DbErr> {
    let (table, title_col) = match source_for(kind) {
        Some(source) => source,
        None => return Ok(Vec::new()),
    };
    let metric_sql = match metric_expr(kind, metric) {
        Some(expr) => expr,
        None => return Ok(Vec::new()),
    };

    let sql = format!(
        "SELECT t.id, t.{title_col} AS title, t.created_at, {metric_sql} AS metric \
         FROM {table} t \
         ORDER BY metric DESC, t.created_at DESC \
         LIMIT $1"
    );

    let stmt = Statement::from_sql_and_values(DbBackend::Postgres, &sql, vec![limit.into()]);
    RankedItem::find_by_statement(stmt).all(db).await
}

/// Top `limit` videos within one category, ordered by `metric`.
pub async fn top_videos_in_category(
    db: &DatabaseConnection,
    category_id: i32,
    metric: RankMetric,
    limit: i64,
) -> Result<Vec<RankedItem>, DbErr> {
    let metric_sql = match metric_expr(ContentKind::Video, metric) {
        Some(expr) => expr,
        None => return Ok(Vec::new()),
    };

    let sql = format!(
        "SELECT t.id, t.title AS title, t.created_at, {metric_sql} AS metric \
         FROM videos t \
         WHERE t.category_id = $1 \
         ORDER BY metric DESC, t.created_at DESC \
         LIMIT $2"
    );

    let stmt = Statement::from_sql_and_values(
        DbBackend::Postgres,
        &sql,
        vec![category_id.into(), limit.into()],
    );
    RankedItem::find_by_statement(stmt).all(db).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_limit_absent_uses_default() {
        assert_eq!(parse_limit(None, 5), 5);
    }

    #[test]
    fn test_parse_limit_unparsable_uses_default() {
        assert_eq!(parse_limit(Some("abc"), 5), 5);
        assert_eq!(parse_limit(Some(""), 5), 5);
        assert_eq!(parse_limit(Some("3.5"), 5), 5);
    }

    #[test]
    fn test_parse_limit_non_positive_uses_default() {
        assert_eq!(parse_limit(Some("0"), 5), 5);
        assert_eq!(parse_limit(Some("-2"), 5), 5);
    }

    #[test]
    fn test_parse_limit_valid() {
        assert_eq!(parse_limit(Some("12"), 5), 12);
        assert_eq!(parse_limit(Some(" 7 "), 5), 7);
    }

    #[test]
    fn test_metrics_unavailable_for_kind() {
        assert!(metric_expr(ContentKind::Team, RankMetric::Views).is_none());
        assert!(metric_expr(ContentKind::Comment, RankMetric::Comments).is_none());
        assert!(metric_expr(ContentKind::Team, RankMetric::Likes).is_some());
    }
}
