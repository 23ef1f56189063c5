/// Search functionality
///
/// Case-insensitive substring search over posts and videos, newest first.
use crate::db::get_db_pool;
use crate::middleware::ClientCtx;
use actix_web::{error, get, web, Error, HttpRequest, HttpResponse};
use sea_orm::{DatabaseConnection, DbBackend, FromQueryResult, Statement};
use serde::{Deserialize, Serialize};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(search_results);
}

#[derive(Debug, Serialize, FromQueryResult)]
struct PostSearchResult {
    id: i32,
    title: String,
    created_at: chrono::NaiveDateTime,
}

#[derive(Debug, Serialize, FromQueryResult)]
struct VideoSearchResult {
    id: i32,
    title: String,
    created_at: chrono::NaiveDateTime,
}

#[derive(Serialize)]
struct SearchResponse {
    query: String,
    posts: Vec<PostSearchResult>,
    videos: Vec<VideoSearchResult>,
    total_count: usize,
}

#[derive(Deserialize)]
struct SearchQuery {
    q: Option<String>,
}

/// GET /search?q=query
#[get("/search")]
async fn search_results(
    req: HttpRequest,
    client: ClientCtx,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse, Error> {
    // Prefer user id for rate limiting, fall back to IP
    let rate_limit_id = client
        .get_id()
        .map(|id: i32| id.to_string())
        .unwrap_or_else(|| {
            crate::ip::extract_client_ip(&req).unwrap_or_else(|| "unknown".to_string())
        });

    if let Err(e) = crate::rate_limit::check_search_rate_limit(&rate_limit_id) {
        log::warn!("Search rate limit exceeded for: {}", rate_limit_id);
        return Err(error::ErrorTooManyRequests(format!(
            "Too many search requests. Please try again in {} seconds.",
            e.retry_after_seconds
        )));
    }

    let search_query = match &query.q {
        Some(q) if !q.trim().is_empty() => q.trim().to_string(),
        _ => {
            return Ok(HttpResponse::Ok().json(SearchResponse {
                query: String::new(),
                posts: Vec::new(),
                videos: Vec::new(),
                total_count: 0,
            }));
        }
    };

    let db = get_db_pool();
    let posts = search_posts(db, &search_query).await?;
    let videos = search_videos(db, &search_query).await?;
    let total_count = posts.len() + videos.len();

    Ok(HttpResponse::Ok().json(SearchResponse {
        query: search_query,
        posts,
        videos,
        total_count,
    }))
}

fn like_pattern(query: &str) -> String {
    // Escape LIKE metacharacters so user input matches literally
    let escaped = query.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
    format!("%{}%", escaped)
}

/// Search posts by title or body
async fn search_posts(
    db: &DatabaseConnection,
    query: &str,
) -> Result<Vec<PostSearchResult>, Error> {
    let sql = r#"
        SELECT p.id, p.title, p.created_at
        FROM posts p
        WHERE p.title ILIKE $1 OR p.body ILIKE $1
        ORDER BY p.created_at DESC
        LIMIT 50
    "#;

    let stmt = Statement::from_sql_and_values(
        DbBackend::Postgres,
        sql,
        vec![like_pattern(query).into()],
    );

    PostSearchResult::find_by_statement(stmt)
        .all(db)
        .await
        .map_err(|e| {
            log::error!("Post search error: {}", e);
            error::ErrorInternalServerError("Search failed")
        })
}

/// Search videos by title or description
async fn search_videos(
    db: &DatabaseConnection,
    query: &str,
) -> Result<Vec<VideoSearchResult>, Error> {
    let sql = r#"
        SELECT v.id, v.title, v.created_at
        FROM videos v
        WHERE v.title ILIKE $1 OR v.description ILIKE $1
        ORDER BY v.created_at DESC
        LIMIT 50
    "#;

    let stmt = Statement::from_sql_and_values(
        DbBackend::Postgres,
        sql,
        vec![like_pattern(query).into()],
    );

    VideoSearchResult::find_by_statement(stmt)
        .all(db)
        .await
        .map_err(|e| {
            log::error!("Video search error: {}", e);
            error::ErrorInternalServerError("Search failed")
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("plain"), "%plain%");
        assert_eq!(like_pattern("50%"), "%50\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
    }
}
