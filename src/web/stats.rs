//! Cross-type leaderboard and section order endpoints
//!
//! /top-stats assembles a top-liked listing per section, in the section
//! order resolved from (explicit param | persisted order | default). An
//! explicit param shapes the response for everyone, but only staff callers
//! persist it.

use crate::config::Config;
use crate::content::ContentKind;
use crate::db::get_db_pool;
use crate::engagement::ranking::{self, RankMetric, RankedItem};
use crate::middleware::ClientCtx;
use crate::sections;
use actix_web::{error, get, put, web, Error, HttpResponse};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(top_stats)
        .service(get_section_order)
        .service(put_section_order);
}

#[derive(Deserialize)]
struct TopStatsQuery {
    order: Option<String>,
    limit: Option<String>,
}

#[derive(Serialize)]
struct SectionListing {
    key: String,
    items: Vec<RankedItem>,
}

#[derive(Serialize)]
struct TopStatsResponse {
    order: Vec<String>,
    sections: Vec<SectionListing>,
}

#[derive(Serialize)]
struct SectionOrderResponse {
    order: Vec<String>,
}

#[derive(Deserialize)]
struct SectionOrderForm {
    /// key=position pairs, e.g. "event=1,video=2"
    order: String,
}

/// GET /top-stats?order=event=1,video=2&limit=N
#[get("/top-stats")]
async fn top_stats(
    client: ClientCtx,
    config: web::Data<Arc<Config>>,
    query: web::Query<TopStatsQuery>,
) -> Result<HttpResponse, Error> {
    let db = get_db_pool();
    let limit = ranking::parse_limit(query.limit.as_deref(), config.top_default_limit());

    let keys = match query.order.as_deref() {
        Some(raw) => {
            let supplied = sections::parse_order_param(raw);
            // The explicit ordering shapes this response for anyone, but
            // only staff persist it for later requests.
            if client.is_staff() {
                sections::persist_order(db, &supplied)
                    .await
                    .map_err(error::ErrorInternalServerError)?;
            }
            sections::keys_in_order(&supplied)
        }
        None => sections::effective_order(db)
            .await
            .map_err(error::ErrorInternalServerError)?,
    };

    let mut listings = Vec::with_capacity(keys.len());
    for key in &keys {
        let kind = match ContentKind::from_label(key) {
            Some(kind) => kind,
            None => continue,
        };
        let items = ranking::top_for_kind(db, kind, RankMetric::Likes, limit)
            .await
            .map_err(error::ErrorInternalServerError)?;
        listings.push(SectionListing {
            key: key.clone(),
            items,
        });
    }

    Ok(HttpResponse::Ok().json(TopStatsResponse {
        order: keys,
        sections: listings,
    }))
}

/// GET /section-order - the effective display order
#[get("/section-order")]
async fn get_section_order() -> Result<HttpResponse, Error> {
    let order = sections::effective_order(get_db_pool())
        .await
        .map_err(error::ErrorInternalServerError)?;
    Ok(HttpResponse::Ok().json(SectionOrderResponse { order }))
}

/// PUT /section-order - staff-only direct update
#[put("/section-order")]
async fn put_section_order(
    client: ClientCtx,
    form: web::Json<SectionOrderForm>,
) -> Result<HttpResponse, Error> {
    client.require_staff()?;
    let db = get_db_pool();

    let supplied = sections::parse_order_param(&form.order);
    sections::persist_order(db, &supplied)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let order = sections::effective_order(db)
        .await
        .map_err(error::ErrorInternalServerError)?;
    Ok(HttpResponse::Ok().json(SectionOrderResponse { order }))
}
