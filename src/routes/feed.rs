use actix_web::{get, web, HttpResponse, Responder};
use sqlx::PgPool;
use std::time::Duration;
use tracing::instrument;

use crate::{
    core::{jwt_auth::JwtMiddleware, AppError, AppSuccessResponse, RedisHelper},
    db::{access, resources},
    models::resources::{FeedQuery, ResourceWithUploader},
};

const TRENDING_CACHE_KEY: &str = "study_vault:trending";
const TRENDING_CACHE_TTL: Duration = Duration::from_secs(300);
const DEFAULT_FEED_LIMIT: i64 = 20;
const MAX_FEED_LIMIT: i64 = 100;

fn clamp_limit(requested: Option<i64>) -> i64 {
    match requested {
        Some(limit) if limit >= 1 && limit <= MAX_FEED_LIMIT => limit,
        _ => DEFAULT_FEED_LIMIT,
    }
}

#[instrument(name = "Get Personal Feed", skip(pool, auth))]
#[get("/feed")]
pub async fn get_personal_feed(
    pool: web::Data<PgPool>,
    auth: JwtMiddleware,
    query: web::Query<FeedQuery>,
) -> Result<impl Responder, AppError> {
    let viewer = access::load_viewer(&pool, auth.user_id).await?;
    let items = resources::compose_feed(&pool, &viewer, clamp_limit(query.limit)).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        data: items,
        message: "Feed retrieved successfully".to_string(),
        pagination: None,
    }))
}

/// Trending is public-only and identical for every viewer, so it is
/// served from a short-lived Redis cache. A cache failure falls back to
/// the database rather than failing the request.
#[instrument(name = "Get Trending Resources", skip(pool, redis, auth))]
#[get("/trending")]
pub async fn get_trending_resources(
    pool: web::Data<PgPool>,
    redis: web::Data<RedisHelper>,
    auth: JwtMiddleware,
    query: web::Query<FeedQuery>,
) -> Result<impl Responder, AppError> {
    access::load_viewer(&pool, auth.user_id).await?;

    let limit = clamp_limit(query.limit);
    let cache_key = format!("{}:{}", TRENDING_CACHE_KEY, limit);

    if let Ok(cached) = redis.get::<Vec<ResourceWithUploader>>(&cache_key).await {
        return Ok(HttpResponse::Ok().json(AppSuccessResponse {
            success: true,
            data: cached,
            message: "Trending resources retrieved successfully".to_string(),
            pagination: None,
        }));
    }

    let items = resources::compose_trending(&pool, limit).await?;

    if let Err(e) = redis.set(&cache_key, &items, Some(TRENDING_CACHE_TTL)).await {
        tracing::warn!("Failed to cache trending resources: {}", e);
    }

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        data: items,
        message: "Trending resources retrieved successfully".to_string(),
        pagination: None,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_is_clamped_to_sane_bounds() {
        assert_eq!(clamp_limit(None), 20);
        assert_eq!(clamp_limit(Some(0)), 20);
        assert_eq!(clamp_limit(Some(-5)), 20);
        assert_eq!(clamp_limit(Some(50)), 50);
        assert_eq!(clamp_limit(Some(1000)), 20);
    }
}
