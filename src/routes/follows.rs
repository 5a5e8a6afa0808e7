use actix_web::{delete, get, post, web, HttpResponse, Responder};
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    core::{jwt_auth::JwtMiddleware, AppError, AppSuccessResponse},
    db::{access, follows},
};

#[instrument(name = "Follow Profile", skip(pool, auth))]
#[post("/{profile_id}/follow")]
pub async fn follow_profile(
    pool: web::Data<PgPool>,
    auth: JwtMiddleware,
    path: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let viewer = access::load_viewer(&pool, auth.user_id).await?;
    let status = follows::follow(&pool, &viewer, path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        data: status,
        message: "Profile followed successfully".to_string(),
        pagination: None,
    }))
}

#[instrument(name = "Unfollow Profile", skip(pool, auth))]
#[delete("/{profile_id}/follow")]
pub async fn unfollow_profile(
    pool: web::Data<PgPool>,
    auth: JwtMiddleware,
    path: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let viewer = access::load_viewer(&pool, auth.user_id).await?;
    let status = follows::unfollow(&pool, &viewer, path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        data: status,
        message: "Profile unfollowed successfully".to_string(),
        pagination: None,
    }))
}

#[instrument(name = "Check Follow Status", skip(pool, auth))]
#[get("/{profile_id}/follow-status")]
pub async fn check_follow_status(
    pool: web::Data<PgPool>,
    auth: JwtMiddleware,
    path: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let viewer = access::load_viewer(&pool, auth.user_id).await?;
    let status = follows::get_follow_status(&pool, &viewer, path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        data: status,
        message: "Follow status retrieved successfully".to_string(),
        pagination: None,
    }))
}

#[instrument(name = "Get My Follows", skip(pool, auth))]
#[get("/my-follows")]
pub async fn get_my_follows(
    pool: web::Data<PgPool>,
    auth: JwtMiddleware,
) -> Result<impl Responder, AppError> {
    let viewer = access::load_viewer(&pool, auth.user_id).await?;
    let followed = follows::get_followed_profiles(&pool, &viewer).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        data: followed,
        message: "Followed profiles retrieved successfully".to_string(),
        pagination: None,
    }))
}
