use actix_web::{get, patch, post, put, web, HttpResponse, Responder};
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    core::{jwt_auth::JwtMiddleware, AppError, AppSuccessResponse},
    db::{access, points, profiles, resources},
    models::pagination::{PaginationMeta, PaginationQuery},
    models::profiles::{SyncProfileRequest, UpdateProfileRequest},
};

#[derive(Debug, serde::Deserialize)]
pub struct BanRequest {
    pub banned: bool,
}

#[instrument(name = "Sync Profile", skip(pool, auth, request))]
#[post("/sync")]
pub async fn sync_profile(
    pool: web::Data<PgPool>,
    auth: JwtMiddleware,
    request: web::Json<SyncProfileRequest>,
) -> Result<impl Responder, AppError> {
    let profile = profiles::sync_profile(
        &pool,
        auth.user_id,
        &auth.claims.email,
        request.into_inner(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        data: profile,
        message: "Profile synced successfully".to_string(),
        pagination: None,
    }))
}

#[instrument(name = "Get My Profile", skip(pool, auth))]
#[get("/me")]
pub async fn get_my_profile(
    pool: web::Data<PgPool>,
    auth: JwtMiddleware,
) -> Result<impl Responder, AppError> {
    let profile = profiles::get_profile(&pool, auth.user_id).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        data: profile,
        message: "Profile retrieved successfully".to_string(),
        pagination: None,
    }))
}

#[instrument(name = "Update My Profile", skip(pool, auth, request))]
#[put("/me")]
pub async fn update_my_profile(
    pool: web::Data<PgPool>,
    auth: JwtMiddleware,
    request: web::Json<UpdateProfileRequest>,
) -> Result<impl Responder, AppError> {
    let profile = profiles::update_profile(&pool, auth.user_id, request.into_inner()).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        data: profile,
        message: "Profile updated successfully".to_string(),
        pagination: None,
    }))
}

#[instrument(name = "Get Profile", skip(pool, _auth))]
#[get("/{profile_id}")]
pub async fn get_profile(
    pool: web::Data<PgPool>,
    _auth: JwtMiddleware,
    path: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let profile = profiles::get_profile(&pool, path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        data: profile,
        message: "Profile retrieved successfully".to_string(),
        pagination: None,
    }))
}

#[instrument(name = "Get Profile Resources", skip(pool, auth))]
#[get("/{profile_id}/resources")]
pub async fn get_profile_resources(
    pool: web::Data<PgPool>,
    auth: JwtMiddleware,
    path: web::Path<Uuid>,
    mut pagination: web::Query<PaginationQuery>,
) -> Result<impl Responder, AppError> {
    let viewer = access::load_viewer(&pool, auth.user_id).await?;
    pagination.validate();

    let (items, total) = resources::list_resources_by_uploader(
        &pool,
        &viewer,
        path.into_inner(),
        pagination.per_page,
        pagination.offset(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        data: items,
        message: "Resources retrieved successfully".to_string(),
        pagination: Some(PaginationMeta::new(
            pagination.page,
            pagination.per_page,
            total,
        )),
    }))
}

#[instrument(name = "Set Ban Status", skip(pool, auth, request))]
#[patch("/{profile_id}/ban")]
pub async fn set_ban_status(
    pool: web::Data<PgPool>,
    auth: JwtMiddleware,
    path: web::Path<Uuid>,
    request: web::Json<BanRequest>,
) -> Result<impl Responder, AppError> {
    if !auth.claims.is_moderator() {
        return Err(AppError::forbidden_error(
            "Only moderators can change ban status",
        ));
    }

    let profile = profiles::set_banned(&pool, path.into_inner(), request.banned).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        data: profile,
        message: "Ban status updated successfully".to_string(),
        pagination: None,
    }))
}

#[instrument(name = "Recompute Profile Totals", skip(pool, auth))]
#[post("/{profile_id}/recompute")]
pub async fn recompute_profile_totals(
    pool: web::Data<PgPool>,
    auth: JwtMiddleware,
    path: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let profile_id = path.into_inner();
    if !auth.claims.is_moderator() && auth.user_id != profile_id {
        return Err(AppError::forbidden_error(
            "You cannot recompute another user's totals",
        ));
    }

    let profile = points::recompute_profile_totals(&pool, profile_id).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        data: profile,
        message: "Profile totals recomputed successfully".to_string(),
        pagination: None,
    }))
}
