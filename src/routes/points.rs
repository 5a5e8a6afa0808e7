use actix_web::{get, post, web, HttpResponse, Responder};
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    core::{jwt_auth::JwtMiddleware, AppError, AppSuccessResponse},
    db::points,
    models::pagination::{PaginationMeta, PaginationQuery},
    models::points::AwardPointsRequest,
};

#[instrument(name = "Get My Point History", skip(pool, auth))]
#[get("/my-history")]
pub async fn get_my_point_history(
    pool: web::Data<PgPool>,
    auth: JwtMiddleware,
    mut pagination: web::Query<PaginationQuery>,
) -> Result<impl Responder, AppError> {
    pagination.validate();

    let entries = points::get_user_point_history(
        &pool,
        auth.user_id,
        pagination.per_page,
        pagination.offset(),
    )
    .await?;
    let total = points::count_user_point_entries(&pool, auth.user_id).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        data: entries,
        message: "Point history retrieved successfully".to_string(),
        pagination: Some(PaginationMeta::new(
            pagination.page,
            pagination.per_page,
            total,
        )),
    }))
}

/// Manual ledger adjustment. Admin only; the ledger records who
/// triggered it.
#[instrument(name = "Award Points", skip(pool, auth, request))]
#[post("/award")]
pub async fn award_points(
    pool: web::Data<PgPool>,
    auth: JwtMiddleware,
    request: web::Json<AwardPointsRequest>,
) -> Result<impl Responder, AppError> {
    if auth.claims.role != "admin" {
        return Err(AppError::forbidden_error("Only admins can award points"));
    }

    let request = request.into_inner();
    let entry = points::award_with_pool(
        &pool,
        request.user_id,
        request.action,
        request.points,
        request.resource_id,
        Some(auth.user_id),
    )
    .await?;

    Ok(HttpResponse::Created().json(AppSuccessResponse {
        success: true,
        data: entry,
        message: "Points awarded successfully".to_string(),
        pagination: None,
    }))
}

#[instrument(name = "Recompute Resource Aggregates", skip(pool, auth))]
#[post("/resources/{resource_id}/recompute")]
pub async fn recompute_resource_aggregates(
    pool: web::Data<PgPool>,
    auth: JwtMiddleware,
    path: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    if !auth.claims.is_moderator() {
        return Err(AppError::forbidden_error(
            "Only moderators can recompute aggregates",
        ));
    }

    let resource = points::recompute_resource_aggregates(&pool, path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        data: resource,
        message: "Resource aggregates recomputed successfully".to_string(),
        pagination: None,
    }))
}
