use actix_web::{get, post, web, HttpResponse, Responder};
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    core::{jwt_auth::JwtMiddleware, AppError, AppSuccessResponse},
    db::{access, reviews},
    models::pagination::{PaginationMeta, PaginationQuery},
    models::reviews::SubmitReviewRequest,
};

#[instrument(name = "Submit Review", skip(pool, auth, request))]
#[post("/{resource_id}/reviews")]
pub async fn submit_review(
    pool: web::Data<PgPool>,
    auth: JwtMiddleware,
    path: web::Path<Uuid>,
    request: web::Json<SubmitReviewRequest>,
) -> Result<impl Responder, AppError> {
    let viewer = access::load_viewer(&pool, auth.user_id).await?;
    let review =
        reviews::submit_review(&pool, &viewer, path.into_inner(), request.into_inner()).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        data: review,
        message: "Review submitted successfully".to_string(),
        pagination: None,
    }))
}

#[instrument(name = "Get Resource Reviews", skip(pool, auth))]
#[get("/{resource_id}/reviews")]
pub async fn get_resource_reviews(
    pool: web::Data<PgPool>,
    auth: JwtMiddleware,
    path: web::Path<Uuid>,
    mut pagination: web::Query<PaginationQuery>,
) -> Result<impl Responder, AppError> {
    let viewer = access::load_viewer(&pool, auth.user_id).await?;
    pagination.validate();

    let (items, total) = reviews::get_reviews_for_resource(
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
        message: "Reviews retrieved successfully".to_string(),
        pagination: Some(PaginationMeta::new(
            pagination.page,
            pagination.per_page,
            total,
        )),
    }))
}

#[instrument(name = "Get My Review", skip(pool, auth))]
#[get("/{resource_id}/reviews/mine")]
pub async fn get_my_review(
    pool: web::Data<PgPool>,
    auth: JwtMiddleware,
    path: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let viewer = access::load_viewer(&pool, auth.user_id).await?;
    let review = reviews::get_my_review(&pool, &viewer, path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        data: review,
        message: "Review retrieved successfully".to_string(),
        pagination: None,
    }))
}
