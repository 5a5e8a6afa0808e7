use actix_web::{delete, get, post, web, HttpResponse, Responder};
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    core::{jwt_auth::JwtMiddleware, AppError, AppSuccessResponse},
    db::{access, comments},
    models::comments::AddCommentRequest,
};

#[instrument(name = "Add Comment", skip(pool, auth, request))]
#[post("/{resource_id}/comments")]
pub async fn add_comment(
    pool: web::Data<PgPool>,
    auth: JwtMiddleware,
    path: web::Path<Uuid>,
    request: web::Json<AddCommentRequest>,
) -> Result<impl Responder, AppError> {
    let viewer = access::load_viewer(&pool, auth.user_id).await?;
    let comment =
        comments::add_comment(&pool, &viewer, path.into_inner(), request.into_inner()).await?;

    Ok(HttpResponse::Created().json(AppSuccessResponse {
        success: true,
        data: comment,
        message: "Comment added successfully".to_string(),
        pagination: None,
    }))
}

#[instrument(name = "Get Comment Tree", skip(pool, auth))]
#[get("/{resource_id}/comments")]
pub async fn get_comment_tree(
    pool: web::Data<PgPool>,
    auth: JwtMiddleware,
    path: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let viewer = access::load_viewer(&pool, auth.user_id).await?;
    let forest = comments::get_comment_tree(&pool, &viewer, path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        data: forest,
        message: "Comments retrieved successfully".to_string(),
        pagination: None,
    }))
}

#[instrument(name = "Delete Comment", skip(pool, auth))]
#[delete("/comments/{comment_id}")]
pub async fn delete_comment(
    pool: web::Data<PgPool>,
    auth: JwtMiddleware,
    path: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let viewer = access::load_viewer(&pool, auth.user_id).await?;
    comments::delete_comment(
        &pool,
        &viewer,
        path.into_inner(),
        auth.claims.is_moderator(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        data: serde_json::json!({"message": "Comment deleted successfully"}),
        message: "Comment deleted successfully".to_string(),
        pagination: None,
    }))
}
