use crate::core::AppError;
use crate::db::access::{visible_resource_for_update, Viewer};
use crate::db::points::{award, RATING_POINTS};
use crate::models::points::PointAction;
use crate::models::reviews::{Review, ReviewWithAuthor, SubmitReviewRequest};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

/// Upserts the viewer's review for a resource and recomputes the cached
/// rating aggregates under the resource row lock. A first review awards
/// points to the resource owner; an edit never re-awards.
pub async fn submit_review(
    pool: &PgPool,
    viewer: &Viewer,
    resource_id: Uuid,
    request: SubmitReviewRequest,
) -> Result<Review, AppError> {
    request
        .validate()
        .map_err(|_| AppError::invalid_operation("Rating must be between 1 and 5"))?;

    let mut tx = pool.begin().await.map_err(AppError::db_error)?;

    let resource = visible_resource_for_update(&mut tx, viewer, resource_id).await?;

    if resource.uploaded_by == viewer.id {
        return Err(AppError::unauthorized(
            "You cannot review your own resource",
        ));
    }

    let existing_id: Option<Uuid> =
        sqlx::query_scalar("SELECT id FROM reviews WHERE resource_id = $1 AND user_id = $2")
            .bind(resource_id)
            .bind(viewer.id)
            .fetch_optional(tx.as_mut())
            .await
            .map_err(AppError::db_error)?;

    let review = match existing_id {
        Some(review_id) => sqlx::query_as::<_, Review>(
            r#"
            UPDATE reviews
            SET rating = $1, review_text = $2, updated_at = now()
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(request.rating)
        .bind(request.review_text.as_deref())
        .bind(review_id)
        .fetch_one(tx.as_mut())
        .await
        .map_err(AppError::db_error)?,
        None => sqlx::query_as::<_, Review>(
            r#"
            INSERT INTO reviews (resource_id, user_id, rating, review_text)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(resource_id)
        .bind(viewer.id)
        .bind(request.rating)
        .bind(request.review_text.as_deref())
        .fetch_one(tx.as_mut())
        .await
        .map_err(AppError::db_error)?,
    };

    sqlx::query(
        r#"
        UPDATE resources
        SET average_rating = sub.avg_rating,
            total_ratings = sub.cnt,
            updated_at = now()
        FROM (
            SELECT COALESCE(AVG(rating)::float8, 0) AS avg_rating, COUNT(*) AS cnt
            FROM reviews
            WHERE resource_id = $1
        ) sub
        WHERE resources.id = $1
        "#,
    )
    .bind(resource_id)
    .execute(tx.as_mut())
    .await
    .map_err(AppError::db_error)?;

    if existing_id.is_none() {
        award(
            &mut tx,
            resource.uploaded_by,
            PointAction::Rating,
            RATING_POINTS,
            Some(resource_id),
            Some(viewer.id),
        )
        .await?;
    }

    tx.commit().await.map_err(AppError::db_error)?;

    Ok(review)
}

pub async fn get_reviews_for_resource(
    pool: &PgPool,
    viewer: &Viewer,
    resource_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<(Vec<ReviewWithAuthor>, i64), AppError> {
    crate::db::access::visible_resource(pool, viewer, resource_id).await?;

    let reviews = sqlx::query_as::<_, ReviewWithAuthor>(
        r#"
        SELECT rv.*, p.name AS user_name
        FROM reviews rv
        JOIN profiles p ON rv.user_id = p.id
        WHERE rv.resource_id = $1
        ORDER BY rv.created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(resource_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
    .map_err(AppError::db_error)?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reviews WHERE resource_id = $1")
        .bind(resource_id)
        .fetch_one(pool)
        .await
        .map_err(AppError::db_error)?;

    Ok((reviews, total))
}

pub async fn get_my_review(
    pool: &PgPool,
    viewer: &Viewer,
    resource_id: Uuid,
) -> Result<Option<Review>, AppError> {
    crate::db::access::visible_resource(pool, viewer, resource_id).await?;

    sqlx::query_as::<_, Review>("SELECT * FROM reviews WHERE resource_id = $1 AND user_id = $2")
        .bind(resource_id)
        .bind(viewer.id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::db_error)
}
