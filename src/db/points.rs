use crate::core::AppError;
use crate::models::points::{PointAction, PointLogEntry};
use crate::models::profiles::Profile;
use crate::models::resources::Resource;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

pub const UPLOAD_POINTS: i32 = 10;
pub const RATING_POINTS: i32 = 5;
pub const DOWNLOAD_POINTS: i32 = 2;
pub const COMMENT_POINTS: i32 = 1;

/// Appends a ledger entry and moves the cached counters in the same
/// transaction. The increments are expressed in SQL so concurrent awards
/// against one profile never lose an update.
pub async fn award(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    action: PointAction,
    points: i32,
    resource_id: Option<Uuid>,
    triggered_by: Option<Uuid>,
) -> Result<PointLogEntry, AppError> {
    let entry = sqlx::query_as::<_, PointLogEntry>(
        r#"
        INSERT INTO point_logs (user_id, action, points, resource_id, triggered_by)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, user_id, action, points, resource_id, triggered_by, created_at
        "#,
    )
    .bind(user_id)
    .bind(action)
    .bind(points)
    .bind(resource_id)
    .bind(triggered_by)
    .fetch_one(tx.as_mut())
    .await
    .map_err(AppError::db_error)?;

    sqlx::query(
        "UPDATE profiles SET total_points = total_points + $1, updated_at = now() WHERE id = $2",
    )
    .bind(points)
    .bind(user_id)
    .execute(tx.as_mut())
    .await
    .map_err(AppError::db_error)?;

    if let Some(resource_id) = resource_id {
        if action != PointAction::CreditDeduction {
            sqlx::query(
                "UPDATE resources SET total_points_earned = total_points_earned + $1 WHERE id = $2",
            )
            .bind(points)
            .bind(resource_id)
            .execute(tx.as_mut())
            .await
            .map_err(AppError::db_error)?;
        }
    }

    Ok(entry)
}

/// Standalone award for callers outside an existing transaction (the
/// admin adjustment endpoint).
pub async fn award_with_pool(
    pool: &PgPool,
    user_id: Uuid,
    action: PointAction,
    points: i32,
    resource_id: Option<Uuid>,
    triggered_by: Option<Uuid>,
) -> Result<PointLogEntry, AppError> {
    let mut tx = pool.begin().await.map_err(AppError::db_error)?;
    let entry = award(&mut tx, user_id, action, points, resource_id, triggered_by).await?;
    tx.commit().await.map_err(AppError::db_error)?;
    Ok(entry)
}

/// Repair path: rewrites every cached profile counter from the event
/// tables. Idempotent; safe to run at any time.
pub async fn recompute_profile_totals(pool: &PgPool, user_id: Uuid) -> Result<Profile, AppError> {
    sqlx::query_as::<_, Profile>(
        r#"
        UPDATE profiles SET
            total_points = COALESCE(
                (SELECT SUM(points) FROM point_logs WHERE user_id = profiles.id), 0),
            followers_count = (SELECT COUNT(*) FROM follows WHERE following_id = profiles.id),
            following_count = (SELECT COUNT(*) FROM follows WHERE follower_id = profiles.id),
            updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .map_err(AppError::db_error)?
    .ok_or_else(|| AppError::not_found("Profile not found"))
}

/// Repair path for resource aggregates: the event tables are the source
/// of truth, the columns on `resources` are a cache.
pub async fn recompute_resource_aggregates(
    pool: &PgPool,
    resource_id: Uuid,
) -> Result<Resource, AppError> {
    sqlx::query_as::<_, Resource>(
        r#"
        UPDATE resources SET
            average_rating = COALESCE(
                (SELECT AVG(rating)::float8 FROM reviews WHERE resource_id = resources.id), 0),
            total_ratings = (SELECT COUNT(*) FROM reviews WHERE resource_id = resources.id),
            total_comments = (SELECT COUNT(*) FROM comments
                              WHERE resource_id = resources.id AND is_deleted = FALSE),
            download_count = (SELECT COUNT(*) FROM downloads WHERE resource_id = resources.id),
            total_points_earned = COALESCE(
                (SELECT SUM(points) FROM point_logs
                 WHERE resource_id = resources.id AND action <> 'credit_deduction'), 0),
            updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(resource_id)
    .fetch_optional(pool)
    .await
    .map_err(AppError::db_error)?
    .ok_or_else(|| AppError::not_found("Resource not found"))
}

pub async fn get_user_point_history(
    pool: &PgPool,
    user_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<PointLogEntry>, AppError> {
    sqlx::query_as::<_, PointLogEntry>(
        r#"
        SELECT id, user_id, action, points, resource_id, triggered_by, created_at
        FROM point_logs
        WHERE user_id = $1
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
    .map_err(AppError::db_error)
}

pub async fn count_user_point_entries(pool: &PgPool, user_id: Uuid) -> Result<i64, AppError> {
    sqlx::query_scalar("SELECT COUNT(*) FROM point_logs WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .map_err(AppError::db_error)
}
