use crate::core::AppError;
use crate::db::access::Viewer;
use crate::models::follows::{FollowStatus, FollowedProfile};
use sqlx::PgPool;
use uuid::Uuid;

/// Creates the follow edge if it does not exist. Duplicate requests are
/// idempotent no-ops; the counters only move when a row was actually
/// inserted. Callers hand in a loaded `Viewer`, so banned accounts are
/// rejected before this runs.
pub async fn follow(
    pool: &PgPool,
    viewer: &Viewer,
    following_id: Uuid,
) -> Result<FollowStatus, AppError> {
    if viewer.id == following_id {
        return Err(AppError::invalid_operation("You cannot follow yourself"));
    }

    let mut tx = pool.begin().await.map_err(AppError::db_error)?;

    let target_exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM profiles WHERE id = $1)")
        .bind(following_id)
        .fetch_one(tx.as_mut())
        .await
        .map_err(AppError::db_error)?;

    if !target_exists {
        return Err(AppError::not_found("Profile not found"));
    }

    let inserted = sqlx::query(
        r#"
        INSERT INTO follows (follower_id, following_id)
        VALUES ($1, $2)
        ON CONFLICT (follower_id, following_id) DO NOTHING
        "#,
    )
    .bind(viewer.id)
    .bind(following_id)
    .execute(tx.as_mut())
    .await
    .map_err(AppError::db_error)?
    .rows_affected();

    if inserted == 1 {
        sqlx::query(
            "UPDATE profiles SET following_count = following_count + 1, updated_at = now() WHERE id = $1",
        )
        .bind(viewer.id)
        .execute(tx.as_mut())
        .await
        .map_err(AppError::db_error)?;

        sqlx::query(
            "UPDATE profiles SET followers_count = followers_count + 1, updated_at = now() WHERE id = $1",
        )
        .bind(following_id)
        .execute(tx.as_mut())
        .await
        .map_err(AppError::db_error)?;
    }

    let followers_count: i32 = sqlx::query_scalar("SELECT followers_count FROM profiles WHERE id = $1")
        .bind(following_id)
        .fetch_one(tx.as_mut())
        .await
        .map_err(AppError::db_error)?;

    tx.commit().await.map_err(AppError::db_error)?;

    Ok(FollowStatus {
        is_following: true,
        followers_count,
    })
}

/// Removes the edge if present; decrements floor at zero.
pub async fn unfollow(
    pool: &PgPool,
    viewer: &Viewer,
    following_id: Uuid,
) -> Result<FollowStatus, AppError> {
    if viewer.id == following_id {
        return Err(AppError::invalid_operation("You cannot unfollow yourself"));
    }

    let mut tx = pool.begin().await.map_err(AppError::db_error)?;

    let deleted = sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND following_id = $2")
        .bind(viewer.id)
        .bind(following_id)
        .execute(tx.as_mut())
        .await
        .map_err(AppError::db_error)?
        .rows_affected();

    if deleted == 1 {
        sqlx::query(
            r#"
            UPDATE profiles
            SET following_count = GREATEST(following_count - 1, 0), updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(viewer.id)
        .execute(tx.as_mut())
        .await
        .map_err(AppError::db_error)?;

        sqlx::query(
            r#"
            UPDATE profiles
            SET followers_count = GREATEST(followers_count - 1, 0), updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(following_id)
        .execute(tx.as_mut())
        .await
        .map_err(AppError::db_error)?;
    }

    let followers_count: i32 = sqlx::query_scalar("SELECT followers_count FROM profiles WHERE id = $1")
        .bind(following_id)
        .fetch_optional(tx.as_mut())
        .await
        .map_err(AppError::db_error)?
        .unwrap_or(0);

    tx.commit().await.map_err(AppError::db_error)?;

    Ok(FollowStatus {
        is_following: false,
        followers_count,
    })
}

pub async fn get_follow_status(
    pool: &PgPool,
    viewer: &Viewer,
    following_id: Uuid,
) -> Result<FollowStatus, AppError> {
    let is_following: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM follows WHERE follower_id = $1 AND following_id = $2)",
    )
    .bind(viewer.id)
    .bind(following_id)
    .fetch_one(pool)
    .await
    .map_err(AppError::db_error)?;

    let followers_count: i32 = sqlx::query_scalar("SELECT followers_count FROM profiles WHERE id = $1")
        .bind(following_id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::db_error)?
        .ok_or_else(|| AppError::not_found("Profile not found"))?;

    Ok(FollowStatus {
        is_following,
        followers_count,
    })
}

pub async fn get_followed_profiles(
    pool: &PgPool,
    viewer: &Viewer,
) -> Result<Vec<FollowedProfile>, AppError> {
    sqlx::query_as::<_, FollowedProfile>(
        r#"
        SELECT f.following_id, p.name AS following_name, f.created_at AS followed_at
        FROM follows f
        JOIN profiles p ON f.following_id = p.id
        WHERE f.follower_id = $1
        ORDER BY f.created_at DESC
        "#,
    )
    .bind(viewer.id)
    .fetch_all(pool)
    .await
    .map_err(AppError::db_error)
}
