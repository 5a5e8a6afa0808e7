use crate::core::AppError;
use crate::db::access::{visible_resource_for_update, Viewer};
use crate::db::points::{award, DOWNLOAD_POINTS};
use crate::models::downloads::DownloadStats;
use crate::models::points::PointAction;
use sqlx::PgPool;
use uuid::Uuid;

/// Records a download event and bumps the counter. Only the first
/// download by a given user awards the uploader; self-downloads never
/// award anything.
pub async fn record_download(
    pool: &PgPool,
    viewer: &Viewer,
    resource_id: Uuid,
) -> Result<(), AppError> {
    let mut tx = pool.begin().await.map_err(AppError::db_error)?;

    let resource = visible_resource_for_update(&mut tx, viewer, resource_id).await?;

    let downloaded_before: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM downloads WHERE resource_id = $1 AND user_id = $2)",
    )
    .bind(resource_id)
    .bind(viewer.id)
    .fetch_one(tx.as_mut())
    .await
    .map_err(AppError::db_error)?;

    sqlx::query("INSERT INTO downloads (resource_id, user_id) VALUES ($1, $2)")
        .bind(resource_id)
        .bind(viewer.id)
        .execute(tx.as_mut())
        .await
        .map_err(AppError::db_error)?;

    sqlx::query(
        "UPDATE resources SET download_count = download_count + 1, updated_at = now() WHERE id = $1",
    )
    .bind(resource_id)
    .execute(tx.as_mut())
    .await
    .map_err(AppError::db_error)?;

    if !downloaded_before && resource.uploaded_by != viewer.id {
        award(
            &mut tx,
            resource.uploaded_by,
            PointAction::Download,
            DOWNLOAD_POINTS,
            Some(resource_id),
            Some(viewer.id),
        )
        .await?;
    }

    tx.commit().await.map_err(AppError::db_error)?;

    Ok(())
}

pub async fn get_download_stats(
    pool: &PgPool,
    resource_id: Uuid,
) -> Result<DownloadStats, AppError> {
    sqlx::query_as::<_, DownloadStats>(
        r#"
        SELECT COUNT(*) AS total_downloads, COUNT(DISTINCT user_id) AS unique_users
        FROM downloads
        WHERE resource_id = $1
        "#,
    )
    .bind(resource_id)
    .fetch_one(pool)
    .await
    .map_err(AppError::db_error)
}
