use crate::core::AppError;
use crate::db::access::{visible_resource, Viewer};
use crate::db::points::{award, UPLOAD_POINTS};
use crate::models::points::PointAction;
use crate::models::resources::{
    CreateResourceMeta, Resource, ResourceFilters, ResourceWithUploader,
};
use crate::core::storage::StoredFile;
use crate::models::points::PointLogEntry;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

/// Inserts the resource row and awards the uploader in one transaction.
/// The uploader's college is pinned on the row at insert time so later
/// profile edits do not retroactively change who can see it.
pub async fn create_resource(
    pool: &PgPool,
    viewer: &Viewer,
    meta: CreateResourceMeta,
    stored: StoredFile,
) -> Result<(Resource, PointLogEntry), AppError> {
    let resource_type = meta
        .resource_type
        .ok_or_else(|| AppError::invalid_operation("A resource type is required"))?;

    let mut tx = pool.begin().await.map_err(AppError::db_error)?;

    let resource = sqlx::query_as::<_, Resource>(
        r#"
        INSERT INTO resources (
            title, description, subject_name, semester, branch_or_department,
            academic_year_or_batch, resource_type, privacy_level, tags,
            file_path, file_name, file_size, mime_type,
            uploaded_by, uploader_college
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
        RETURNING *
        "#,
    )
    .bind(&meta.title)
    .bind(meta.description.as_deref())
    .bind(&meta.subject_name)
    .bind(&meta.semester)
    .bind(&meta.branch_or_department)
    .bind(meta.academic_year_or_batch.as_deref())
    .bind(resource_type)
    .bind(meta.privacy_level)
    .bind(&meta.tags)
    .bind(&stored.file_path)
    .bind(&stored.file_name)
    .bind(stored.file_size)
    .bind(&stored.mime_type)
    .bind(viewer.id)
    .bind(&viewer.college_name)
    .fetch_one(tx.as_mut())
    .await
    .map_err(AppError::db_error)?;

    let entry = award(
        &mut tx,
        viewer.id,
        PointAction::Upload,
        UPLOAD_POINTS,
        Some(resource.id),
        None,
    )
    .await?;

    tx.commit().await.map_err(AppError::db_error)?;

    Ok((resource, entry))
}

pub async fn get_resource(
    pool: &PgPool,
    viewer: &Viewer,
    resource_id: Uuid,
) -> Result<ResourceWithUploader, AppError> {
    visible_resource(pool, viewer, resource_id).await?;

    sqlx::query_as::<_, ResourceWithUploader>(
        r#"
        SELECT r.*, p.name AS uploader_name
        FROM resources r
        JOIN profiles p ON r.uploaded_by = p.id
        WHERE r.id = $1
        "#,
    )
    .bind(resource_id)
    .fetch_optional(pool)
    .await
    .map_err(AppError::db_error)?
    .ok_or_else(|| AppError::not_found("Resource not found or access denied"))
}

fn push_visibility_predicate<'a>(builder: &mut QueryBuilder<'a, Postgres>, viewer: &'a Viewer) {
    builder.push(" AND r.is_deleted = FALSE AND (r.privacy_level = 'Public' OR r.uploaded_by = ");
    builder.push_bind(viewer.id);
    builder.push(" OR r.uploader_college = ");
    builder.push_bind(&viewer.college_name);
    builder.push(")");
}

fn push_filters<'a>(builder: &mut QueryBuilder<'a, Postgres>, filters: &'a ResourceFilters) {
    if let Some(subject) = &filters.subject {
        builder.push(" AND r.subject_name = ");
        builder.push_bind(subject);
    }
    if let Some(semester) = &filters.semester {
        builder.push(" AND r.semester = ");
        builder.push_bind(semester);
    }
    if let Some(resource_type) = filters.resource_type {
        builder.push(" AND r.resource_type = ");
        builder.push_bind(resource_type);
    }
    if let Some(search) = &filters.search {
        builder.push(" AND (r.title ILIKE ");
        builder.push_bind(format!("%{}%", search));
        builder.push(" OR r.description ILIKE ");
        builder.push_bind(format!("%{}%", search));
        builder.push(")");
    }
}

/// Filtered, sorted, paginated listing. The visibility predicate runs in
/// SQL so private rows from other colleges never leave the database.
pub async fn list_resources(
    pool: &PgPool,
    viewer: &Viewer,
    filters: &ResourceFilters,
    limit: i64,
    offset: i64,
) -> Result<(Vec<ResourceWithUploader>, i64), AppError> {
    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
        "SELECT r.*, p.name AS uploader_name FROM resources r \
         JOIN profiles p ON r.uploaded_by = p.id WHERE 1 = 1",
    );
    push_visibility_predicate(&mut builder, viewer);
    push_filters(&mut builder, filters);

    builder.push(" ORDER BY ");
    builder.push(filters.sort_by.order_by_column());
    builder.push(" DESC LIMIT ");
    builder.push_bind(limit);
    builder.push(" OFFSET ");
    builder.push_bind(offset);

    let resources = builder
        .build_query_as::<ResourceWithUploader>()
        .fetch_all(pool)
        .await
        .map_err(AppError::db_error)?;

    let mut count_builder: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT COUNT(*) FROM resources r WHERE 1 = 1");
    push_visibility_predicate(&mut count_builder, viewer);
    push_filters(&mut count_builder, filters);

    let total: i64 = count_builder
        .build_query_scalar()
        .fetch_one(pool)
        .await
        .map_err(AppError::db_error)?;

    Ok((resources, total))
}

pub async fn list_resources_by_uploader(
    pool: &PgPool,
    viewer: &Viewer,
    uploader_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<(Vec<ResourceWithUploader>, i64), AppError> {
    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
        "SELECT r.*, p.name AS uploader_name FROM resources r \
         JOIN profiles p ON r.uploaded_by = p.id WHERE r.uploaded_by = ",
    );
    builder.push_bind(uploader_id);
    push_visibility_predicate(&mut builder, viewer);
    builder.push(" ORDER BY r.created_at DESC LIMIT ");
    builder.push_bind(limit);
    builder.push(" OFFSET ");
    builder.push_bind(offset);

    let resources = builder
        .build_query_as::<ResourceWithUploader>()
        .fetch_all(pool)
        .await
        .map_err(AppError::db_error)?;

    let mut count_builder: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT COUNT(*) FROM resources r WHERE r.uploaded_by = ");
    count_builder.push_bind(uploader_id);
    push_visibility_predicate(&mut count_builder, viewer);

    let total: i64 = count_builder
        .build_query_scalar()
        .fetch_one(pool)
        .await
        .map_err(AppError::db_error)?;

    Ok((resources, total))
}

/// Soft delete. The row and its event history stay; the resource simply
/// stops being visible.
pub async fn soft_delete_resource(
    pool: &PgPool,
    viewer: &Viewer,
    resource_id: Uuid,
    is_moderator: bool,
) -> Result<Resource, AppError> {
    let resource = sqlx::query_as::<_, Resource>(
        "SELECT * FROM resources WHERE id = $1 AND is_deleted = FALSE",
    )
    .bind(resource_id)
    .fetch_optional(pool)
    .await
    .map_err(AppError::db_error)?
    .ok_or_else(|| AppError::not_found("Resource not found"))?;

    if resource.uploaded_by != viewer.id && !is_moderator {
        return Err(AppError::forbidden_error(
            "You cannot delete another user's resource",
        ));
    }

    sqlx::query_as::<_, Resource>(
        "UPDATE resources SET is_deleted = TRUE, updated_at = now() WHERE id = $1 RETURNING *",
    )
    .bind(resource_id)
    .fetch_one(pool)
    .await
    .map_err(AppError::db_error)
}

/// Personal feed: newest visible resources from uploaders the viewer
/// follows.
pub async fn compose_feed(
    pool: &PgPool,
    viewer: &Viewer,
    limit: i64,
) -> Result<Vec<ResourceWithUploader>, AppError> {
    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
        "SELECT r.*, p.name AS uploader_name FROM resources r \
         JOIN profiles p ON r.uploaded_by = p.id \
         JOIN follows f ON f.following_id = r.uploaded_by WHERE f.follower_id = ",
    );
    builder.push_bind(viewer.id);
    push_visibility_predicate(&mut builder, viewer);
    builder.push(" ORDER BY r.created_at DESC LIMIT ");
    builder.push_bind(limit);

    builder
        .build_query_as::<ResourceWithUploader>()
        .fetch_all(pool)
        .await
        .map_err(AppError::db_error)
}

/// Trending is computed over public resources only, so one ranking can
/// be cached and served to every viewer.
pub async fn compose_trending(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<ResourceWithUploader>, AppError> {
    sqlx::query_as::<_, ResourceWithUploader>(
        r#"
        SELECT r.*, p.name AS uploader_name
        FROM resources r
        JOIN profiles p ON r.uploaded_by = p.id
        WHERE r.is_deleted = FALSE
          AND r.privacy_level = 'Public'
        ORDER BY r.download_count DESC, r.average_rating DESC, r.created_at DESC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await
    .map_err(AppError::db_error)
}
