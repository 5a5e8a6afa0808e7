use crate::core::AppError;
use crate::models::profiles::{Profile, SyncProfileRequest, UpdateProfileRequest};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

/// Upserts the profile row after authentication. The identity provider
/// owns id and email; the rest comes from the request.
pub async fn sync_profile(
    pool: &PgPool,
    user_id: Uuid,
    email: &str,
    request: SyncProfileRequest,
) -> Result<Profile, AppError> {
    request.validate()?;

    sqlx::query_as::<_, Profile>(
        r#"
        INSERT INTO profiles (id, name, email, college_name, branch_or_department, current_semester_or_year)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (id) DO UPDATE SET
            name = EXCLUDED.name,
            email = EXCLUDED.email,
            college_name = EXCLUDED.college_name,
            branch_or_department = EXCLUDED.branch_or_department,
            current_semester_or_year = EXCLUDED.current_semester_or_year,
            updated_at = now()
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(&request.name)
    .bind(email)
    .bind(&request.college_name)
    .bind(&request.branch_or_department)
    .bind(&request.current_semester_or_year)
    .fetch_one(pool)
    .await
    .map_err(AppError::db_error)
}

pub async fn get_profile(pool: &PgPool, user_id: Uuid) -> Result<Profile, AppError> {
    sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::db_error)?
        .ok_or_else(|| AppError::not_found("Profile not found"))
}

/// Partial update; absent fields are left untouched. The college is
/// deliberately not editable here since resource visibility is pinned to
/// it at upload time.
pub async fn update_profile(
    pool: &PgPool,
    user_id: Uuid,
    request: UpdateProfileRequest,
) -> Result<Profile, AppError> {
    request.validate()?;

    sqlx::query_as::<_, Profile>(
        r#"
        UPDATE profiles SET
            name = COALESCE($1, name),
            branch_or_department = COALESCE($2, branch_or_department),
            current_semester_or_year = COALESCE($3, current_semester_or_year),
            bio = COALESCE($4, bio),
            profile_picture = COALESCE($5, profile_picture),
            updated_at = now()
        WHERE id = $6
        RETURNING *
        "#,
    )
    .bind(request.name.as_deref())
    .bind(request.branch_or_department.as_deref())
    .bind(request.current_semester_or_year.as_deref())
    .bind(request.bio.as_deref())
    .bind(request.profile_picture.as_deref())
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .map_err(AppError::db_error)?
    .ok_or_else(|| AppError::not_found("Profile not found"))
}

pub async fn set_banned(pool: &PgPool, user_id: Uuid, banned: bool) -> Result<Profile, AppError> {
    sqlx::query_as::<_, Profile>(
        "UPDATE profiles SET is_banned = $1, updated_at = now() WHERE id = $2 RETURNING *",
    )
    .bind(banned)
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .map_err(AppError::db_error)?
    .ok_or_else(|| AppError::not_found("Profile not found"))
}
