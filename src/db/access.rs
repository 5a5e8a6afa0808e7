use crate::core::AppError;
use crate::models::resources::PrivacyLevel;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

/// The viewer context every gated operation runs under. Loaded once per
/// request from the authenticated subject's profile.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Viewer {
    pub id: Uuid,
    pub college_name: String,
    pub is_banned: bool,
}

/// The minimal slice of a resource the privacy gate needs.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ResourceVisibility {
    pub id: Uuid,
    pub uploaded_by: Uuid,
    pub uploader_college: String,
    pub privacy_level: PrivacyLevel,
    pub is_deleted: bool,
}

/// Public resources are visible to any non-banned viewer. Private
/// resources are visible to the owner and to viewers whose college
/// matches the college pinned on the resource at upload time
/// (case-sensitive exact match; colleges are free text).
pub fn can_view(viewer: &Viewer, resource: &ResourceVisibility) -> bool {
    if viewer.is_banned || resource.is_deleted {
        return false;
    }

    match resource.privacy_level {
        PrivacyLevel::Public => true,
        PrivacyLevel::Private => {
            viewer.id == resource.uploaded_by
                || viewer.college_name == resource.uploader_college
        }
    }
}

impl Viewer {
    /// Banned accounts cannot read or act on anything; every loaded
    /// viewer passes through this before it reaches an engine call.
    pub fn ensure_active(self) -> Result<Self, AppError> {
        if self.is_banned {
            return Err(AppError::unauthorized("This account has been banned"));
        }
        Ok(self)
    }
}

pub async fn load_viewer(pool: &PgPool, user_id: Uuid) -> Result<Viewer, AppError> {
    sqlx::query_as::<_, Viewer>("SELECT id, college_name, is_banned FROM profiles WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::db_error)?
        .ok_or_else(|| AppError::not_found("Profile not found"))?
        .ensure_active()
}

/// Gate check on the read path. A denied viewer cannot distinguish a
/// hidden resource from a missing one.
pub async fn visible_resource(
    pool: &PgPool,
    viewer: &Viewer,
    resource_id: Uuid,
) -> Result<ResourceVisibility, AppError> {
    let resource = sqlx::query_as::<_, ResourceVisibility>(
        r#"
        SELECT id, uploaded_by, uploader_college, privacy_level, is_deleted
        FROM resources
        WHERE id = $1
        "#,
    )
    .bind(resource_id)
    .fetch_optional(pool)
    .await
    .map_err(AppError::db_error)?;

    match resource {
        Some(resource) if can_view(viewer, &resource) => Ok(resource),
        _ => Err(AppError::not_found("Resource not found or access denied")),
    }
}

/// Gate check on a write path. Locks the resource row so concurrent
/// aggregate updates against the same resource serialize.
pub async fn visible_resource_for_update(
    tx: &mut Transaction<'_, Postgres>,
    viewer: &Viewer,
    resource_id: Uuid,
) -> Result<ResourceVisibility, AppError> {
    let resource = sqlx::query_as::<_, ResourceVisibility>(
        r#"
        SELECT id, uploaded_by, uploader_college, privacy_level, is_deleted
        FROM resources
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(resource_id)
    .fetch_optional(tx.as_mut())
    .await
    .map_err(AppError::db_error)?;

    match resource {
        Some(resource) if can_view(viewer, &resource) => Ok(resource),
        _ => Err(AppError::not_found("Resource not found or access denied")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewer(college: &str) -> Viewer {
        Viewer {
            id: Uuid::new_v4(),
            college_name: college.to_string(),
            is_banned: false,
        }
    }

    fn resource(owner: Uuid, college: &str, privacy: PrivacyLevel) -> ResourceVisibility {
        ResourceVisibility {
            id: Uuid::new_v4(),
            uploaded_by: owner,
            uploader_college: college.to_string(),
            privacy_level: privacy,
            is_deleted: false,
        }
    }

    #[test]
    fn public_resource_is_visible_to_anyone() {
        let v = viewer("Stanford");
        let r = resource(Uuid::new_v4(), "MIT", PrivacyLevel::Public);
        assert!(can_view(&v, &r));
    }

    #[test]
    fn private_resource_is_visible_to_same_college() {
        let v = viewer("MIT");
        let r = resource(Uuid::new_v4(), "MIT", PrivacyLevel::Private);
        assert!(can_view(&v, &r));
    }

    #[test]
    fn private_resource_is_hidden_from_other_college() {
        let v = viewer("Stanford");
        let r = resource(Uuid::new_v4(), "MIT", PrivacyLevel::Private);
        assert!(!can_view(&v, &r));
    }

    #[test]
    fn college_match_is_case_sensitive() {
        let v = viewer("mit");
        let r = resource(Uuid::new_v4(), "MIT", PrivacyLevel::Private);
        assert!(!can_view(&v, &r));
    }

    #[test]
    fn owner_always_sees_their_private_resource() {
        let v = viewer("Stanford");
        let r = resource(v.id, "MIT", PrivacyLevel::Private);
        assert!(can_view(&v, &r));
    }

    #[test]
    fn banned_viewer_is_rejected_before_any_engine_call() {
        let mut v = viewer("MIT");
        v.is_banned = true;
        let err = v.ensure_active().unwrap_err();
        assert_eq!(err.error_type, crate::core::AppErrorType::AuthError);
    }

    #[test]
    fn active_viewer_passes_through() {
        let v = viewer("MIT");
        claim::assert_ok!(v.ensure_active());
    }

    #[test]
    fn banned_viewer_sees_nothing() {
        let mut v = viewer("MIT");
        v.is_banned = true;
        let r = resource(Uuid::new_v4(), "MIT", PrivacyLevel::Public);
        assert!(!can_view(&v, &r));
    }

    #[test]
    fn deleted_resource_is_invisible_even_to_owner() {
        let v = viewer("MIT");
        let mut r = resource(v.id, "MIT", PrivacyLevel::Public);
        r.is_deleted = true;
        assert!(!can_view(&v, &r));
    }
}
