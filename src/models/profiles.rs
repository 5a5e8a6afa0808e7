use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub college_name: String,
    pub branch_or_department: String,
    pub current_semester_or_year: String,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
    pub followers_count: i32,
    pub following_count: i32,
    pub total_points: i32,
    pub total_credits: i32,
    pub is_banned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Upserts the profile row for the authenticated subject. The identity
/// provider owns id and email; everything else is user-editable.
#[derive(Debug, Deserialize, Validate)]
pub struct SyncProfileRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(length(max = 200))]
    pub college_name: String,
    #[validate(length(max = 120))]
    pub branch_or_department: String,
    #[validate(length(max = 60))]
    pub current_semester_or_year: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    #[validate(length(max = 120))]
    pub branch_or_department: Option<String>,
    #[validate(length(max = 60))]
    pub current_semester_or_year: Option<String>,
    #[validate(length(max = 1000))]
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
}
