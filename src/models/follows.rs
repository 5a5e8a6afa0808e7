use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct FollowStatus {
    pub is_following: bool,
    pub followers_count: i32,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct FollowedProfile {
    pub following_id: Uuid,
    pub following_name: String,
    pub followed_at: DateTime<Utc>,
}
