use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "point_action", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PointAction {
    Upload,
    Download,
    Rating,
    Comment,
    CreditDeduction,
}

/// Immutable ledger row. Never updated or deleted; `profiles.total_points`
/// is always re-derivable as the sum of a user's rows.
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct PointLogEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub action: PointAction,
    pub points: i32,
    pub resource_id: Option<Uuid>,
    pub triggered_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Manual adjustment payload for the admin award endpoint.
#[derive(Debug, Deserialize)]
pub struct AwardPointsRequest {
    pub user_id: Uuid,
    pub action: PointAction,
    pub points: i32,
    pub resource_id: Option<Uuid>,
}
