use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub resource_id: Uuid,
    pub user_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub content: String,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct AddCommentRequest {
    pub parent_id: Option<Uuid>,
    pub content: String,
}

/// One node of the rendered reply forest. `replies` is ordered by
/// `created_at` ascending, as is each root level.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct CommentNode {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub parent_id: Option<Uuid>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub replies: Vec<CommentNode>,
}
