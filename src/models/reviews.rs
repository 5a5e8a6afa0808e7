use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct Review {
    pub id: Uuid,
    pub resource_id: Uuid,
    pub user_id: Uuid,
    pub rating: i32,
    pub review_text: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitReviewRequest {
    #[validate(range(min = 1, max = 5, message = "rating must be between 1 and 5"))]
    pub rating: i32,
    #[validate(length(max = 2000))]
    pub review_text: Option<String>,
}

#[derive(Debug, Serialize, Clone, sqlx::FromRow)]
pub struct ReviewWithAuthor {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub review: Review,
    pub user_name: String,
}

/// Renders a stored full-precision mean the way clients display it.
pub fn render_average_rating(average: f64) -> String {
    format!("{:.1}", average)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_is_rendered_to_one_decimal() {
        assert_eq!(render_average_rating(0.0), "0.0");
        assert_eq!(render_average_rating(4.0 / 3.0), "1.3");
        assert_eq!(render_average_rating(4.25), "4.2");
        assert_eq!(render_average_rating(5.0), "5.0");
    }
}
