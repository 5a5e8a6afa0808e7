use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "resource_type")]
pub enum ResourceType {
    Notes,
    #[sqlx(rename = "Question Papers")]
    #[serde(rename = "Question Papers")]
    QuestionPapers,
    Solutions,
    #[sqlx(rename = "Project Reports")]
    #[serde(rename = "Project Reports")]
    ProjectReports,
    #[sqlx(rename = "Study Material")]
    #[serde(rename = "Study Material")]
    StudyMaterial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "privacy_level")]
pub enum PrivacyLevel {
    Public,
    Private,
}

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct Resource {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub subject_name: String,
    pub semester: String,
    pub branch_or_department: String,
    pub academic_year_or_batch: Option<String>,
    pub resource_type: ResourceType,
    pub privacy_level: PrivacyLevel,
    pub tags: Option<Vec<String>>,
    pub file_path: String,
    pub file_name: String,
    pub file_size: i64,
    pub mime_type: String,
    pub uploaded_by: Uuid,
    pub uploader_college: String,
    pub average_rating: f64,
    pub total_ratings: i32,
    pub total_comments: i32,
    pub download_count: i32,
    pub total_points_earned: i32,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Resource plus the uploader's display name, for listings and detail
/// pages.
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct ResourceWithUploader {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub resource: Resource,
    pub uploader_name: String,
}

/// Metadata fields of the multipart upload form.
#[derive(Debug, Clone, Default)]
pub struct CreateResourceMeta {
    pub title: String,
    pub description: Option<String>,
    pub subject_name: String,
    pub semester: String,
    pub branch_or_department: String,
    pub academic_year_or_batch: Option<String>,
    pub resource_type: Option<ResourceType>,
    pub privacy_level: PrivacyLevel,
    pub tags: Vec<String>,
}

impl Default for PrivacyLevel {
    fn default() -> Self {
        PrivacyLevel::Public
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceSort {
    Newest,
    TopRated,
    MostDownloaded,
}

impl Default for ResourceSort {
    fn default() -> Self {
        ResourceSort::Newest
    }
}

impl ResourceSort {
    pub fn order_by_column(&self) -> &'static str {
        match self {
            ResourceSort::Newest => "r.created_at",
            ResourceSort::TopRated => "r.average_rating",
            ResourceSort::MostDownloaded => "r.download_count",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ResourceFilters {
    pub subject: Option<String>,
    pub semester: Option<String>,
    pub resource_type: Option<ResourceType>,
    pub search: Option<String>,
    #[serde(default)]
    pub sort_by: ResourceSort,
}

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub limit: Option<i64>,
}
