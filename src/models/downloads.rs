use serde::Serialize;

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct DownloadStats {
    pub total_downloads: i64,
    pub unique_users: i64,
}
