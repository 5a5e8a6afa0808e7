
pub mod profiles;
pub mod resources;
pub mod reviews;
pub mod comments;
pub mod follows;
pub mod downloads;
pub mod points;
pub mod pagination;
