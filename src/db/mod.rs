pub mod access;
pub mod comments;
pub mod downloads;
pub mod follows;
pub mod points;
pub mod profiles;
pub mod resources;
pub mod reviews;
