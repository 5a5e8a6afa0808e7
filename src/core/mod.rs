pub mod config;
mod responses;
pub mod jwt_auth;
mod telementry;
pub mod redis_helper;
pub mod storage;

pub use self::config::AppConfig;
pub use responses::*;
pub use telementry::*;
pub use redis_helper::*;
pub use storage::{BlobStore, StoredFile};
