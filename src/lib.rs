pub mod core;
pub mod db;
pub mod models;
pub mod routes;
pub mod study_vault_web_server;
