pub mod auth;
pub mod follows;
pub mod ops;
pub mod posts;
