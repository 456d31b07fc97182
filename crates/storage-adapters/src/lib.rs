//! # storage-adapters
//!
//! Concrete implementations of the `domains` storage ports.
//! Each backend sits behind a Cargo feature so the binary only links what it runs.

pub mod cache;
#[cfg(feature = "media-local")]
pub mod media;
#[cfg(feature = "db-sqlite")]
pub mod sqlite;

pub use cache::MemoryPageCache;
#[cfg(feature = "redis")]
pub use cache::RedisPageCache;
#[cfg(feature = "media-local")]
pub use media::LocalMediaStorage;
#[cfg(feature = "db-sqlite")]
pub use sqlite::SqliteStore;
