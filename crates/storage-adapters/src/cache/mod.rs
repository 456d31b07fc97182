mod memory;
#[cfg(feature = "redis")]
mod redis;

pub use memory::MemoryPageCache;
#[cfg(feature = "redis")]
pub use redis::RedisPageCache;
