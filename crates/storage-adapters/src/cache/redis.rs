//! Redis-backed page cache, shared between processes. Expiry is left to
//! Redis (`SET ... PX`); `clear` sweeps the key prefix with `SCAN`.

use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::{redis, Config, Pool, Runtime};
use domains::{DomainError, PageCache, Result};
use tracing::{debug, error};

pub struct RedisPageCache {
    pool: Pool,
    prefix: String,
}

impl RedisPageCache {
    pub fn connect(url: &str, prefix: impl Into<String>) -> Result<Self> {
        let pool = Config::from_url(url)
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|err| {
                error!(error = %err, "cannot build redis pool");
                DomainError::internal(err)
            })?;

        Ok(Self {
            pool,
            prefix: prefix.into(),
        })
    }

    fn key(&self, key: &str) -> String {
        format!("{}{key}", self.prefix)
    }

    async fn connection(&self) -> Result<deadpool_redis::Connection> {
        self.pool.get().await.map_err(|err| {
            error!(error = %err, "redis pool exhausted or unreachable");
            DomainError::internal(err)
        })
    }
}

/// `PX` rejects 0, so a zero TTL becomes the shortest one Redis accepts.
fn ttl_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

fn redis_error(err: redis::RedisError) -> DomainError {
    error!(error = %err, "redis command failed");
    DomainError::internal(err)
}

#[async_trait]
impl PageCache for RedisPageCache {
    async fn get_page(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection().await?;
        let body: Option<String> = redis::cmd("GET")
            .arg(self.key(key))
            .query_async(&mut conn)
            .await
            .map_err(redis_error)?;
        Ok(body)
    }

    async fn put_page(&self, key: &str, body: String, ttl: Duration) -> Result<()> {
        let mut conn = self.connection().await?;
        let _: () = redis::cmd("SET")
            .arg(self.key(key))
            .arg(body)
            .arg("PX")
            .arg(ttl_millis(ttl))
            .query_async(&mut conn)
            .await
            .map_err(redis_error)?;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let mut conn = self.connection().await?;
        let pattern = format!("{}*", self.prefix);
        let mut cursor: u64 = 0;
        let mut deleted = 0usize;

        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await
                .map_err(redis_error)?;

            if !keys.is_empty() {
                let _: () = redis::cmd("DEL")
                    .arg(&keys)
                    .query_async(&mut conn)
                    .await
                    .map_err(redis_error)?;
                deleted += keys.len();
            }

            cursor = next;
            if cursor == 0 {
                break;
            }
        }

        debug!(pattern = %pattern, deleted, "page cache cleared");
        Ok(())
    }
}
