//! In-process page cache. Each entry carries its own deadline; expired
//! entries are dropped on read and swept out on every write.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use domains::{PageCache, Result};

struct Entry {
    body: String,
    expires_at: Instant,
}

#[derive(Default)]
pub struct MemoryPageCache {
    entries: DashMap<String, Entry>,
}

impl MemoryPageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl PageCache for MemoryPageCache {
    async fn get_page(&self, key: &str) -> Result<Option<String>> {
        let now = Instant::now();
        let hit = self
            .entries
            .get(key)
            .map(|entry| (entry.expires_at > now).then(|| entry.body.clone()));

        match hit {
            Some(Some(body)) => Ok(Some(body)),
            Some(None) => {
                // Guard from `get` is gone by now; removing under it would deadlock.
                self.entries.remove_if(key, |_, entry| entry.expires_at <= now);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn put_page(&self, key: &str, body: String, ttl: Duration) -> Result<()> {
        let now = Instant::now();
        // Keys carry the query string, so entries nobody reads again pile up.
        self.entries.retain(|_, entry| entry.expires_at > now);
        self.entries.insert(
            key.to_string(),
            Entry {
                body,
                expires_at: now + ttl,
            },
        );
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.entries.clear();
        Ok(())
    }
}
