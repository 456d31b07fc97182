//! Prometheus counters for the mutations and the page cache.

use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::registry::Registry;

pub struct Metrics {
    registry: Registry,
    pub posts_created: Counter,
    pub posts_edited: Counter,
    pub comments_created: Counter,
    pub follows_created: Counter,
    pub follows_removed: Counter,
    pub page_cache_hits: Counter,
    pub page_cache_misses: Counter,
}

impl Metrics {
    pub fn new() -> Self {
        let mut registry = Registry::with_prefix("yatube");
        let counter = |registry: &mut Registry, name: &str, help: &str| {
            let counter = Counter::default();
            registry.register(name, help, counter.clone());
            counter
        };

        Self {
            posts_created: counter(&mut registry, "posts_created", "Posts created"),
            posts_edited: counter(&mut registry, "posts_edited", "Posts edited by their author"),
            comments_created: counter(&mut registry, "comments_created", "Comments added"),
            follows_created: counter(&mut registry, "follows_created", "Follow relations created"),
            follows_removed: counter(&mut registry, "follows_removed", "Follow relations removed"),
            page_cache_hits: counter(&mut registry, "page_cache_hits", "Index pages served from cache"),
            page_cache_misses: counter(&mut registry, "page_cache_misses", "Index pages rendered fresh"),
            registry,
        }
    }

    /// OpenMetrics text exposition of every counter.
    pub fn render(&self) -> Result<String, std::fmt::Error> {
        let mut body = String::new();
        encode(&mut body, &self.registry)?;
        Ok(body)
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
