use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use domains::{
    CommentRepository, FollowRepository, GroupRepository, MediaStorage, PageCache, Paginator,
    PasswordHasher, PostRepository, SessionTokens, UserRepository,
};
use services::{AccountService, FeedService, FollowService, PostService};

use crate::metrics::Metrics;

/// Web-layer knobs that do not belong to any service.
#[derive(Debug, Clone)]
pub struct WebConfig {
    pub index_cache_ttl: Duration,
    pub secure_cookie: bool,
    pub max_upload_bytes: usize,
    pub media_root: PathBuf,
    /// Where `media_root` is mounted, e.g. "/media"
    pub media_url_prefix: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            index_cache_ttl: Duration::from_secs(20),
            secure_cookie: false,
            max_upload_bytes: 5 * 1024 * 1024,
            media_root: PathBuf::from("media"),
            media_url_prefix: "/media".to_string(),
        }
    }
}

/// Every port the web layer needs, as trait objects.
pub struct Backends {
    pub users: Arc<dyn UserRepository>,
    pub groups: Arc<dyn GroupRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub follows: Arc<dyn FollowRepository>,
    pub media: Arc<dyn MediaStorage>,
    pub cache: Arc<dyn PageCache>,
    pub hasher: Arc<dyn PasswordHasher>,
    pub tokens: Arc<dyn SessionTokens>,
}

/// State shared across all handlers. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub feeds: Arc<FeedService>,
    pub posts: Arc<PostService>,
    pub follows: Arc<FollowService>,
    pub accounts: Arc<AccountService>,
    pub cache: Arc<dyn PageCache>,
    pub media: Arc<dyn MediaStorage>,
    pub metrics: Arc<Metrics>,
    pub web: Arc<WebConfig>,
}

impl AppState {
    pub fn new(backends: Backends, paginator: Paginator, web: WebConfig) -> Self {
        let Backends {
            users,
            groups,
            posts,
            comments,
            follows,
            media,
            cache,
            hasher,
            tokens,
        } = backends;

        Self {
            feeds: Arc::new(FeedService::new(
                users.clone(),
                groups.clone(),
                posts.clone(),
                follows.clone(),
                paginator,
            )),
            posts: Arc::new(PostService::new(posts, groups, comments, media.clone())),
            follows: Arc::new(FollowService::new(users.clone(), follows)),
            accounts: Arc::new(AccountService::new(users, hasher, tokens)),
            cache,
            media,
            metrics: Arc::new(Metrics::new()),
            web: Arc::new(web),
        }
    }
}
